//! Grid splitting: realize fracture traces as internal boundaries.
//!
//! For every tagged face `f` a new face `f'` is appended. `f` keeps the cell
//! that sees it with a negative sign (ties go to the lower cell index) and `f'`
//! takes the other cell with its sign unchanged. Every non-tip fracture node is
//! then partitioned into sides (see [`crate::algs::sectors`]); side 0 keeps the
//! original node index, further sides get fresh indices, and all faces through
//! the node are rewired to the copy of the side their cell lies on.
//!
//! The input grid is never modified. The result is assembled in a new grid and
//! checked against the post-conditions below before it is returned:
//!
//! - `num_faces' = num_faces + |tag|`, `num_cells' = num_cells`;
//! - `num_nodes' = num_nodes + duplicates`, tips never duplicated;
//! - no face without a cell;
//! - `|boundary faces'| = |boundary faces| + 2 |tag|`.
//!
//! New face and node indices are handed out by a single counter in ascending
//! order of the tagged face / fracture node they derive from. With the `rayon`
//! feature the per-node side partition runs in parallel; index allocation and
//! rewiring stay serial.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algs::fracture::{Fracture, NodeRole, NodeRoles};
use crate::algs::sectors::{NodeSectors, partition_node};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshFractureError;
use crate::topology::grid::Grid;
use crate::topology::validation::{ValidationOptions, validate_grid};

/// What to do when a post-condition check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    /// Do not check.
    Skip,
    /// Log a warning and return the grid anyway.
    Warn,
    /// Fail with [`MeshFractureError::InconsistentTopology`].
    #[default]
    Error,
}

/// Configuration for [`split_grid_with`].
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    pub verify: Verification,
    /// Run [`validate_grid`] on the input before splitting.
    pub validate_input: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            verify: Verification::Error,
            validate_input: true,
        }
    }
}

/// Provenance of a split grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMaps {
    /// Original face of every face in the split grid.
    pub face_parent: Vec<usize>,
    /// Original node of every node in the split grid.
    pub node_parent: Vec<usize>,
    /// `(f, f')` for every tagged face, ascending in `f`.
    pub face_pairs: Vec<(usize, usize)>,
    /// New copies of every duplicated node, ascending.
    pub node_copies: BTreeMap<usize, Vec<usize>>,
}

impl SplitMaps {
    /// Maps of a split that changed nothing.
    pub fn identity(grid: &Grid) -> Self {
        Self {
            face_parent: (0..grid.num_faces()).collect(),
            node_parent: (0..grid.num_nodes()).collect(),
            face_pairs: Vec::new(),
            node_copies: BTreeMap::new(),
        }
    }

    pub fn num_new_faces(&self) -> usize {
        self.face_pairs.len()
    }

    /// Number of node indices added by the split.
    pub fn num_new_nodes(&self) -> usize {
        self.node_copies.values().map(Vec::len).sum()
    }

    /// The copy of `f` created by the split, if `f` was tagged.
    pub fn twin_of(&self, face: usize) -> Option<usize> {
        self.face_pairs
            .binary_search_by_key(&face, |&(f, _)| f)
            .ok()
            .map(|i| self.face_pairs[i].1)
    }
}

/// Split `grid` along the faces marked in `tag`.
///
/// The mask may describe several traces, including crossing ones; it is cut
/// into chains with [`Fracture::from_mask`]. An all-false mask returns an
/// unchanged copy.
pub fn split_fracture(grid: &Grid, tag: &[bool]) -> Result<Grid, MeshFractureError> {
    if tag.len() == grid.num_faces() && !tag.iter().any(|&t| t) {
        log::debug!("split_fracture: empty tag, returning grid unchanged");
        return Ok(grid.copy());
    }
    // validated here so the descriptor is only built over a sound grid
    validate_grid(grid, ValidationOptions::default())?;
    let fracture = Fracture::from_mask(grid, tag)?;
    let options = SplitOptions {
        validate_input: false,
        ..SplitOptions::default()
    };
    split_grid_with(grid, &fracture, options).map(|(g, _)| g)
}

/// Split `grid` along every trace of `fracture`, returning a new grid.
pub fn split_grid(grid: &Grid, fracture: &Fracture<'_>) -> Result<Grid, MeshFractureError> {
    split_grid_with(grid, fracture, SplitOptions::default()).map(|(g, _)| g)
}

/// Split `grid` in place along the faces marked in `tag`.
///
/// All-or-nothing: on error `grid` is left untouched.
pub fn split_fracture_in_place(
    grid: &mut Grid,
    tag: &[bool],
    options: SplitOptions,
) -> Result<SplitMaps, MeshFractureError> {
    if options.validate_input {
        validate_grid(grid, ValidationOptions::default())?;
    }
    let (split, maps) = {
        let fracture = Fracture::from_mask(grid, tag)?;
        split_grid_with(
            grid,
            &fracture,
            SplitOptions {
                validate_input: false,
                ..options
            },
        )?
    };
    *grid = split;
    Ok(maps)
}

/// Split `grid` along `fracture` and report where every face and node came from.
pub fn split_grid_with(
    grid: &Grid,
    fracture: &Fracture<'_>,
    options: SplitOptions,
) -> Result<(Grid, SplitMaps), MeshFractureError> {
    check_descriptor(grid, fracture)?;

    if fracture.is_empty() {
        log::debug!("split_grid: fracture has no traces, returning grid unchanged");
        return Ok((grid.copy(), SplitMaps::identity(grid)));
    }
    if options.validate_input {
        validate_grid(grid, ValidationOptions::default())?;
    }

    let roles: Cow<'_, NodeRoles> = match fracture.roles() {
        Some(r) => Cow::Borrowed(r),
        None => Cow::Owned(fracture.classify_nodes()),
    };
    let tag = fracture.tag();
    let tagged_faces = fracture.tagged_faces();

    let (mut nodes, mut face_nodes, mut cell_faces) = grid.copy().into_parts();
    let mut maps = SplitMaps::identity(grid);

    // Faces: f keeps its negative-side cell, f' takes the other one.
    for &f in &tagged_faces {
        let [first, second] = grid.cells_of_face(f) else {
            return Err(MeshFractureError::InconsistentTopology(format!(
                "tagged face {f} has {} cells, expected 2",
                grid.cells_of_face(f).len()
            )));
        };
        let (keep, moved) = if (first.1, first.0) <= (second.1, second.0) {
            (*first, *second)
        } else {
            (*second, *first)
        };
        cell_faces.set_face(f, vec![keep]);
        let twin = cell_faces.push_face(vec![moved]);
        let twin_nodes = face_nodes.push_face(grid.nodes_of_face(f).to_vec());
        debug_assert_eq!(twin, twin_nodes);
        maps.face_parent.push(f);
        maps.face_pairs.push((f, twin));
    }

    // Nodes: side partition of every non-tip fracture node.
    let candidates: Vec<usize> = roles
        .fracture_nodes()
        .filter(|&n| roles.role(n) != Some(NodeRole::Tip))
        .collect();
    let partitions = partition_nodes(grid, &candidates, &tag)?;

    let twin_of: BTreeMap<usize, usize> = maps.face_pairs.iter().copied().collect();
    for sectors in &partitions {
        let node = sectors.node();
        if sectors.num_duplicates() == 0 {
            log::trace!("fracture node {node} has a single side, kept as is");
            continue;
        }
        let coord = grid.node(node).ok_or_else(|| {
            MeshFractureError::InconsistentTopology(format!("fracture node {node} has no coordinates"))
        })?;
        let mut copies = Vec::with_capacity(sectors.num_duplicates());
        for _ in 0..sectors.num_duplicates() {
            copies.push(face_nodes.push_node());
            nodes.push(coord);
            maps.node_parent.push(node);
        }

        let faces_here = grid
            .node_faces()
            .get(node)
            .into_iter()
            .flatten()
            .flat_map(|f| std::iter::once(*f).chain(twin_of.get(f).copied()));
        for face in faces_here {
            let Some(&(cell, _)) = cell_faces.cells_of(face).first() else {
                continue;
            };
            let color = sectors.color_of_cell(cell).ok_or_else(|| {
                MeshFractureError::InconsistentTopology(format!(
                    "cell {cell} of face {face} is not around node {node}"
                ))
            })?;
            if color > 0 {
                face_nodes.replace_node(face, node, copies[color - 1]);
            }
        }
        maps.node_copies.insert(node, copies);
    }

    let split = Grid::from_parts(nodes, face_nodes, cell_faces)?;
    log::debug!(
        "split_grid: {} traces, {} faces tagged, {} nodes duplicated ({} -> {} nodes)",
        fracture.num_traces(),
        tagged_faces.len(),
        maps.num_new_nodes(),
        grid.num_nodes(),
        split.num_nodes()
    );

    match options.verify {
        Verification::Skip => {}
        Verification::Warn => {
            if let Err(e) = verify_split(grid, &split, &maps, &roles) {
                log::warn!("split post-condition failed: {e}");
            }
        }
        Verification::Error => {
            verify_split(grid, &split, &maps, &roles)?;
            split.debug_assert_invariants();
        }
    }

    Ok((split, maps))
}

#[cfg(not(feature = "rayon"))]
fn partition_nodes(
    grid: &Grid,
    nodes: &[usize],
    tag: &[bool],
) -> Result<Vec<NodeSectors>, MeshFractureError> {
    nodes
        .iter()
        .map(|&n| partition_node(grid, n, tag))
        .collect()
}

#[cfg(feature = "rayon")]
fn partition_nodes(
    grid: &Grid,
    nodes: &[usize],
    tag: &[bool],
) -> Result<Vec<NodeSectors>, MeshFractureError> {
    use rayon::prelude::*;
    // build the node->face cache once before fanning out
    let _ = grid.node_faces();
    nodes
        .par_iter()
        .map(|&n| partition_node(grid, n, tag))
        .collect()
}

/// The descriptor must describe the grid being split.
fn check_descriptor(grid: &Grid, fracture: &Fracture<'_>) -> Result<(), MeshFractureError> {
    let source = fracture.grid();
    if std::ptr::eq(source, grid) {
        return Ok(());
    }
    if source.num_faces() != grid.num_faces() || source.num_nodes() != grid.num_nodes() {
        return Err(MeshFractureError::InconsistentTopology(format!(
            "fracture was built for a grid with {} faces / {} nodes, got {} / {}",
            source.num_faces(),
            source.num_nodes(),
            grid.num_faces(),
            grid.num_nodes()
        )));
    }
    for f in fracture.tagged_faces() {
        if source.nodes_of_face(f) != grid.nodes_of_face(f)
            || source.cells_of_face(f) != grid.cells_of_face(f)
        {
            return Err(MeshFractureError::InconsistentTopology(format!(
                "tagged face {f} differs between the fracture's grid and the split input"
            )));
        }
    }
    Ok(())
}

/// Check the combinatorial laws of a split.
pub fn verify_split(
    original: &Grid,
    split: &Grid,
    maps: &SplitMaps,
    roles: &NodeRoles,
) -> Result<(), MeshFractureError> {
    let fail = |msg: String| Err(MeshFractureError::InconsistentTopology(msg));
    let tagged = maps.face_pairs.len();

    if split.num_cells() != original.num_cells() {
        return fail(format!(
            "cell count changed: {} -> {}",
            original.num_cells(),
            split.num_cells()
        ));
    }
    if split.num_faces() != original.num_faces() + tagged {
        return fail(format!(
            "expected {} faces, found {}",
            original.num_faces() + tagged,
            split.num_faces()
        ));
    }
    if split.num_nodes() != original.num_nodes() + maps.num_new_nodes() {
        return fail(format!(
            "expected {} nodes, found {}",
            original.num_nodes() + maps.num_new_nodes(),
            split.num_nodes()
        ));
    }
    if split.cell_faces().shape() != (split.num_faces(), split.num_cells())
        || split.face_nodes().shape() != (split.num_nodes(), split.num_faces())
        || split.nodes().len() != split.num_nodes()
    {
        return fail("incidence shapes disagree with counts".into());
    }
    if maps.face_parent.len() != split.num_faces() || maps.node_parent.len() != split.num_nodes() {
        return fail("split maps disagree with counts".into());
    }
    if split.num_cells() > 0 {
        if let Some(&face) = split.hanging_faces().first() {
            return fail(format!("face {face} is hanging after split"));
        }
    }

    let before = original.boundary_faces().len();
    let after = split.boundary_faces().len();
    if after != before + 2 * tagged {
        return fail(format!(
            "boundary faces went {before} -> {after}, expected +{}",
            2 * tagged
        ));
    }

    for &(f, twin) in &maps.face_pairs {
        let (a, b) = (split.cells_of_face(f), split.cells_of_face(twin));
        if a.len() != 1 || b.len() != 1 || a[0].0 == b[0].0 {
            return fail(format!("face pair ({f}, {twin}) does not separate two cells"));
        }
        let (kept, moved) = (split.nodes_of_face(f), split.nodes_of_face(twin));
        let ends = original.nodes_of_face(f);
        if kept.len() != ends.len() || moved.len() != ends.len() {
            return fail(format!("face pair ({f}, {twin}) changed arity"));
        }
        for (k, &n) in ends.iter().enumerate() {
            let parents = [kept[k], moved[k]].map(|m| maps.node_parent.get(m).copied());
            if parents != [Some(n), Some(n)] {
                return fail(format!(
                    "face pair ({f}, {twin}) does not derive from node {n} at end {k}"
                ));
            }
            let shared = kept[k] == moved[k];
            match roles.role(n) {
                Some(NodeRole::Tip) if !(shared && kept[k] == n) => {
                    return fail(format!("tip node {n} was detached from face pair ({f}, {twin})"));
                }
                Some(NodeRole::Interior | NodeRole::Intersection) if shared => {
                    return fail(format!(
                        "face pair ({f}, {twin}) still shares fracture node {} at end {k}",
                        kept[k]
                    ));
                }
                _ => {}
            }
        }
    }

    for node in roles.tip_nodes() {
        if maps.node_copies.contains_key(node) {
            return fail(format!("tip node {node} was duplicated"));
        }
    }
    let copies_of = |n: &usize| maps.node_copies.get(n).map_or(0, Vec::len);
    for node in roles.interior_nodes() {
        if copies_of(node) != 1 {
            return fail(format!(
                "interior fracture node {node} has {} copies, expected 1",
                copies_of(node)
            ));
        }
    }
    for node in roles.intersection_nodes() {
        if copies_of(node) == 0 {
            return fail(format!("intersection node {node} was not duplicated"));
        }
    }
    if let Some(node) = maps
        .node_copies
        .keys()
        .find(|n| !matches!(roles.role(**n), Some(NodeRole::Interior | NodeRole::Intersection)))
    {
        return fail(format!("node {node} is not a fracture node but was duplicated"));
    }
    for (node, copies) in &maps.node_copies {
        if copies.iter().any(|&c| maps.node_parent.get(c) != Some(node)) {
            return fail(format!("copies of node {node} do not point back to it"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_generation::{cart_grid, polygon_grid};

    #[test]
    fn single_face_trace_adds_no_node() {
        let g = cart_grid(3, 3).unwrap();
        let mut tag = vec![false; g.num_faces()];
        let f = (4 * 3) + 3 + 1; // y-face (1, 1)
        tag[f] = true;
        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let (h, maps) = split_grid_with(&g, &fracture, SplitOptions::default()).unwrap();
        assert_eq!(h.num_faces(), g.num_faces() + 1);
        assert_eq!(h.num_nodes(), g.num_nodes());
        assert_eq!(maps.twin_of(f), Some(g.num_faces()));
        assert_eq!(h.nodes_of_face(f), h.nodes_of_face(g.num_faces()));
        // the cell above keeps the original face
        assert_eq!(h.cells_of_face(f)[0].0, 3 + 1);
        assert_eq!(h.cells_of_face(g.num_faces())[0].0, 1);
    }

    #[test]
    fn empty_descriptor_is_identity() {
        let g = cart_grid(4, 4).unwrap();
        let fracture = Fracture::new(&g);
        let (h, maps) = split_grid_with(&g, &fracture, SplitOptions::default()).unwrap();
        assert_eq!(h, g);
        assert_eq!(maps, SplitMaps::identity(&g));
    }

    #[test]
    fn triangle_strip_split() {
        // 2x1 squares cut into triangles; split the middle vertical edge chain.
        let nodes = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [2.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [0.0, 2.0],
            [1.0, 2.0],
            [2.0, 2.0],
        ];
        let cells = vec![
            vec![0, 1, 4],
            vec![0, 4, 3],
            vec![1, 2, 5],
            vec![1, 5, 4],
            vec![3, 4, 7],
            vec![3, 7, 6],
            vec![4, 5, 8],
            vec![4, 8, 7],
        ];
        let g = polygon_grid(nodes, &cells).unwrap();
        let edge = |a: usize, b: usize| {
            (0..g.num_faces())
                .find(|&f| {
                    let n = g.nodes_of_face(f);
                    (n[0] == a && n[1] == b) || (n[0] == b && n[1] == a)
                })
                .unwrap()
        };
        let mut tag = vec![false; g.num_faces()];
        tag[edge(1, 4)] = true;
        tag[edge(4, 7)] = true;
        let (h, maps) = split_grid_with(
            &g,
            &Fracture::from_mask(&g, &tag).unwrap(),
            SplitOptions::default(),
        )
        .unwrap();
        // both ends on the boundary, all three nodes duplicated
        assert_eq!(h.num_nodes(), g.num_nodes() + 3);
        assert_eq!(h.num_faces(), g.num_faces() + 2);
        assert_eq!(h.boundary_faces().len(), g.boundary_faces().len() + 4);
        assert_eq!(maps.node_copies.len(), 3);
        assert_eq!(h.nodes()[maps.node_copies[&4][0]], [1.0, 1.0]);
    }

    #[test]
    fn verification_catches_tampered_maps() {
        let g = cart_grid(6, 6).unwrap();
        let mut tag = vec![false; g.num_faces()];
        for i in 2..4 {
            tag[7 * 6 + 3 * 6 + i] = true;
        }
        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let (h, mut maps) = split_grid_with(&g, &fracture, SplitOptions::default()).unwrap();
        let roles = fracture.roles().unwrap();
        verify_split(&g, &h, &maps, roles).unwrap();
        maps.face_pairs.pop();
        assert!(matches!(
            verify_split(&g, &h, &maps, roles),
            Err(MeshFractureError::InconsistentTopology(_))
        ));
    }

    /// 10x10 grid with the four y-faces of row 5 between x = 3 and x = 7 tagged.
    fn straight_cut() -> (Grid, Vec<bool>) {
        let g = cart_grid(10, 10).unwrap();
        let mut tag = vec![false; g.num_faces()];
        for i in 3..7 {
            tag[11 * 10 + 5 * 10 + i] = true;
        }
        (g, tag)
    }

    #[test]
    fn verification_catches_undone_node_copy() {
        let (g, tag) = straight_cut();
        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let roles = fracture.roles().unwrap();
        let (h, maps) = split_grid_with(&g, &fracture, SplitOptions::default()).unwrap();
        assert_eq!(roles.interior_nodes().len(), 3);
        let center = 5 * 11 + 5;
        let copy = maps.node_copies[&center][0];

        // every face back on the original node, copy left dangling
        let mut rejoined = h.copy();
        for face in 0..rejoined.num_faces() {
            rejoined.face_nodes_mut().replace_node(face, copy, center);
        }
        assert!(matches!(
            verify_split(&g, &rejoined, &maps, roles),
            Err(MeshFractureError::InconsistentTopology(_))
        ));

        // the copy is also forgotten by the maps
        let mut forgotten = maps.clone();
        forgotten.node_copies.remove(&center);
        assert!(matches!(
            verify_split(&g, &h, &forgotten, roles),
            Err(MeshFractureError::InconsistentTopology(_))
        ));
    }

    /// Cartesian grid with an extra face that no cell references.
    fn grid_with_hanging_face() -> Grid {
        let mut g = cart_grid(4, 4).unwrap();
        g.face_nodes_mut().push_face(vec![0, 6]);
        g.cell_faces_mut().push_face(vec![]);
        g
    }

    fn middle_cut(g: &Grid) -> Vec<bool> {
        let mut tag = vec![false; g.num_faces()];
        for i in 1..3 {
            tag[5 * 4 + 2 * 4 + i] = true;
        }
        tag
    }

    #[test]
    fn verification_modes() {
        let g = grid_with_hanging_face();
        let tag = middle_cut(&g);
        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let unchecked = |verify| SplitOptions {
            verify,
            validate_input: false,
        };

        let err = split_grid_with(&g, &fracture, unchecked(Verification::Error)).unwrap_err();
        assert!(matches!(err, MeshFractureError::InconsistentTopology(_)));

        let (warned, maps) = split_grid_with(&g, &fracture, unchecked(Verification::Warn)).unwrap();
        assert_eq!(warned.num_faces(), g.num_faces() + 2);
        assert!(verify_split(&g, &warned, &maps, fracture.roles().unwrap()).is_err());

        let (skipped, _) = split_grid_with(&g, &fracture, unchecked(Verification::Skip)).unwrap();
        assert_eq!(skipped, warned);
    }

    #[test]
    fn input_validation_runs_before_splitting() {
        let g = grid_with_hanging_face();
        let tag = middle_cut(&g);
        assert_eq!(
            split_fracture(&g, &tag).unwrap_err(),
            MeshFractureError::HangingFace {
                face: g.num_faces() - 1
            }
        );
    }

    #[test]
    fn in_place_split_matches_split_maps() {
        let (original, tag) = straight_cut();
        let mut g = original.copy();
        let maps = split_fracture_in_place(&mut g, &tag, SplitOptions::default()).unwrap();

        assert_eq!(g, split_fracture(&original, &tag).unwrap());
        assert_eq!(maps.num_new_faces(), 4);
        assert_eq!(maps.num_new_nodes(), 3);
        assert_eq!(maps.face_parent.len(), g.num_faces());
        assert_eq!(maps.node_parent.len(), g.num_nodes());
        for &(f, twin) in &maps.face_pairs {
            assert_eq!(maps.face_parent[twin], f);
            assert_eq!(maps.twin_of(f), Some(twin));
        }
        let fracture = Fracture::from_mask(&original, &tag).unwrap();
        verify_split(&original, &g, &maps, fracture.roles().unwrap()).unwrap();
    }

    #[test]
    fn descriptor_for_other_grid_is_rejected() {
        let g = cart_grid(6, 6).unwrap();
        let other = cart_grid(5, 5).unwrap();
        let mut tag = vec![false; g.num_faces()];
        tag[7 * 6 + 3 * 6 + 2] = true;
        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let err = split_grid(&other, &fracture).unwrap_err();
        assert!(matches!(err, MeshFractureError::InconsistentTopology(_)));
    }

    #[test]
    fn in_place_split_leaves_grid_on_error() {
        let mut g = cart_grid(4, 4).unwrap();
        let before = g.copy();
        let mut tag = vec![false; g.num_faces()];
        tag[5 * 4] = true; // y-face (0, 0), on the boundary
        let err = split_fracture_in_place(&mut g, &tag, SplitOptions::default()).unwrap_err();
        assert!(err.is_malformed_trace());
        assert_eq!(g, before);
    }
}
