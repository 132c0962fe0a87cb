//! Side partition of the cells around one fracture node.
//!
//! The cells touching a node are grouped into *sectors*: two cells are in the
//! same sector when they share an untagged face through the node. Every tagged
//! face through the node links the sectors of its two cells. Sectors are then
//! coloured so that the two sides of every tagged face get different colours;
//! each colour becomes one copy of the node.
//!
//! Colouring is greedy in breadth-first order, starting from the sector holding
//! the lowest cell index and visiting neighbours in ascending sector order. A
//! sector takes the smallest colour not used by an already coloured neighbour.
//! This yields one colour at a tip, two along a trace and at a two-trace
//! crossing, and three at a T-junction.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::mesh_error::MeshFractureError;
use crate::topology::grid::Grid;

/// Sectors and colours around one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSectors {
    node: usize,
    sector_of_cell: BTreeMap<usize, usize>,
    sector_color: Vec<usize>,
    num_colors: usize,
}

impl NodeSectors {
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn num_sectors(&self) -> usize {
        self.sector_color.len()
    }

    /// Number of node copies needed (the original included).
    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    /// Extra node indices this node needs.
    pub fn num_duplicates(&self) -> usize {
        self.num_colors.saturating_sub(1)
    }

    pub fn sector_of_cell(&self, cell: usize) -> Option<usize> {
        self.sector_of_cell.get(&cell).copied()
    }

    /// Colour of the side `cell` lies on.
    pub fn color_of_cell(&self, cell: usize) -> Option<usize> {
        self.sector_of_cell(cell)
            .and_then(|s| self.sector_color.get(s).copied())
    }
}

/// Partition the cells around `node` of `grid`, where `tagged[f]` marks fracture faces.
pub fn partition_node(
    grid: &Grid,
    node: usize,
    tagged: &[bool],
) -> Result<NodeSectors, MeshFractureError> {
    let faces = grid.node_faces().get(node).ok_or_else(|| {
        MeshFractureError::InconsistentTopology(format!(
            "node {node} out of range ({} nodes)",
            grid.num_nodes()
        ))
    })?;

    let mut cells: Vec<usize> = faces
        .iter()
        .flat_map(|&f| grid.cells_of_face(f).iter().map(|&(c, _)| c))
        .collect();
    cells.sort_unstable();
    cells.dedup();
    let local: BTreeMap<usize, usize> = cells.iter().enumerate().map(|(i, &c)| (c, i)).collect();

    let mut parent: Vec<usize> = (0..cells.len()).collect();
    let mut links: Vec<(usize, usize)> = Vec::new();
    for &f in faces {
        let [(a, _), (b, _)] = grid.cells_of_face(f) else {
            continue;
        };
        let (a, b) = (local[a], local[b]);
        if tagged.get(f).copied().unwrap_or(false) {
            links.push((a, b));
        } else {
            union(&mut parent, a, b);
        }
    }

    // Sector ids follow the lowest cell index they contain.
    let mut sector_of_root: BTreeMap<usize, usize> = BTreeMap::new();
    let mut sector_of_cell = BTreeMap::new();
    for (i, &cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        let next = sector_of_root.len();
        let sector = *sector_of_root.entry(root).or_insert(next);
        sector_of_cell.insert(cell, sector);
    }
    let num_sectors = sector_of_root.len();

    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); num_sectors];
    for (a, b) in links {
        let sa = sector_of_cell[&cells[a]];
        let sb = sector_of_cell[&cells[b]];
        if sa != sb {
            adjacency[sa].insert(sb);
            adjacency[sb].insert(sa);
        }
    }

    let sector_color = greedy_coloring(&adjacency);
    let num_colors = sector_color.iter().max().map_or(0, |&c| c + 1);
    log::trace!(
        "node {node}: {} cells, {num_sectors} sectors, {num_colors} colours",
        cells.len()
    );

    Ok(NodeSectors {
        node,
        sector_of_cell,
        sector_color,
        num_colors,
    })
}

fn greedy_coloring(adjacency: &[BTreeSet<usize>]) -> Vec<usize> {
    let mut color: Vec<Option<usize>> = vec![None; adjacency.len()];
    for root in 0..adjacency.len() {
        if color[root].is_some() {
            continue;
        }
        let mut queue = VecDeque::from([root]);
        let mut queued: BTreeSet<usize> = BTreeSet::from([root]);
        while let Some(s) = queue.pop_front() {
            let used: BTreeSet<usize> = adjacency[s].iter().filter_map(|&t| color[t]).collect();
            color[s] = (0..).find(|c| !used.contains(c));
            for &t in &adjacency[s] {
                if color[t].is_none() && queued.insert(t) {
                    queue.push_back(t);
                }
            }
        }
    }
    color.into_iter().map(|c| c.unwrap_or(0)).collect()
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        let (lo, hi) = (ra.min(rb), ra.max(rb));
        parent[hi] = lo;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_generation::cart_grid;

    fn x_face(nx: usize, i: usize, j: usize) -> usize {
        j * (nx + 1) + i
    }

    fn y_face(nx: usize, ny: usize, i: usize, j: usize) -> usize {
        (nx + 1) * ny + j * nx + i
    }

    #[test]
    fn untagged_node_is_one_sector() {
        let g = cart_grid(4, 4).unwrap();
        let s = partition_node(&g, 2 * 5 + 2, &vec![false; g.num_faces()]).unwrap();
        assert_eq!(s.num_sectors(), 1);
        assert_eq!(s.num_colors(), 1);
        assert_eq!(s.num_duplicates(), 0);
    }

    #[test]
    fn straight_trace_node_has_two_sides() {
        let g = cart_grid(4, 4).unwrap();
        let mut tagged = vec![false; g.num_faces()];
        tagged[y_face(4, 4, 1, 2)] = true;
        tagged[y_face(4, 4, 2, 2)] = true;
        let s = partition_node(&g, 2 * 5 + 2, &tagged).unwrap();
        assert_eq!(s.num_sectors(), 2);
        assert_eq!(s.num_colors(), 2);
        // cells below the trace keep the original node
        assert_eq!(s.color_of_cell(4 + 1), Some(0));
        assert_eq!(s.color_of_cell(2 * 4 + 1), Some(1));
    }

    #[test]
    fn tip_node_is_not_split() {
        let g = cart_grid(4, 4).unwrap();
        let mut tagged = vec![false; g.num_faces()];
        tagged[y_face(4, 4, 1, 2)] = true;
        let s = partition_node(&g, 2 * 5 + 2, &tagged).unwrap();
        assert_eq!(s.num_colors(), 1);
    }

    #[test]
    fn crossing_needs_two_colours() {
        let g = cart_grid(4, 4).unwrap();
        let mut tagged = vec![false; g.num_faces()];
        tagged[y_face(4, 4, 1, 2)] = true;
        tagged[y_face(4, 4, 2, 2)] = true;
        tagged[x_face(4, 2, 1)] = true;
        tagged[x_face(4, 2, 2)] = true;
        let s = partition_node(&g, 2 * 5 + 2, &tagged).unwrap();
        assert_eq!(s.num_sectors(), 4);
        assert_eq!(s.num_colors(), 2);
        // diagonal cells share a colour
        assert_eq!(s.color_of_cell(4 + 1), s.color_of_cell(2 * 4 + 2));
        assert_ne!(s.color_of_cell(4 + 1), s.color_of_cell(4 + 2));
    }

    #[test]
    fn t_junction_needs_three_colours() {
        let g = cart_grid(4, 4).unwrap();
        let mut tagged = vec![false; g.num_faces()];
        tagged[y_face(4, 4, 1, 2)] = true;
        tagged[y_face(4, 4, 2, 2)] = true;
        tagged[x_face(4, 2, 2)] = true;
        let s = partition_node(&g, 2 * 5 + 2, &tagged).unwrap();
        assert_eq!(s.num_sectors(), 3);
        assert_eq!(s.num_colors(), 3);
    }

    #[test]
    fn boundary_node_splits_in_two() {
        let g = cart_grid(4, 4).unwrap();
        let mut tagged = vec![false; g.num_faces()];
        tagged[y_face(4, 4, 0, 2)] = true;
        let s = partition_node(&g, 2 * 5, &tagged).unwrap();
        assert_eq!(s.num_sectors(), 2);
        assert_eq!(s.num_colors(), 2);
    }
}
