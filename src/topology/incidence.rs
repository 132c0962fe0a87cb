//! Sparse incidence relations between cells, faces and nodes.
//!
//! Both relations are stored column-wise, one small list per face, since every
//! operation in the crate (splitting, boundary detection, validation) walks
//! faces. Transposed views (cell → faces, node → faces) are built on demand.
//!
//! Shapes follow the `(rows, cols)` convention of the grid contract:
//! [`CellFaces::shape`] is `(num_faces, num_cells)` and
//! [`FaceNodes::shape`] is `(num_nodes, num_faces)`.

use serde::{Deserialize, Serialize};

/// Orientation of a face as seen from one incident cell.
///
/// `Positive` means the face normal points out of the cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sign {
    Negative,
    Positive,
}

impl Sign {
    /// The signed unit value, `-1` or `+1`.
    #[inline]
    pub const fn value(self) -> i8 {
        match self {
            Sign::Negative => -1,
            Sign::Positive => 1,
        }
    }

    /// Parses `-1`/`+1`; `0` and anything else mean "not incident" and yield `None`.
    #[inline]
    pub const fn from_value(v: i8) -> Option<Self> {
        match v {
            -1 => Some(Sign::Negative),
            1 => Some(Sign::Positive),
            _ => None,
        }
    }

    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Sign::Negative => Sign::Positive,
            Sign::Positive => Sign::Negative,
        }
    }
}

/// Signed cell–face incidence, stored per face.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFaces {
    num_cells: usize,
    faces: Vec<Vec<(usize, Sign)>>,
}

impl CellFaces {
    /// An empty relation over `num_cells` cells and no faces.
    pub fn new(num_cells: usize) -> Self {
        Self {
            num_cells,
            faces: Vec::new(),
        }
    }

    /// Builds the relation from per-face `(cell, sign)` lists.
    pub fn from_faces(num_cells: usize, faces: Vec<Vec<(usize, Sign)>>) -> Self {
        Self { num_cells, faces }
    }

    /// Builds the relation from per-cell `(face, sign)` lists.
    pub fn from_cells(num_faces: usize, cells: &[Vec<(usize, Sign)>]) -> Self {
        let mut faces = vec![Vec::new(); num_faces];
        for (cell, entries) in cells.iter().enumerate() {
            for &(face, sign) in entries {
                if let Some(slot) = faces.get_mut(face) {
                    slot.push((cell, sign));
                }
            }
        }
        Self {
            num_cells: cells.len(),
            faces,
        }
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// `(num_faces, num_cells)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.faces.len(), self.num_cells)
    }

    /// Cells incident to `face` with their orientation. Empty for unknown faces.
    #[inline]
    pub fn cells_of(&self, face: usize) -> &[(usize, Sign)] {
        self.faces.get(face).map_or(&[], Vec::as_slice)
    }

    /// Number of incident cells, i.e. the column sum of `|cell_faces|`.
    #[inline]
    pub fn incidence_count(&self, face: usize) -> usize {
        self.cells_of(face).len()
    }

    /// Orientation of `face` as seen from `cell`, or `None` when not incident.
    pub fn sign(&self, cell: usize, face: usize) -> Option<Sign> {
        self.cells_of(face)
            .iter()
            .find_map(|&(c, s)| (c == cell).then_some(s))
    }

    /// Total number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// Replaces the incident cells of an existing face.
    pub fn set_face(&mut self, face: usize, entries: Vec<(usize, Sign)>) {
        if let Some(slot) = self.faces.get_mut(face) {
            *slot = entries;
        }
    }

    /// Appends a face and returns its index.
    pub fn push_face(&mut self, entries: Vec<(usize, Sign)>) -> usize {
        self.faces.push(entries);
        self.faces.len() - 1
    }

    /// Iterate `(face, cells)` for every face.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[(usize, Sign)])> + '_ {
        self.faces.iter().enumerate().map(|(f, c)| (f, c.as_slice()))
    }

    /// Per-cell `(face, sign)` lists, faces in ascending order.
    pub fn transpose(&self) -> Vec<Vec<(usize, Sign)>> {
        let mut cells = vec![Vec::new(); self.num_cells];
        for (face, entries) in self.faces.iter().enumerate() {
            for &(cell, sign) in entries {
                if let Some(slot) = cells.get_mut(cell) {
                    slot.push((face, sign));
                }
            }
        }
        cells
    }
}

/// Face–node incidence, stored per face as the ordered node list.
///
/// The order inside a face carries its tangent direction; the splitter keeps
/// it intact and only substitutes node indices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceNodes {
    num_nodes: usize,
    faces: Vec<Vec<usize>>,
}

impl FaceNodes {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            faces: Vec::new(),
        }
    }

    pub fn from_faces(num_nodes: usize, faces: Vec<Vec<usize>>) -> Self {
        Self { num_nodes, faces }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// `(num_nodes, num_faces)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_nodes, self.faces.len())
    }

    /// Nodes of `face` in their stored order. Empty for unknown faces.
    #[inline]
    pub fn nodes_of(&self, face: usize) -> &[usize] {
        self.faces.get(face).map_or(&[], Vec::as_slice)
    }

    pub fn nnz(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// Appends a face and returns its index.
    pub fn push_face(&mut self, nodes: Vec<usize>) -> usize {
        self.faces.push(nodes);
        self.faces.len() - 1
    }

    /// Allocates a fresh node row and returns its index.
    ///
    /// Crate-internal: a [`Grid`](crate::topology::Grid) must add the
    /// coordinate row alongside, see `Grid::push_node`.
    pub(crate) fn push_node(&mut self) -> usize {
        self.num_nodes += 1;
        self.num_nodes - 1
    }

    /// Substitutes `old` by `new` in `face`; returns whether anything changed.
    pub fn replace_node(&mut self, face: usize, old: usize, new: usize) -> bool {
        let Some(nodes) = self.faces.get_mut(face) else {
            return false;
        };
        let mut changed = false;
        for n in nodes.iter_mut().filter(|n| **n == old) {
            *n = new;
            changed = true;
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.faces.iter().enumerate().map(|(f, n)| (f, n.as_slice()))
    }

    /// Per-node face lists, faces in ascending order.
    pub fn transpose(&self) -> Vec<Vec<usize>> {
        let mut nodes = vec![Vec::new(); self.num_nodes];
        for (face, members) in self.faces.iter().enumerate() {
            for &n in members {
                if let Some(slot) = nodes.get_mut(n) {
                    if slot.last() != Some(&face) {
                        slot.push(face);
                    }
                }
            }
        }
        nodes
    }
}
