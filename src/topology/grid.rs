//! The grid topology store.
//!
//! A [`Grid`] owns the cell→face and face→node incidence of a two-dimensional
//! grid together with the node coordinates. Faces are segments between two
//! nodes; cells are bounded by any number of faces.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshFractureError;
use crate::topology::incidence::{CellFaces, FaceNodes, Sign};
use crate::topology::validation::{ValidationOptions, validate_grid};

/// Cell/face/node incidence plus node coordinates of a 2D grid.
///
/// Deserialization goes through [`Grid::new`], so a decoded grid carries the
/// same guarantees as a constructed one.
#[derive(Clone, Debug, Serialize)]
pub struct Grid {
    nodes: Vec<[f64; 2]>,
    face_nodes: FaceNodes,
    cell_faces: CellFaces,
    #[serde(skip)]
    node_faces: OnceCell<Vec<Vec<usize>>>,
}

#[derive(Deserialize)]
struct GridParts {
    nodes: Vec<[f64; 2]>,
    face_nodes: FaceNodes,
    cell_faces: CellFaces,
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = GridParts::deserialize(deserializer)?;
        Grid::new(parts.nodes, parts.face_nodes, parts.cell_faces)
            .map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.face_nodes == other.face_nodes
            && self.cell_faces == other.cell_faces
    }
}

impl Grid {
    /// Builds a grid and validates its topology with [`ValidationOptions::default`].
    pub fn new(
        nodes: Vec<[f64; 2]>,
        face_nodes: FaceNodes,
        cell_faces: CellFaces,
    ) -> Result<Self, MeshFractureError> {
        Self::with_validation(nodes, face_nodes, cell_faces, ValidationOptions::default())
    }

    /// Builds a grid and validates it with the given options.
    pub fn with_validation(
        nodes: Vec<[f64; 2]>,
        face_nodes: FaceNodes,
        cell_faces: CellFaces,
        options: ValidationOptions,
    ) -> Result<Self, MeshFractureError> {
        let grid = Self::from_parts(nodes, face_nodes, cell_faces)?;
        validate_grid(&grid, options)?;
        Ok(grid)
    }

    /// Assembles a grid, checking only that the three parts agree on their counts.
    pub(crate) fn from_parts(
        nodes: Vec<[f64; 2]>,
        face_nodes: FaceNodes,
        cell_faces: CellFaces,
    ) -> Result<Self, MeshFractureError> {
        if face_nodes.num_nodes() != nodes.len() {
            return Err(MeshFractureError::InconsistentTopology(format!(
                "face_nodes has {} node rows but {} coordinates were given",
                face_nodes.num_nodes(),
                nodes.len()
            )));
        }
        if face_nodes.num_faces() != cell_faces.num_faces() {
            return Err(MeshFractureError::InconsistentTopology(format!(
                "face_nodes has {} faces, cell_faces has {}",
                face_nodes.num_faces(),
                cell_faces.num_faces()
            )));
        }
        Ok(Self {
            nodes,
            face_nodes,
            cell_faces,
            node_faces: OnceCell::new(),
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<[f64; 2]>, FaceNodes, CellFaces) {
        (self.nodes, self.face_nodes, self.cell_faces)
    }

    /// Spatial dimension; always 2.
    #[inline]
    pub const fn dim(&self) -> usize {
        2
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cell_faces.num_cells()
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_nodes.num_faces()
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.face_nodes.num_nodes()
    }

    #[inline]
    pub fn cell_faces(&self) -> &CellFaces {
        &self.cell_faces
    }

    #[inline]
    pub fn face_nodes(&self) -> &FaceNodes {
        &self.face_nodes
    }

    /// Mutable access to the cell–face relation.
    pub fn cell_faces_mut(&mut self) -> &mut CellFaces {
        &mut self.cell_faces
    }

    /// Mutable access to the face–node relation; drops the cached node→face view.
    ///
    /// New nodes are added with [`Grid::push_node`] so coordinates stay in step.
    pub fn face_nodes_mut(&mut self) -> &mut FaceNodes {
        self.node_faces.take();
        &mut self.face_nodes
    }

    /// Appends a node at `coord` and returns its index.
    pub fn push_node(&mut self, coord: [f64; 2]) -> usize {
        self.node_faces.take();
        self.nodes.push(coord);
        self.face_nodes.push_node()
    }

    /// Node coordinates, one row per node.
    #[inline]
    pub fn nodes(&self) -> &[[f64; 2]] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, n: usize) -> Option<[f64; 2]> {
        self.nodes.get(n).copied()
    }

    /// Cells incident to `face`, with orientation.
    #[inline]
    pub fn cells_of_face(&self, face: usize) -> &[(usize, Sign)] {
        self.cell_faces.cells_of(face)
    }

    /// Nodes of `face`.
    #[inline]
    pub fn nodes_of_face(&self, face: usize) -> &[usize] {
        self.face_nodes.nodes_of(face)
    }

    /// Faces touching each node (cached until `face_nodes_mut` is called).
    pub fn node_faces(&self) -> &[Vec<usize>] {
        self.node_faces.get_or_init(|| self.face_nodes.transpose())
    }

    /// Faces with exactly one incident cell.
    pub fn boundary_faces(&self) -> Vec<usize> {
        self.cell_faces
            .iter()
            .filter_map(|(f, cells)| (cells.len() == 1).then_some(f))
            .collect()
    }

    /// Faces with no incident cell.
    pub fn hanging_faces(&self) -> Vec<usize> {
        self.cell_faces
            .iter()
            .filter_map(|(f, cells)| cells.is_empty().then_some(f))
            .collect()
    }

    /// Per-node flag: touched by at least one boundary face.
    pub fn boundary_nodes(&self) -> Vec<bool> {
        let mut flags = vec![false; self.num_nodes()];
        for f in self.boundary_faces() {
            for &n in self.nodes_of_face(f) {
                if let Some(flag) = flags.get_mut(n) {
                    *flag = true;
                }
            }
        }
        flags
    }

    /// Deep copy of topology and coordinates.
    ///
    /// Splitting never mutates its input; callers that want to keep working
    /// on the unsplit grid can also take a copy up front.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl DebugInvariants for Grid {
    fn validate_invariants(&self) -> Result<(), MeshFractureError> {
        validate_grid(self, ValidationOptions::all())
    }
}
