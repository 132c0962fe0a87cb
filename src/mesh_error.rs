//! MeshFractureError: Unified error type for mesh-fracture public APIs
//!
//! Every fallible operation in the crate (grid construction, fracture
//! description, splitting) reports through this enum so callers can match on
//! the offending face/node/cell indices instead of parsing messages.

use std::fmt;
use thiserror::Error;

/// Why a face mask was refused as a fracture trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceDefect {
    /// The mask selects no faces.
    Empty,
    /// The mask length does not match the number of faces in the grid.
    MaskLength { expected: usize, found: usize },
    /// The selected faces fall apart into several node-connected groups.
    Disconnected { components: usize },
    /// A node is shared by more than two faces of the same trace.
    Branching { node: usize, degree: usize },
    /// A selected face does not separate two cells.
    BoundaryFace { face: usize, cells: usize },
}

impl fmt::Display for TraceDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceDefect::Empty => write!(f, "mask selects no faces"),
            TraceDefect::MaskLength { expected, found } => {
                write!(f, "mask has length {found}, grid has {expected} faces")
            }
            TraceDefect::Disconnected { components } => {
                write!(f, "faces form {components} disconnected groups")
            }
            TraceDefect::Branching { node, degree } => {
                write!(f, "node {node} is shared by {degree} faces of the trace")
            }
            TraceDefect::BoundaryFace { face, cells } => {
                write!(f, "face {face} has {cells} incident cell(s), expected 2")
            }
        }
    }
}

/// Unified error type for mesh-fracture operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshFractureError {
    /// A face mask could not be accepted as a single trace.
    #[error("malformed fracture trace {trace}: {reason}")]
    MalformedTrace { trace: usize, reason: TraceDefect },
    /// Two traces claim the same face; traces may only meet at nodes.
    #[error("face {face} is tagged by trace {first} and trace {second}")]
    OverlappingTraces {
        face: usize,
        first: usize,
        second: usize,
    },
    /// Topology disagrees with itself (descriptor/grid mismatch or a failed post-condition).
    #[error("inconsistent topology: {0}")]
    InconsistentTopology(String),
    /// A face index is outside `0..num_faces`.
    #[error("face {face} out of range (grid has {num_faces} faces)")]
    FaceOutOfRange { face: usize, num_faces: usize },
    /// A node index is outside `0..num_nodes`.
    #[error("face {face} references node {node}, grid has {num_nodes} nodes")]
    NodeOutOfRange {
        face: usize,
        node: usize,
        num_nodes: usize,
    },
    /// A cell index is outside `0..num_cells`.
    #[error("face {face} references cell {cell}, grid has {num_cells} cells")]
    CellOutOfRange {
        face: usize,
        cell: usize,
        num_cells: usize,
    },
    /// A face does not have two distinct nodes.
    #[error("face {face} has {found} distinct node(s), expected 2")]
    FaceArity { face: usize, found: usize },
    /// A face is shared by more cells than a 2D manifold allows.
    #[error("face {face} has {found} incident cells (at most 2 allowed)")]
    TooManyCells { face: usize, found: usize },
    /// Both cells of an interior face see it with the same sign, or a cell is listed twice.
    #[error("face {face} has inconsistent cell orientation")]
    InvalidOrientation { face: usize },
    /// A face has no incident cell.
    #[error("face {face} is hanging (no incident cell)")]
    HangingFace { face: usize },
    /// Coordinates or generator arguments are unusable.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl MeshFractureError {
    /// True for the caller-side "bad fracture description" family.
    pub fn is_malformed_trace(&self) -> bool {
        matches!(
            self,
            MeshFractureError::MalformedTrace { .. } | MeshFractureError::OverlappingTraces { .. }
        )
    }
}
