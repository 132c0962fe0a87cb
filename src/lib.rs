#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-fracture
//!
//! mesh-fracture turns fracture traces into internal boundaries of a 2D grid.
//! Given the cell–face and face–node incidence of a structured or unstructured
//! grid and a set of faces tagged as fracture, it duplicates every tagged face,
//! duplicates the nodes strictly inside the fracture, keeps fracture tips
//! shared, and rewires incidence so each cell still sees exactly the faces that
//! bound it. Solvers can then treat the fracture as a discontinuity.
//!
//! ## Features
//! - `Grid` topology store with signed cell–face and face–node relations
//! - `Fracture` descriptor: validated traces, tip and intersection detection
//! - Splitting of single, crossing, T-shaped, closed and boundary-reaching traces
//! - Post-condition verification of face, node and boundary-face counts
//! - Optional Rayon parallelism for the per-node side partition
//!
//! ## Usage
//! ```rust
//! use mesh_fracture::geometry::face_centers;
//! use mesh_fracture::mesh_generation::cart_grid;
//! use mesh_fracture::algs::split_fracture;
//!
//! let g = cart_grid(10, 10).unwrap();
//! let tag: Vec<bool> = face_centers(&g)
//!     .iter()
//!     .map(|c| c[1] == 5.0 && c[0] > 2.5 && c[0] < 7.5)
//!     .collect();
//! let h = split_fracture(&g, &tag).unwrap();
//! assert_eq!(h.num_faces(), g.num_faces() + 4);
//! assert_eq!(h.num_nodes(), g.num_nodes() + 3);
//! ```
//!
//! ## Determinism
//!
//! New faces and nodes are numbered in ascending order of the tagged face or
//! fracture node they derive from, so repeated splits of the same input give
//! identical grids.

pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh_error;
pub mod mesh_generation;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::fracture::{Fracture, NodeRole, NodeRoles, Trace};
    pub use crate::algs::split::{
        SplitMaps, SplitOptions, Verification, split_fracture, split_fracture_in_place,
        split_grid, split_grid_with,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh_error::{MeshFractureError, TraceDefect};
    pub use crate::topology::grid::Grid;
    pub use crate::topology::incidence::{CellFaces, FaceNodes, Sign};
}
