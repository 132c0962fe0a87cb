//! Re-export public algorithms.

pub mod fracture;
pub mod sectors;
pub mod split;

pub use fracture::{Fracture, NodeRole, NodeRoles, Trace};
pub use split::{
    SplitMaps, SplitOptions, Verification, split_fracture, split_fracture_in_place, split_grid,
    split_grid_with, verify_split,
};
