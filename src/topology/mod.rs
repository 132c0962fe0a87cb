//! Top-level module for grid topology.
//!
//! This module provides the incidence store the splitter operates on:
//! - Signed cell–face and face–node relations
//! - The `Grid` owning both relations plus node coordinates
//! - Structural validation helpers

pub mod grid;
pub mod incidence;
pub mod validation;

pub use grid::Grid;
pub use incidence::{CellFaces, FaceNodes, Sign};
