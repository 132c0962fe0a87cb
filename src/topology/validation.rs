//! Topology validation helpers.

use std::collections::HashSet;

use crate::mesh_error::MeshFractureError;
use crate::topology::grid::Grid;

/// Optional validation toggles for grid topology checks.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Ensure interior faces are seen with opposite signs by their two cells.
    pub check_orientation: bool,
    /// Ensure no cell appears twice on the same face.
    pub check_duplicate_cells: bool,
    /// How to handle faces with no incident cell.
    pub hanging_faces: HangingFaceHandling,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_orientation: true,
            check_duplicate_cells: true,
            hanging_faces: HangingFaceHandling::Error,
        }
    }
}

impl ValidationOptions {
    /// Enable all topology validation checks.
    pub fn all() -> Self {
        Self::default()
    }

    /// Index-range and arity checks only.
    pub fn structural() -> Self {
        Self {
            check_orientation: false,
            check_duplicate_cells: false,
            hanging_faces: HangingFaceHandling::Ignore,
        }
    }
}

/// Behavior for hanging-face detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangingFaceHandling {
    /// Skip hanging-face detection.
    Ignore,
    /// Log a warning on hanging faces.
    Warn,
    /// Return an error on the first hanging face.
    Error,
}

/// Validate a grid's incidence relations.
///
/// Always checked: every face has two distinct nodes, node and cell indices are
/// in range, and no face has more than two incident cells. Hanging faces are
/// only reported for grids that carry cells.
pub fn validate_grid(grid: &Grid, options: ValidationOptions) -> Result<(), MeshFractureError> {
    let num_nodes = grid.num_nodes();
    let num_cells = grid.num_cells();

    for (face, nodes) in grid.face_nodes().iter() {
        for &node in nodes {
            if node >= num_nodes {
                return Err(MeshFractureError::NodeOutOfRange {
                    face,
                    node,
                    num_nodes,
                });
            }
        }
        let distinct = if nodes.len() == 2 && nodes[0] == nodes[1] {
            1
        } else {
            nodes.len()
        };
        if distinct != 2 {
            return Err(MeshFractureError::FaceArity {
                face,
                found: distinct,
            });
        }
    }

    for (face, cells) in grid.cell_faces().iter() {
        for &(cell, _) in cells {
            if cell >= num_cells {
                return Err(MeshFractureError::CellOutOfRange {
                    face,
                    cell,
                    num_cells,
                });
            }
        }
        if cells.len() > 2 {
            return Err(MeshFractureError::TooManyCells {
                face,
                found: cells.len(),
            });
        }
        if let [(c0, s0), (c1, s1)] = cells {
            if options.check_duplicate_cells && c0 == c1 {
                return Err(MeshFractureError::InvalidOrientation { face });
            }
            if options.check_orientation && s0 == s1 {
                return Err(MeshFractureError::InvalidOrientation { face });
            }
        }
    }

    if num_cells > 0 {
        validate_hanging_faces(grid, options.hanging_faces)?;
    }

    Ok(())
}

fn validate_hanging_faces(
    grid: &Grid,
    handling: HangingFaceHandling,
) -> Result<(), MeshFractureError> {
    if handling == HangingFaceHandling::Ignore {
        return Ok(());
    }
    for face in grid.hanging_faces() {
        match handling {
            HangingFaceHandling::Warn => {
                log::warn!("Hanging face detected: face={face}");
            }
            HangingFaceHandling::Error => {
                return Err(MeshFractureError::HangingFace { face });
            }
            HangingFaceHandling::Ignore => {}
        }
    }
    Ok(())
}

/// Cells that appear on no face at all.
pub fn isolated_cells(grid: &Grid) -> Vec<usize> {
    let touched: HashSet<usize> = grid
        .cell_faces()
        .iter()
        .flat_map(|(_, cells)| cells.iter().map(|&(c, _)| c))
        .collect();
    (0..grid.num_cells())
        .filter(|c| !touched.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::incidence::{CellFaces, FaceNodes, Sign};

    fn triangle(cells: Vec<Vec<(usize, Sign)>>) -> Result<Grid, MeshFractureError> {
        Grid::new(
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            FaceNodes::from_faces(3, vec![vec![0, 1], vec![1, 2], vec![2, 0]]),
            CellFaces::from_faces(1, cells),
        )
    }

    #[test]
    fn single_triangle_is_valid() {
        let g = triangle(vec![
            vec![(0, Sign::Positive)],
            vec![(0, Sign::Positive)],
            vec![(0, Sign::Positive)],
        ])
        .unwrap();
        assert!(isolated_cells(&g).is_empty());
    }

    #[test]
    fn hanging_face_is_reported() {
        let err = triangle(vec![vec![(0, Sign::Positive)], vec![], vec![(0, Sign::Positive)]])
            .unwrap_err();
        assert_eq!(err, MeshFractureError::HangingFace { face: 1 });
    }

    #[test]
    fn hanging_face_can_be_ignored() {
        let g = Grid::with_validation(
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            FaceNodes::from_faces(3, vec![vec![0, 1], vec![1, 2], vec![2, 0]]),
            CellFaces::from_faces(1, vec![vec![(0, Sign::Positive)], vec![], vec![]]),
            ValidationOptions {
                hanging_faces: HangingFaceHandling::Warn,
                ..ValidationOptions::default()
            },
        )
        .unwrap();
        assert_eq!(g.hanging_faces(), vec![1, 2]);
    }

    #[test]
    fn cell_out_of_range() {
        let err = triangle(vec![
            vec![(0, Sign::Positive)],
            vec![(4, Sign::Positive)],
            vec![(0, Sign::Positive)],
        ])
        .unwrap_err();
        assert_eq!(
            err,
            MeshFractureError::CellOutOfRange {
                face: 1,
                cell: 4,
                num_cells: 1
            }
        );
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let err = Grid::new(
            vec![[0.0, 0.0], [1.0, 0.0]],
            FaceNodes::from_faces(2, vec![vec![1, 1]]),
            CellFaces::from_faces(0, vec![vec![]]),
        )
        .unwrap_err();
        assert_eq!(err, MeshFractureError::FaceArity { face: 0, found: 1 });
    }
}
