//! Grid generators: structured Cartesian grids and unstructured polygon grids.
//!
//! Face normals follow the tangent of the stored node order rotated clockwise,
//! so a face is `Sign::Positive` for the cell it points out of.

use std::collections::HashMap;

use crate::mesh_error::MeshFractureError;
use crate::topology::grid::Grid;
use crate::topology::incidence::{CellFaces, FaceNodes, Sign};

fn invalid_geometry(message: impl Into<String>) -> MeshFractureError {
    MeshFractureError::InvalidGeometry(message.into())
}

/// Generate a structured `nx`×`ny` grid of unit cells over `[0, nx]×[0, ny]`.
pub fn cart_grid(nx: usize, ny: usize) -> Result<Grid, MeshFractureError> {
    cart_grid_with_extent(nx, ny, [nx as f64, ny as f64])
}

/// Generate a structured `nx`×`ny` grid over `[0, extent[0]]×[0, extent[1]]`.
///
/// Numbering:
/// - node `(i, j)` is `j * (nx + 1) + i`;
/// - cell `(i, j)` is `j * nx + i`;
/// - x-faces (normal along +x) come first, face `(i, j)` at `j * (nx + 1) + i`,
///   running from node `(i, j)` to `(i, j + 1)`;
/// - y-faces (normal along +y) follow, face `(i, j)` at `nx_faces + j * nx + i`,
///   running from node `(i + 1, j)` to `(i, j)`.
pub fn cart_grid_with_extent(
    nx: usize,
    ny: usize,
    extent: [f64; 2],
) -> Result<Grid, MeshFractureError> {
    if nx == 0 || ny == 0 {
        return Err(invalid_geometry("nx and ny must be positive"));
    }
    if !(extent[0] > 0.0 && extent[1] > 0.0) {
        return Err(invalid_geometry(format!(
            "extent must be positive, got {extent:?}"
        )));
    }

    let dx = extent[0] / nx as f64;
    let dy = extent[1] / ny as f64;
    let node = |i: usize, j: usize| j * (nx + 1) + i;

    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            nodes.push([i as f64 * dx, j as f64 * dy]);
        }
    }

    let num_x_faces = (nx + 1) * ny;
    let num_y_faces = nx * (ny + 1);
    let mut faces = Vec::with_capacity(num_x_faces + num_y_faces);
    for j in 0..ny {
        for i in 0..=nx {
            faces.push(vec![node(i, j), node(i, j + 1)]);
        }
    }
    for j in 0..=ny {
        for i in 0..nx {
            faces.push(vec![node(i + 1, j), node(i, j)]);
        }
    }

    let x_face = |i: usize, j: usize| j * (nx + 1) + i;
    let y_face = |i: usize, j: usize| num_x_faces + j * nx + i;
    let mut cells = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            cells.push(vec![
                (x_face(i, j), Sign::Negative),
                (x_face(i + 1, j), Sign::Positive),
                (y_face(i, j), Sign::Negative),
                (y_face(i, j + 1), Sign::Positive),
            ]);
        }
    }

    let face_nodes = FaceNodes::from_faces(nodes.len(), faces);
    let cell_faces = CellFaces::from_cells(face_nodes.num_faces(), &cells);
    Grid::new(nodes, face_nodes, cell_faces)
}

/// Build an unstructured grid from polygonal cells.
///
/// Each cell lists its vertices counter-clockwise. Shared edges become one
/// face; the face keeps the node order of the first cell that mentions it.
pub fn polygon_grid(
    nodes: Vec<[f64; 2]>,
    cells: &[Vec<usize>],
) -> Result<Grid, MeshFractureError> {
    let mut face_of_edge: HashMap<(usize, usize), usize> = HashMap::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut cell_entries = Vec::with_capacity(cells.len());

    for (cell_idx, vertices) in cells.iter().enumerate() {
        if vertices.len() < 3 {
            return Err(invalid_geometry(format!(
                "cell {cell_idx} has {} vertices, need at least 3",
                vertices.len()
            )));
        }
        let mut entries = Vec::with_capacity(vertices.len());
        for k in 0..vertices.len() {
            let a = vertices[k];
            let b = vertices[(k + 1) % vertices.len()];
            if a >= nodes.len() || b >= nodes.len() {
                return Err(invalid_geometry(format!(
                    "cell {cell_idx} references missing vertex {}",
                    a.max(b)
                )));
            }
            let key = (a.min(b), a.max(b));
            let face = *face_of_edge.entry(key).or_insert_with(|| {
                faces.push(vec![a, b]);
                faces.len() - 1
            });
            let sign = if faces[face][0] == a {
                Sign::Positive
            } else {
                Sign::Negative
            };
            entries.push((face, sign));
        }
        cell_entries.push(entries);
    }

    let face_nodes = FaceNodes::from_faces(nodes.len(), faces);
    let cell_faces = CellFaces::from_cells(face_nodes.num_faces(), &cell_entries);
    Grid::new(nodes, face_nodes, cell_faces)
}
