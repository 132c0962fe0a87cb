//! Minimal geometry for 2D grids: face centers, normals, lengths and cell centers.
//!
//! The splitter itself is purely combinatorial; these helpers exist so callers
//! can select fracture faces by position (e.g. "faces centered on y = 5").

use crate::topology::grid::Grid;

/// Midpoint of every face.
pub fn face_centers(grid: &Grid) -> Vec<[f64; 2]> {
    (0..grid.num_faces())
        .map(|f| {
            let pts: Vec<[f64; 2]> = grid
                .nodes_of_face(f)
                .iter()
                .filter_map(|&n| grid.node(n))
                .collect();
            mean(&pts)
        })
        .collect()
}

/// Face normals scaled by face length.
///
/// The normal is the tangent (first node → second node) rotated clockwise.
pub fn face_normals(grid: &Grid) -> Vec<[f64; 2]> {
    (0..grid.num_faces())
        .map(|f| match face_endpoints(grid, f) {
            Some((a, b)) => [b[1] - a[1], a[0] - b[0]],
            None => [0.0, 0.0],
        })
        .collect()
}

/// Length of every face.
pub fn face_lengths(grid: &Grid) -> Vec<f64> {
    face_normals(grid)
        .into_iter()
        .map(|[x, y]| x.hypot(y))
        .collect()
}

/// Vertex average of every cell.
pub fn cell_centers(grid: &Grid) -> Vec<[f64; 2]> {
    grid.cell_faces()
        .transpose()
        .iter()
        .map(|faces| {
            let mut nodes: Vec<usize> = faces
                .iter()
                .flat_map(|&(f, _)| grid.nodes_of_face(f).iter().copied())
                .collect();
            nodes.sort_unstable();
            nodes.dedup();
            let pts: Vec<[f64; 2]> = nodes.iter().filter_map(|&n| grid.node(n)).collect();
            mean(&pts)
        })
        .collect()
}

fn face_endpoints(grid: &Grid, face: usize) -> Option<([f64; 2], [f64; 2])> {
    match grid.nodes_of_face(face) {
        [a, b] => Some((grid.node(*a)?, grid.node(*b)?)),
        _ => None,
    }
}

fn mean(pts: &[[f64; 2]]) -> [f64; 2] {
    if pts.is_empty() {
        return [0.0, 0.0];
    }
    let n = pts.len() as f64;
    let (sx, sy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_generation::cart_grid;

    #[test]
    fn unit_square_geometry() {
        let g = cart_grid(1, 1).unwrap();
        let centers = face_centers(&g);
        assert_eq!(centers[0], [0.0, 0.5]);
        assert_eq!(centers[3], [0.5, 1.0]);
        let normals = face_normals(&g);
        assert_eq!(normals[1], [1.0, 0.0]);
        assert_eq!(normals[3], [0.0, 1.0]);
        assert_eq!(face_lengths(&g), vec![1.0; 4]);
        assert_eq!(cell_centers(&g), vec![[0.5, 0.5]]);
    }

    #[test]
    fn normals_point_out_of_positive_cell() {
        let g = cart_grid(3, 2).unwrap();
        let normals = face_normals(&g);
        let faces = face_centers(&g);
        let cells = cell_centers(&g);
        for (f, entries) in g.cell_faces().iter() {
            for &(c, s) in entries {
                let out = [faces[f][0] - cells[c][0], faces[f][1] - cells[c][1]];
                let dot = out[0] * normals[f][0] + out[1] * normals[f][1];
                assert_eq!(dot > 0.0, s.value() > 0, "face {f} cell {c}");
            }
        }
    }
}
