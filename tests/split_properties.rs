use proptest::prelude::*;

use mesh_fracture::algs::{Fracture, SplitOptions, split_fracture, split_grid_with};
use mesh_fracture::mesh_generation::cart_grid;

/// y-face `(i, j)` of an `nx`×`ny` Cartesian grid.
fn y_face(nx: usize, ny: usize, i: usize, j: usize) -> usize {
    (nx + 1) * ny + j * nx + i
}

/// x-face `(i, j)` of an `nx`×`ny` Cartesian grid.
fn x_face(nx: usize, i: usize, j: usize) -> usize {
    j * (nx + 1) + i
}

/// A horizontal interior trace with both tips strictly inside the domain.
fn open_trace() -> impl Strategy<Value = (usize, usize, usize, usize, usize)> {
    (3usize..12, 3usize..12).prop_flat_map(|(nx, ny)| {
        (Just(nx), Just(ny), 1..ny, 1..nx - 1).prop_flat_map(move |(nx, ny, j, i0)| {
            (Just(nx), Just(ny), Just(j), Just(i0), i0 + 1..nx)
        })
    })
}

proptest! {
    #[test]
    fn single_open_trace_laws((nx, ny, j, i0, i1) in open_trace()) {
        let g = cart_grid(nx, ny).unwrap();
        let mut tag = vec![false; g.num_faces()];
        for i in i0..i1 {
            tag[y_face(nx, ny, i, j)] = true;
        }
        let k = i1 - i0;

        let h = split_fracture(&g, &tag).unwrap();
        prop_assert_eq!(h.num_faces(), g.num_faces() + k);
        prop_assert_eq!(h.num_nodes(), g.num_nodes() + k - 1);
        prop_assert_eq!(h.num_cells(), g.num_cells());
        prop_assert_eq!(h.boundary_faces().len(), g.boundary_faces().len() + 2 * k);
        prop_assert!(h.hanging_faces().is_empty());
    }

    #[test]
    fn crossing_traces_laws(
        n in 6usize..12,
        a in 1usize..3,
        b in 1usize..3,
        c in 1usize..3,
        d in 1usize..3,
    ) {
        let g = cart_grid(n, n).unwrap();
        let mid = n / 2;
        let mut tag = vec![false; g.num_faces()];
        // horizontal trace through (mid, mid), `a` faces left and `b` right
        for i in mid - a..mid + b {
            tag[y_face(n, n, i, mid)] = true;
        }
        // vertical trace through (mid, mid), `c` faces below and `d` above
        for j in mid - c..mid + d {
            tag[x_face(n, mid, j)] = true;
        }
        let m = a + b + c + d;

        let fracture = Fracture::from_mask(&g, &tag).unwrap();
        let roles = fracture.roles().unwrap().clone();
        prop_assert_eq!(roles.tip_nodes().len(), 4);
        prop_assert_eq!(roles.intersection_nodes().len(), 1);

        let (h, maps) = split_grid_with(&g, &fracture, SplitOptions::default()).unwrap();
        prop_assert_eq!(h.num_faces(), g.num_faces() + m);
        prop_assert_eq!(h.boundary_faces().len(), g.boundary_faces().len() + 2 * m);
        prop_assert!(h.hanging_faces().is_empty());

        let interior = roles.interior_nodes().len();
        prop_assert_eq!(h.num_nodes(), g.num_nodes() + interior + 1);
        for tip in roles.tip_nodes() {
            prop_assert!(!maps.node_copies.contains_key(tip));
        }
    }
}
