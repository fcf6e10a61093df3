//! Closed and open mesh generators
//!
//! Used to build test fixtures and benchmark inputs with known volume and
//! surface area. All closed generators emit consistently wound, outward facing
//! triangles so the signed volume is positive.

use crate::mesh::{face_edges, TriangleMesh};
use crate::point::*;
use itertools::iproduct;
use std::collections::HashMap;

/// Regular tetrahedron-like corner simplex with unit legs (volume 1/6).
pub fn tetrahedron() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

/// Geodesic sphere built by repeatedly splitting an icosahedron 1→4 and
/// projecting the new vertices onto the sphere.
///
/// The result has `20 * 4^subdivisions` triangles.
pub fn icosphere(radius: f32, subdivisions: u32) -> TriangleMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut vertices: Vec<Point3d> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3d::new(x, y, z))
    .collect();

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        faces = split_faces(&mut vertices, &faces);
    }

    let radius = radius as f64;
    let vertices = vertices
        .iter()
        .map(|p| to_f32(&Point3d::from(p.coords.normalize() * radius)))
        .collect();
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Axis-aligned box centred on the origin whose six sides are each tessellated
/// into a `segments x segments` grid of quads (two triangles each).
///
/// Seam vertices are shared, so the result is a closed manifold with
/// `12 * segments^2` triangles.
pub fn cuboid(extent: [f32; 3], segments: usize) -> TriangleMesh {
    let n = segments.max(1);
    let mut index: HashMap<[usize; 3], usize> = HashMap::new();
    let mut vertices = Vec::new();
    let mut lattice = |c: [usize; 3]| -> usize {
        *index.entry(c).or_insert_with(|| {
            let coord =
                |axis: usize| extent[axis] * (c[axis] as f32 / n as f32 - 0.5);
            vertices.push(Point3f::new(coord(0), coord(1), coord(2)));
            vertices.len() - 1
        })
    };

    let mut faces = Vec::with_capacity(12 * n * n);
    // (normal axis, u axis, v axis) with u x v = +normal
    for (axis, u, v) in [(0, 1, 2), (1, 2, 0), (2, 0, 1)] {
        for (side, i, j) in iproduct!([0, n], 0..n, 0..n) {
            let corner = |du: usize, dv: usize| {
                let mut c = [0usize; 3];
                c[axis] = side;
                c[u] = i + du;
                c[v] = j + dv;
                c
            };
            let p00 = lattice(corner(0, 0));
            let p10 = lattice(corner(1, 0));
            let p11 = lattice(corner(1, 1));
            let p01 = lattice(corner(0, 1));
            if side == n {
                faces.push([p00, p10, p11]);
                faces.push([p00, p11, p01]);
            } else {
                faces.push([p00, p11, p10]);
                faces.push([p00, p01, p11]);
            }
        }
    }

    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Flat open sheet of `size x size` vertices with unit spacing in the XY plane.
pub fn plane_grid(size: usize) -> TriangleMesh {
    let size = size.max(2);
    let vertices = iproduct!(0..size, 0..size)
        .map(|(y, x)| Point3f::new(x as f32, y as f32, 0.0))
        .collect();
    let faces = iproduct!(0..size - 1, 0..size - 1)
        .flat_map(|(y, x)| {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            [[tl, tr, bl], [tr, br, bl]]
        })
        .collect();
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Split every triangle 1→4 at its edge midpoints, `depth` times, without
/// moving any vertex. Geometry (and so volume and area) is unchanged while the
/// triangle count grows by `4^depth`.
pub fn subdivide(mesh: &TriangleMesh, depth: u32) -> TriangleMesh {
    let mut vertices: Vec<Point3d> = mesh.vertices.iter().map(to_f64).collect();
    let mut faces = mesh.faces.clone();
    for _ in 0..depth {
        faces = split_faces(&mut vertices, &faces);
    }
    TriangleMesh::from_vertices_and_faces(vertices.iter().map(to_f32).collect(), faces)
}

fn split_faces(vertices: &mut Vec<Point3d>, faces: &[[usize; 3]]) -> Vec<[usize; 3]> {
    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::with_capacity(faces.len() * 3 / 2);
    let mut result = Vec::with_capacity(faces.len() * 4);

    for face in faces {
        let [ab, bc, ca] = face_edges(face).map(|(lo, hi)| {
            *midpoints.entry((lo, hi)).or_insert_with(|| {
                let mid = Point3d::from((vertices[lo].coords + vertices[hi].coords) * 0.5);
                vertices.push(mid);
                vertices.len() - 1
            })
        });
        let [a, b, c] = *face;
        result.push([a, ab, ca]);
        result.push([b, bc, ab]);
        result.push([c, ca, bc]);
        result.push([ab, bc, ca]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Count faces per undirected edge; every edge of a closed manifold has two.
    fn edge_face_counts(mesh: &TriangleMesh) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::new();
        for face in &mesh.faces {
            for e in face_edges(face) {
                *counts.entry(e).or_insert(0) += 1;
            }
        }
        counts
    }

    fn signed_volume(mesh: &TriangleMesh) -> f64 {
        mesh.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    #[test]
    fn test_icosphere_counts() {
        for s in 0..3 {
            let mesh = icosphere(1.0, s);
            assert_eq!(mesh.face_count(), 20 * 4usize.pow(s));
            // Euler characteristic of a sphere: V - E + F = 2
            assert_eq!(mesh.vertex_count(), 10 * 4usize.pow(s) + 2);
        }
    }

    #[test]
    fn test_icosphere_is_closed_and_outward() {
        let mesh = icosphere(2.0, 2);
        assert!(edge_face_counts(&mesh).values().all(|&c| c == 2));
        let volume = signed_volume(&mesh);
        let sphere = 4.0 / 3.0 * std::f64::consts::PI * 8.0;
        assert!(volume > 0.0);
        assert!(volume < sphere && volume > 0.9 * sphere);
    }

    #[test]
    fn test_cuboid_is_closed_with_exact_volume() {
        let mesh = cuboid([2.0, 3.0, 4.0], 3);
        assert_eq!(mesh.face_count(), 12 * 9);
        assert!(edge_face_counts(&mesh).values().all(|&c| c == 2));
        approx::assert_relative_eq!(signed_volume(&mesh), 24.0, epsilon = 1e-4);
    }

    #[test]
    fn test_plane_grid_is_open() {
        let mesh = plane_grid(4);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.face_count(), 18);
        assert!(edge_face_counts(&mesh).values().any(|&c| c == 1));
        approx::assert_relative_eq!(signed_volume(&mesh), 0.0);
    }

    #[test]
    fn test_subdivide_preserves_geometry() {
        let mesh = cuboid([1.0, 1.0, 1.0], 1);
        let dense = subdivide(&mesh, 2);
        assert_eq!(dense.face_count(), mesh.face_count() * 16);
        assert!(edge_face_counts(&dense).values().all(|&c| c == 2));
        approx::assert_relative_eq!(signed_volume(&dense), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_tetrahedron_volume() {
        approx::assert_relative_eq!(signed_volume(&tetrahedron()), 1.0 / 6.0, epsilon = 1e-7);
    }
}
