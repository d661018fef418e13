//! Latitude/longitude sphere mesh generation for planet bodies.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Sphere mesh with parallel per-vertex attributes.
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

/// Generate a UV sphere centred on the origin.
///
/// Produces `(width_segments + 1) * (height_segments + 1)` vertices; the seam
/// column and pole rows are duplicated so UVs stay continuous. Pole rows emit
/// a single triangle per quad. Triangles wind counter-clockwise seen from
/// outside. Segment counts below 3 (width) or 2 (height) are raised to those
/// minimums.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> SphereMesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let vertex_count = ((width_segments + 1) * (height_segments + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // Centre the texture seam on the pole vertices.
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let vertex = Vec3::new(
                -radius * (u * TAU).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * TAU).sin() * (v * PI).sin(),
            );
            positions.push(vertex.to_array());
            normals.push(vertex.normalize_or_zero().to_array());
            uvs.push([u + u_offset, 1.0 - v]);
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::with_capacity((width_segments * (2 * height_segments - 2) * 3) as usize);
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh {
        positions,
        normals,
        uvs,
        indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_triangle_counts() {
        let mesh = uv_sphere(1.0, 32, 32);
        assert_eq!(mesh.positions.len(), 33 * 33);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.uvs.len(), mesh.positions.len());
        // Two triangles per quad except one per quad in the pole rows.
        assert_eq!(mesh.indices.len() / 3, (32 * (2 * 32 - 2)) as usize);
    }

    #[test]
    fn test_vertices_lie_on_radius() {
        let radius = 100.0;
        let mesh = uv_sphere(radius, 16, 12);
        for p in &mesh.positions {
            let len = Vec3::from_array(*p).length();
            assert!((len - radius).abs() < 1e-3, "vertex at distance {len}");
        }
    }

    #[test]
    fn test_indices_in_bounds() {
        let mesh = uv_sphere(2.0, 8, 6);
        let n = mesh.positions.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_triangles_face_outward() {
        let mesh = uv_sphere(1.0, 12, 8);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn test_minimum_segments_enforced() {
        let mesh = uv_sphere(1.0, 1, 1);
        assert_eq!(mesh.positions.len(), 4 * 3);
    }
}
