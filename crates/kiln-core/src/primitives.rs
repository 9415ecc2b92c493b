//! Built-in primitive meshes.

use glam::{Vec2, Vec3};

use crate::mesh::MeshData;

/// Axis-aligned cube centered at the origin with edge length `size`.
///
/// Each face has its own four vertices so normals and UVs stay flat.
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    // (normal, u axis, v axis) per face
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = positions.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push((normal + u * su + v * sv) * h);
            normals.push(normal);
            uvs.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    build(positions, normals, uvs, indices)
}

/// Square in the XZ plane facing +Y, centered at the origin.
pub fn plane(size: f32) -> MeshData {
    let h = size * 0.5;
    let positions = vec![
        Vec3::new(-h, 0.0, h),
        Vec3::new(h, 0.0, h),
        Vec3::new(h, 0.0, -h),
        Vec3::new(-h, 0.0, -h),
    ];
    let uvs = vec![
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 0.0),
    ];
    build(positions, vec![Vec3::Y; 4], uvs, vec![0, 1, 2, 0, 2, 3])
}

fn build(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> MeshData {
    match MeshData::new(positions, normals, uvs, indices) {
        Ok(mesh) => mesh,
        // Primitive tables are fixed and always consistent.
        Err(err) => unreachable!("invalid primitive mesh: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ccw_outward(mesh: &MeshData) {
        let p = mesh.positions();
        let n = mesh.normals();
        for tri in mesh.indices().chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (p[b] - p[a]).cross(p[c] - p[a]);
            assert!(face.dot(n[a]) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn test_cube_layout() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.positions().iter().all(|p| p.abs().max_element() <= 1.0 + 1e-6));
        assert_ccw_outward(&mesh);
    }

    #[test]
    fn test_plane_layout() {
        let mesh = plane(10.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_ccw_outward(&mesh);
        assert!(mesh.tangents().iter().all(|t| t.length() > 0.99));
    }

    #[test]
    fn test_primitives_get_distinct_ids() {
        assert_ne!(cube(1.0).id(), cube(1.0).id());
    }
}
