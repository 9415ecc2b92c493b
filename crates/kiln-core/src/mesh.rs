//! Decoded mesh data.

use glam::{Vec2, Vec3};

use crate::asset::{AssetError, AssetId, AssetResult};

/// Decoded triangle mesh, immutable after creation.
///
/// All per-vertex attribute arrays have the same length; `indices` describes
/// a triangle list into them.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    id: AssetId,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec3>,
    bitangents: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Creates a mesh, generating tangents and bitangents from the UVs.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<u32>,
    ) -> AssetResult<Self> {
        validate(&positions, &normals, &uvs, &indices)?;
        let (tangents, bitangents) = compute_tangents(&positions, &uvs, &indices);
        Ok(Self {
            id: AssetId::new(),
            positions,
            normals,
            tangents,
            bitangents,
            uvs,
            indices,
        })
    }

    /// Creates a mesh from fully specified attributes.
    pub fn from_parts(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        tangents: Vec<Vec3>,
        bitangents: Vec<Vec3>,
        uvs: Vec<Vec2>,
        indices: Vec<u32>,
    ) -> AssetResult<Self> {
        validate(&positions, &normals, &uvs, &indices)?;
        check_len("tangents", positions.len(), tangents.len())?;
        check_len("bitangents", positions.len(), bitangents.len())?;
        Ok(Self {
            id: AssetId::new(),
            positions,
            normals,
            tangents,
            bitangents,
            uvs,
            indices,
        })
    }

    /// Replaces the generated identity with a fixed one.
    ///
    /// Only meant for building data at load time; once the mesh is shared
    /// with a scene its identity must stay put.
    pub fn with_id(mut self, id: AssetId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    pub fn bitangents(&self) -> &[Vec3] {
        &self.bitangents
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn check_len(attribute: &'static str, expected: usize, actual: usize) -> AssetResult<()> {
    if expected != actual {
        return Err(AssetError::AttributeLengthMismatch {
            attribute,
            expected,
            actual,
        });
    }
    Ok(())
}

fn validate(positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2], indices: &[u32]) -> AssetResult<()> {
    check_len("normals", positions.len(), normals.len())?;
    check_len("uvs", positions.len(), uvs.len())?;

    if indices.len() % 3 != 0 {
        return Err(AssetError::IncompleteTriangle(indices.len()));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(AssetError::IndexOutOfRange {
            index,
            vertex_count: positions.len(),
        });
    }
    Ok(())
}

/// Accumulates per-triangle tangent frames onto their vertices.
///
/// Triangles whose UVs are degenerate contribute nothing. Accumulated
/// vectors are normalized; vertices touched by no valid triangle keep zero.
pub fn compute_tangents(positions: &[Vec3], uvs: &[Vec2], indices: &[u32]) -> (Vec<Vec3>, Vec<Vec3>) {
    let mut tangents = vec![Vec3::ZERO; positions.len()];
    let mut bitangents = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];

        let delta_pos1 = positions[i1] - positions[i0];
        let delta_pos2 = positions[i2] - positions[i0];
        let delta_uv1 = uvs[i1] - uvs[i0];
        let delta_uv2 = uvs[i2] - uvs[i0];

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for v in tangents.iter_mut().chain(bitangents.iter_mut()) {
        *v = v.normalize_or_zero();
    }

    (tangents, bitangents)
}
