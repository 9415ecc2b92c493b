//! Directional shadow map pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use kiln_core::Scene;

use crate::backend::{ClearOps, FrameBufferKind, GpuBackend, ProgramDesc, ProgramKind};
use crate::constants::shadow;
use crate::error::RenderResult;
use crate::resources::{FrameBuffer, ResourceCache, ShaderProgram};

const SHADER: &str = include_str!("../../shaders/shadow.wgsl");

/// Per-draw uniforms of the depth-only program (128 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowDrawUniforms {
    pub light_space: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowState {
    /// No directional light this frame; nothing was drawn.
    #[default]
    Idle,
    /// The shadow map was rendered this frame.
    Rendering,
}

/// Light-space transform for a directional light.
///
/// Orthographic volume of fixed half-extent around the origin, viewed from
/// `-direction * DISTANCE`. A zero direction is treated as straight down.
pub fn light_space_matrix(direction: Vec3) -> Mat4 {
    let dir = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let eye = -dir * shadow::DISTANCE;
    // look_at needs an up vector that is not parallel to the view direction
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };

    let projection = Mat4::orthographic_rh(
        -shadow::HALF_EXTENT,
        shadow::HALF_EXTENT,
        -shadow::HALF_EXTENT,
        shadow::HALF_EXTENT,
        shadow::NEAR,
        shadow::FAR,
    );
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
    projection * view
}

/// Renders shadow casters into a depth-only framebuffer.
#[derive(Debug)]
pub struct ShadowPass {
    program: ShaderProgram,
    framebuffer: FrameBuffer,
    light_space: Mat4,
    state: ShadowState,
}

impl Default for ShadowPass {
    fn default() -> Self {
        Self {
            program: ShaderProgram::unset(ProgramKind::DepthOnly),
            framebuffer: FrameBuffer::unset(FrameBufferKind::DepthOnly),
            light_space: Mat4::IDENTITY,
            state: ShadowState::Idle,
        }
    }
}

impl ShadowPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_program<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        self.program.handle = backend.create_program(&ProgramDesc {
            label: "Shadow Depth Program",
            kind: ProgramKind::DepthOnly,
            source: SHADER,
            draw_uniform_size: std::mem::size_of::<ShadowDrawUniforms>() as u64,
        })?;
        Ok(())
    }

    /// Creates the shadow map and clears it so an unlit frame samples as
    /// fully lit.
    pub fn create_target<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        self.framebuffer = backend.create_framebuffer(
            "Shadow Map",
            shadow::MAP_SIZE,
            shadow::MAP_SIZE,
            FrameBufferKind::DepthOnly,
        )?;
        backend.begin_pass(&self.framebuffer, ClearOps::depth());
        backend.end_pass()
    }

    /// Draws every shadow-casting renderable from the light's point of view.
    /// Returns the number of draw calls.
    ///
    /// # Panics
    ///
    /// If a caster's mesh was not uploaded to `cache` beforehand.
    pub fn render<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &Scene,
        cache: &ResourceCache,
        direction: Vec3,
    ) -> RenderResult<u32> {
        self.light_space = light_space_matrix(direction);
        self.state = ShadowState::Rendering;

        backend.begin_pass(&self.framebuffer, ClearOps::depth());
        backend.set_program(self.program.handle);

        let mut draws = 0;
        for renderable in scene.renderables() {
            if !renderable.mesh_renderer.cast_shadows {
                continue;
            }
            let mesh_id = renderable.mesh_renderer.mesh.id();
            let Some(mesh) = cache.mesh(mesh_id) else {
                panic!(
                    "mesh {} of entity {:?} ({}) was not uploaded before the shadow pass",
                    mesh_id,
                    renderable.entity,
                    scene.name(renderable.entity).unwrap_or("unnamed")
                );
            };
            if mesh.index_count == 0 {
                continue;
            }

            let uniforms = ShadowDrawUniforms {
                light_space: self.light_space.to_cols_array_2d(),
                model: renderable.transform.model_matrix().to_cols_array_2d(),
            };
            backend.bind_mesh(mesh.handle);
            backend.set_draw_uniforms(bytemuck::bytes_of(&uniforms));
            backend.draw_indexed(mesh.index_count);
            draws += 1;
        }

        backend.end_pass()?;
        tracing::trace!("Shadow pass: {} draws", draws);
        Ok(draws)
    }

    /// Marks the frame as having no shadow light. The light-space transform
    /// keeps its previous value.
    pub fn skip(&mut self) {
        self.state = ShadowState::Idle;
    }

    pub fn state(&self) -> ShadowState {
        self.state
    }

    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        self.program.destroy(backend);
        backend.destroy_framebuffer(&mut self.framebuffer);
        self.state = ShadowState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<ShadowDrawUniforms>(), 128);
    }

    #[test]
    fn test_origin_maps_to_center_of_shadow_map() {
        let m = light_space_matrix(Vec3::new(0.3, -1.0, 0.2));
        let p = m.project_point3(Vec3::ZERO);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-5);
        // eye sits DISTANCE away along the inverse direction
        let expected = (shadow::DISTANCE - shadow::NEAR) / (shadow::FAR - shadow::NEAR);
        assert_abs_diff_eq!(p.z, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_straight_down_light_is_well_defined() {
        let m = light_space_matrix(Vec3::NEG_Y);
        assert!(m.is_finite());

        // A point nearer the light has a smaller depth.
        let high = m.project_point3(Vec3::new(0.0, 5.0, 0.0));
        let low = m.project_point3(Vec3::new(0.0, -5.0, 0.0));
        assert!(high.z < low.z);
    }

    #[test]
    fn test_extent_covers_half_extent() {
        let m = light_space_matrix(Vec3::NEG_Y);
        let p = m.project_point3(Vec3::new(shadow::HALF_EXTENT, 0.0, 0.0));
        assert_abs_diff_eq!(p.x.abs().max(p.y.abs()), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_direction_falls_back_to_down() {
        assert_eq!(light_space_matrix(Vec3::ZERO), light_space_matrix(Vec3::NEG_Y));
    }
}
