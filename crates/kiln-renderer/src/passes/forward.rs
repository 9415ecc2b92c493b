//! Lit forward shading pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use kiln_core::{Material, Scene};

use crate::backend::{BufferHandle, ClearOps, GpuBackend, ProgramDesc, ProgramKind, TextureHandle};
use crate::constants::bindings;
use crate::error::RenderResult;
use crate::resources::{DefaultTextures, FrameBuffer, ResourceCache, ShaderProgram};

const SHADER: &str = include_str!("../../shaders/standard.wgsl");

/// Per-draw uniforms of the standard program (368 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Columns of the view-space normal matrix, padded to vec4
    pub normal_matrix: [[f32; 4]; 3],
    pub mvp: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub specular_strength: [f32; 4],
    /// x = shininess, y = opacity
    pub material: [f32; 4],
    /// x = active light count, y = shadow light slot
    pub light_info: [u32; 4],
}

impl DrawUniforms {
    pub fn new(
        model: Mat4,
        view: Mat4,
        projection: Mat4,
        light_space: Mat4,
        material: &Material,
        active_lights: u32,
        shadow_light: u32,
    ) -> Self {
        let model_view = view * model;
        let normal = Mat3::from_mat4(model_view).inverse().transpose();

        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            normal_matrix: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
            mvp: (projection * model_view).to_cols_array_2d(),
            light_space: light_space.to_cols_array_2d(),
            ambient: material.ambient.extend(0.0).to_array(),
            specular_strength: material.specular_strength.extend(0.0).to_array(),
            material: [material.shininess, material.opacity, 0.0, 0.0],
            light_info: [active_lights, shadow_light, 0, 0],
        }
    }
}

/// Inputs produced earlier in the frame.
#[derive(Debug, Clone, Copy)]
pub struct ForwardFrame<'a> {
    pub target: &'a FrameBuffer,
    pub aspect: f32,
    pub clear_color: [f32; 4],
    pub lights: BufferHandle,
    pub active_lights: u32,
    /// Slot of the light the shadow map belongs to
    pub shadow_light: u32,
    pub shadow_map: TextureHandle,
    pub light_space: Mat4,
    pub defaults: &'a DefaultTextures,
}

#[derive(Debug)]
pub struct ForwardPass {
    program: ShaderProgram,
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self {
            program: ShaderProgram::unset(ProgramKind::Standard),
        }
    }
}

impl ForwardPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_program<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        self.program.handle = backend.create_program(&ProgramDesc {
            label: "Standard Program",
            kind: ProgramKind::Standard,
            source: SHADER,
            draw_uniform_size: std::mem::size_of::<DrawUniforms>() as u64,
        })?;
        Ok(())
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Clears the target and draws every renderable that has a material.
    /// Returns the number of draw calls.
    ///
    /// With no active camera the target is only cleared.
    ///
    /// # Panics
    ///
    /// If a renderable's mesh was not uploaded to `cache` beforehand.
    pub fn render<B: GpuBackend + ?Sized>(
        &self,
        backend: &mut B,
        scene: &Scene,
        cache: &ResourceCache,
        frame: &ForwardFrame<'_>,
    ) -> RenderResult<u32> {
        backend.begin_pass(frame.target, ClearOps::color_and_depth(frame.clear_color));

        let Some(camera) = scene.active_camera() else {
            tracing::trace!("No active camera, output cleared only");
            backend.end_pass()?;
            return Ok(0);
        };
        let view = camera.transform.view_matrix();
        let projection = camera.camera.projection_matrix(frame.aspect);

        backend.set_program(self.program.handle);
        backend.bind_uniform_buffer(bindings::LIGHTS, frame.lights);

        let defaults = frame.defaults.slots();
        let mut draws = 0;
        for renderable in scene.renderables() {
            let Some(material) = &renderable.mesh_renderer.material else {
                continue;
            };
            let mesh_id = renderable.mesh_renderer.mesh.id();
            let Some(mesh) = cache.mesh(mesh_id) else {
                panic!(
                    "mesh {} of entity {:?} ({}) was not uploaded before the forward pass",
                    mesh_id,
                    renderable.entity,
                    scene.name(renderable.entity).unwrap_or("unnamed")
                );
            };
            if mesh.index_count == 0 {
                continue;
            }

            backend.bind_mesh(mesh.handle);

            for (slot, (image, fallback)) in material.textures().into_iter().zip(defaults).enumerate() {
                let texture = match image {
                    Some(image) => match cache.texture(image.id()) {
                        Some(texture) => texture.handle,
                        None => {
                            debug_assert!(
                                false,
                                "texture {} was not uploaded before the forward pass",
                                image.id()
                            );
                            fallback.handle
                        }
                    },
                    None => fallback.handle,
                };
                backend.bind_texture(slot as u32, texture);
            }

            let uniforms = DrawUniforms::new(
                renderable.transform.model_matrix(),
                view,
                projection,
                frame.light_space,
                material,
                frame.active_lights,
                frame.shadow_light,
            );
            backend.set_draw_uniforms(bytemuck::bytes_of(&uniforms));
            backend.bind_shadow_map(frame.shadow_map);
            backend.draw_indexed(mesh.index_count);
            draws += 1;
        }

        backend.end_pass()?;
        tracing::trace!("Forward pass: {} draws", draws);
        Ok(draws)
    }

    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        self.program.destroy(backend);
    }
}
