//! Scene light aggregation into the lighting uniform buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use kiln_core::{LightComponent, LightType};

use crate::backend::{BufferHandle, GpuBackend};
use crate::constants::lighting::{DIRECTIONAL_DISTANCE, MAX_LIGHTS, NO_SHADOW_LIGHT};
use crate::error::RenderResult;

/// One packed light record (64 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = position (synthesized for directional lights), w = 1
    pub position: [f32; 4],
    /// xyz = direction towards the light, w = 0
    pub direction: [f32; 4],
    /// rgb = color
    pub color: [f32; 4],
    /// x = power, y = type tag (0 point, 1 directional)
    pub power_type: [f32; 4],
}

impl GpuLight {
    pub fn from_component(light: &LightComponent) -> Self {
        let position = match light.kind {
            LightType::Directional => -light.direction * DIRECTIONAL_DISTANCE,
            LightType::Point => light.position,
        };
        let towards = -light.direction;

        Self {
            position: position.extend(1.0).to_array(),
            direction: towards.extend(0.0).to_array(),
            color: light.color.extend(0.0).to_array(),
            power_type: [light.power, light.kind.tag() as f32, 0.0, 0.0],
        }
    }
}

/// Fixed-capacity lighting buffer contents (640 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Result of packing one frame's lights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightingFrame {
    /// Valid records written this frame
    pub active_lights: u32,
    /// Lights skipped because the buffer was full
    pub dropped_lights: u32,
    /// Direction of the first directional light, if any
    pub shadow_direction: Option<Vec3>,
    /// Buffer slot of the shadow light; `None` when it was dropped
    pub shadow_light: Option<u32>,
}

impl LightingFrame {
    /// Shadow light slot as written into the draw uniforms.
    pub fn shadow_light_slot(&self) -> u32 {
        self.shadow_light.unwrap_or(NO_SHADOW_LIGHT)
    }
}

/// Packs lights in iteration order, truncating at capacity.
///
/// The shadow light is chosen over all lights, including those past
/// capacity. Only a packed shadow light gets a slot in the frame.
pub fn pack_lights<'a>(
    lights: impl IntoIterator<Item = &'a LightComponent>,
) -> (LightsUniform, LightingFrame) {
    let mut uniform = LightsUniform::default();
    let mut frame = LightingFrame::default();

    for light in lights {
        let slot = frame.active_lights as usize;
        if frame.shadow_direction.is_none() && light.is_directional() {
            frame.shadow_direction = Some(light.direction);
            frame.shadow_light = (slot < MAX_LIGHTS).then_some(slot as u32);
        }

        if slot < MAX_LIGHTS {
            uniform.lights[slot] = GpuLight::from_component(light);
            frame.active_lights += 1;
        } else {
            frame.dropped_lights += 1;
        }
    }

    (uniform, frame)
}

/// Owns the lighting uniform buffer and rewrites it every frame.
#[derive(Debug, Default)]
pub struct LightingAggregator {
    buffer: BufferHandle,
    active_lights: u32,
}

impl LightingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        self.buffer = backend.create_uniform_buffer(
            "Lights Uniform Buffer",
            std::mem::size_of::<LightsUniform>() as u64,
        )?;
        Ok(())
    }

    /// Overwrites the whole buffer with this frame's lights.
    pub fn update<'a, B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        lights: impl IntoIterator<Item = &'a LightComponent>,
    ) -> LightingFrame {
        let (uniform, frame) = pack_lights(lights);
        backend.write_uniform_buffer(self.buffer, bytemuck::bytes_of(&uniform));
        self.active_lights = frame.active_lights;

        if frame.dropped_lights > 0 {
            tracing::trace!(
                "Lighting buffer full, dropped {} lights",
                frame.dropped_lights
            );
        }
        frame
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Number of valid records written by the last update.
    pub fn active_lights(&self) -> u32 {
        self.active_lights
    }

    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        backend.destroy_uniform_buffer(self.buffer);
        self.buffer = BufferHandle::NULL;
        self.active_lights = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use approx::assert_abs_diff_eq;

    fn point(power: f32) -> LightComponent {
        LightComponent::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, power)
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 64);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 640);
    }

    #[test]
    fn test_active_count_is_min_of_lights_and_capacity() {
        for n in [0usize, 1, 9, 10, 11, 25] {
            let lights: Vec<LightComponent> = (0..n).map(|i| point(i as f32)).collect();
            let (_, frame) = pack_lights(&lights);
            assert_eq!(frame.active_lights as usize, n.min(MAX_LIGHTS), "n = {n}");
            assert_eq!(frame.dropped_lights as usize, n.saturating_sub(MAX_LIGHTS));
        }
    }

    #[test]
    fn test_directional_position_is_synthesized() {
        let d = Vec3::new(0.3, -0.8, 0.2);
        let (uniform, _) = pack_lights(&[LightComponent::directional(d, Vec3::ONE, 1.0)]);
        let record = uniform.lights[0];

        let expected = -d * 1000.0;
        assert_abs_diff_eq!(record.position[0], expected.x, epsilon = 1e-4);
        assert_abs_diff_eq!(record.position[1], expected.y, epsilon = 1e-4);
        assert_abs_diff_eq!(record.position[2], expected.z, epsilon = 1e-4);
        assert_eq!(record.position[3], 1.0);
        assert_eq!(record.direction, [-d.x, -d.y, -d.z, 0.0]);
        assert_eq!(record.power_type[1], 1.0);
    }

    #[test]
    fn test_point_light_keeps_position_and_order() {
        let (uniform, _) = pack_lights(&[point(5.0), point(7.0)]);
        assert_eq!(uniform.lights[0].position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.lights[0].power_type, [5.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.lights[1].power_type[0], 7.0);
        assert_eq!(uniform.lights[2], GpuLight::default());
    }

    #[test]
    fn test_shadow_light_is_first_directional_even_past_capacity() {
        let mut lights: Vec<LightComponent> = (0..MAX_LIGHTS).map(|_| point(1.0)).collect();
        lights.push(LightComponent::directional(Vec3::NEG_X, Vec3::ONE, 1.0));
        lights.push(LightComponent::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));

        let (_, frame) = pack_lights(&lights);
        assert_eq!(frame.shadow_direction, Some(Vec3::NEG_X));
        assert_eq!(frame.shadow_light, None);
        assert_eq!(frame.shadow_light_slot(), NO_SHADOW_LIGHT);
        assert_eq!(frame.active_lights as usize, MAX_LIGHTS);
    }

    #[test]
    fn test_shadow_light_slot_is_first_directional() {
        let lights = [
            point(1.0),
            LightComponent::directional(Vec3::NEG_Y, Vec3::ONE, 1.0),
            point(2.0),
            LightComponent::directional(Vec3::NEG_X, Vec3::ONE, 1.0),
        ];
        let (uniform, frame) = pack_lights(&lights);
        assert_eq!(frame.shadow_light, Some(1));
        assert_eq!(frame.shadow_light_slot(), 1);
        assert_eq!(uniform.lights[1].power_type[1], 1.0);
        assert_eq!(uniform.lights[3].power_type[1], 1.0);

        let (_, frame) = pack_lights(&[point(1.0)]);
        assert_eq!(frame.shadow_light, None);
        assert_eq!(frame.shadow_direction, None);
    }

    #[test]
    fn test_update_rewrites_buffer() {
        let mut backend = RecordingBackend::new();
        let mut aggregator = LightingAggregator::new();
        aggregator.create(&mut backend).unwrap();

        aggregator.update(&mut backend, &[point(2.0), point(3.0)]);
        let frame = aggregator.update(&mut backend, &[point(4.0)]);

        assert_eq!(frame.active_lights, 1);
        assert_eq!(aggregator.active_lights(), 1);
        let written: LightsUniform = backend.buffer_contents(aggregator.buffer());
        assert_eq!(written.lights[0].power_type[0], 4.0);
        assert_eq!(written.lights[1], GpuLight::default());
    }
}
