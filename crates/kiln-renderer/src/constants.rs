//! Fixed rendering constants.

/// Shadow map settings
pub mod shadow {
    /// Shadow map resolution (square)
    pub const MAP_SIZE: u32 = 2048;
    /// Half-size of the orthographic shadow volume in world units
    pub const HALF_EXTENT: f32 = 10.0;
    /// Distance of the virtual shadow camera from the origin
    pub const DISTANCE: f32 = 20.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 2.0 * DISTANCE;
    /// Depth format of the shadow map
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Constant depth bias applied while rendering the shadow map
    pub const DEPTH_BIAS_CONSTANT: i32 = 2;
    pub const DEPTH_BIAS_SLOPE: f32 = 2.0;
}

/// Lighting buffer settings
pub mod lighting {
    /// Capacity of the lighting uniform buffer
    pub const MAX_LIGHTS: usize = 10;
    /// Distance at which directional lights are placed along their inverse direction
    pub const DIRECTIONAL_DISTANCE: f32 = 1000.0;
    /// Shadow light slot written when no packed light casts the shadow
    pub const NO_SHADOW_LIGHT: u32 = u32::MAX;
}

/// Output framebuffer settings
pub mod output {
    pub const DEFAULT_WIDTH: u32 = 1920;
    pub const DEFAULT_HEIGHT: u32 = 1080;
    /// Largest output dimension when the output follows the viewport
    pub const MAX_DIMENSION: u32 = 4096;
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
}

/// Engine default textures (1x1 RGB)
pub mod textures {
    /// Flat light gray
    pub const DEFAULT_ALBEDO: [u8; 3] = [245, 245, 245];
    /// Tangent-space +Z
    pub const DEFAULT_NORMAL: [u8; 3] = [128, 128, 255];
    pub const DEFAULT_SPECULAR: [u8; 3] = [255, 255, 255];
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
}

/// Binding points shared by the passes and the shaders
pub mod bindings {
    /// Uniform binding of the lighting buffer
    pub const LIGHTS: u32 = 0;
    pub const ALBEDO_SLOT: u32 = 0;
    pub const NORMAL_SLOT: u32 = 1;
    pub const SPECULAR_SLOT: u32 = 2;
    /// Number of material texture slots
    pub const MATERIAL_SLOTS: usize = 3;
    /// Size reserved for one draw's uniforms in the dynamic uniform buffer
    pub const DRAW_UNIFORM_SLOT: u64 = 512;
}
