//! The two per-frame render passes.

pub mod forward;
pub mod shadow;

pub use forward::{DrawUniforms, ForwardFrame, ForwardPass};
pub use shadow::{ShadowDrawUniforms, ShadowPass, ShadowState, light_space_matrix};
