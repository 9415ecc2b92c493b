//! Decoded image data.

use crate::asset::{AssetError, AssetId, AssetResult};

/// Decoded 8-bit image, immutable after creation.
///
/// Pixels are tightly packed rows of `channels` bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    id: AssetId,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl Image {
    /// Creates an image with a freshly generated identity.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u32) -> AssetResult<Self> {
        Self::with_id(AssetId::new(), pixels, width, height, channels)
    }

    /// Creates an image with an explicit identity.
    pub fn with_id(
        id: AssetId,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        channels: u32,
    ) -> AssetResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(AssetError::UnsupportedChannels(channels));
        }
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(AssetError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            id,
            pixels,
            width,
            height,
            channels,
        })
    }

    /// Creates a 1x1 RGB image of a single color.
    pub fn solid_rgb(rgb: [u8; 3]) -> Self {
        Self {
            id: AssetId::new(),
            pixels: rgb.to_vec(),
            width: 1,
            height: 1,
            channels: 3,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Returns true if the image carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }
}
