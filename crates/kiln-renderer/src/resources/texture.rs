//! Texture upload helpers and engine default textures.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use kiln_core::Image;

use crate::backend::{GpuBackend, TextureDesc};
use crate::constants::textures;
use crate::error::{RenderError, RenderResult};
use crate::resources::Texture;

/// Number of mip levels for a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Converts 1-4 channel pixels to RGBA8.
///
/// One channel is treated as gray, two as gray plus alpha. Missing alpha is
/// opaque. `None` when the pixel buffer does not match the dimensions.
pub fn expand_to_rgba(image: &Image) -> Option<RgbaImage> {
    let (width, height) = (image.width(), image.height());
    let pixels = image.pixels().to_vec();
    let decoded = match image.channels() {
        1 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(width, height, pixels).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        4 => return RgbaImage::from_raw(width, height, pixels),
        _ => None,
    }?;
    Some(decoded.to_rgba8())
}

/// Builds a full mip chain down to 1x1, each level filtered from the one
/// above it.
pub fn mip_chain(base: RgbaImage) -> Vec<Vec<u8>> {
    let count = mip_level_count(base.width(), base.height()) as usize;
    let mut levels = Vec::with_capacity(count);
    let mut current = base;

    while levels.len() + 1 < count {
        let width = (current.width() / 2).max(1);
        let height = (current.height() / 2).max(1);
        let next = imageops::resize(&current, width, height, FilterType::Triangle);
        levels.push(current.into_raw());
        current = next;
    }
    levels.push(current.into_raw());

    levels
}

/// Uploads an image with its full mip chain.
pub fn upload_image<B: GpuBackend + ?Sized>(
    backend: &mut B,
    label: &str,
    image: &Image,
) -> RenderResult<Texture> {
    let base = expand_to_rgba(image).ok_or_else(|| {
        RenderError::TextureCreation(format!(
            "{label}: {} bytes do not fit {}x{}x{}",
            image.pixels().len(),
            image.width(),
            image.height(),
            image.channels()
        ))
    })?;
    let levels = mip_chain(base);
    let desc = TextureDesc {
        label,
        width: image.width(),
        height: image.height(),
        mip_levels: levels.len() as u32,
    };
    let handle = backend.create_texture(&desc, &levels)?;

    Ok(Texture {
        handle,
        width: desc.width,
        height: desc.height,
        levels: desc.mip_levels,
    })
}

/// Fallback textures bound when a material leaves a slot empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextures {
    pub albedo: Texture,
    pub normal: Texture,
    pub specular: Texture,
}

impl DefaultTextures {
    /// Creates the three defaults. On failure, already created ones are
    /// kept in `self` so the caller's cleanup releases them.
    pub fn create<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) -> RenderResult<()> {
        self.albedo = upload_image(
            backend,
            "Default Albedo",
            &Image::solid_rgb(textures::DEFAULT_ALBEDO),
        )?;
        self.normal = upload_image(
            backend,
            "Default Normal",
            &Image::solid_rgb(textures::DEFAULT_NORMAL),
        )?;
        self.specular = upload_image(
            backend,
            "Default Specular",
            &Image::solid_rgb(textures::DEFAULT_SPECULAR),
        )?;
        Ok(())
    }

    /// Textures in binding order: albedo, normal, specular.
    pub fn slots(&self) -> [Texture; 3] {
        [self.albedo, self.normal, self.specular]
    }

    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        self.albedo.destroy(backend);
        self.normal.destroy(backend);
        self.specular.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
        assert_eq!(mip_level_count(1, 5), 3);
    }

    #[test]
    fn test_expand_rgb_and_gray() {
        let rgb = Image::new(vec![1, 2, 3], 1, 1, 3).unwrap();
        assert_eq!(expand_to_rgba(&rgb).unwrap().into_raw(), vec![1, 2, 3, 255]);

        let gray_alpha = Image::new(vec![9, 100], 1, 1, 2).unwrap();
        assert_eq!(expand_to_rgba(&gray_alpha).unwrap().into_raw(), vec![9, 9, 9, 100]);

        let gray = Image::new(vec![7, 8], 2, 1, 1).unwrap();
        let rgba = expand_to_rgba(&gray).unwrap();
        assert_eq!(rgba.dimensions(), (2, 1));
        assert_eq!(rgba.into_raw(), vec![7, 7, 7, 255, 8, 8, 8, 255]);
    }

    #[test]
    fn test_mip_chain_averages() {
        // 2x2: black, white / white, black -> mid gray
        let base = RgbaImage::from_raw(
            2,
            2,
            vec![
                0, 0, 0, 255, 255, 255, 255, 255, //
                255, 255, 255, 255, 0, 0, 0, 255,
            ],
        )
        .unwrap();
        let levels = mip_chain(base);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].len(), 4);
        assert!(levels[1][..3].iter().all(|c| (127..=128).contains(c)));
        assert_eq!(levels[1][3], 255);
    }

    #[test]
    fn test_mip_chain_odd_sizes() {
        let base = RgbaImage::from_raw(3, 5, vec![10; 3 * 5 * 4]).unwrap();
        let levels = mip_chain(base);
        let sizes: Vec<usize> = levels.iter().map(Vec::len).collect();
        // 3x5 -> 1x2 -> 1x1
        assert_eq!(sizes, vec![60, 8, 4]);
        assert!(levels.iter().flatten().all(|&b| b == 10));
    }

    #[test]
    fn test_single_pixel_has_one_level() {
        let levels = mip_chain(expand_to_rgba(&Image::solid_rgb([1, 2, 3])).unwrap());
        assert_eq!(levels, vec![vec![1, 2, 3, 255]]);
    }
}
