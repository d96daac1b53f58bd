//! Image loading for texture data
//!
//! Decodes PNG, JPEG, BMP, and the other formats the `image` crate supports
//! into raw RGBA8 pixels ready for conversion into a texture's color grid.

use crate::assets::AssetError;
use std::path::Path;

/// Decoded image pixels in RGBA8 layout
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw pixel bytes, 4 per pixel, rows top-to-bottom
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode an image file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        log::debug!("loading image from {:?}", path);

        let decoded = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("failed to load {:?}: {}", path, e)))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("loaded {}x{} image from {:?}", width, height, path);
        Ok(Self { data: rgba.into_raw(), width, height })
    }

    /// Decode an image already held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("failed to decode image: {}", e)))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self { data: rgba.into_raw(), width, height })
    }

    /// A single-color image, handy for tests and placeholder textures
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self { data, width, height }
    }

    /// Total pixel byte count
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
