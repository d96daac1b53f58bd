//! Texture storage, sampling, and the mipmap pyramid
//!
//! A texture owns a grid of linear [`Color`] values plus an optional chain of
//! successively halved, box-filtered levels. Sampling supports repeat, clamp,
//! and mirror wrapping; nearest, bilinear, and trilinear filtering; and
//! derivative-driven LOD selection for the trilinear path.

use crate::assets::image_loader::ImageData;
use crate::assets::AssetError;
use crate::foundation::math::clamp;
use crate::render::color::Color;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Nearest-neighbor point sampling
    Nearest,
    /// 2x2 weighted average at pixel centers
    Bilinear,
    /// Bilinear at two mipmap levels, blended by fractional LOD
    Trilinear,
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    /// Use the fractional part of the coordinate
    Repeat,
    /// Clamp the coordinate to [0, 1]
    Clamp,
    /// Reflect alternating tiles
    Mirror,
}

/// A 2D image of linear colors with filtering, wrapping, and mipmaps
///
/// Mipmap levels are owned by their parent; level k+1 is the unweighted 2x2
/// mean of level k with dimensions `max(1, parent/2)`, and the chain ends at
/// 1x1. An empty texture (zero dimensions) samples as black.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<Color>,
    filter_mode: FilterMode,
    wrap_mode: WrapMode,
    mipmaps: Vec<Texture>,
}

impl Texture {
    /// Create a texture filled with black
    ///
    /// Zero dimensions produce an empty texture that samples as black.
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            data: vec![Color::BLACK; pixel_count],
            filter_mode: FilterMode::Bilinear,
            wrap_mode: WrapMode::Repeat,
            mipmaps: Vec::new(),
        }
    }

    /// Build a texture from decoded image data
    pub fn from_image(image: &ImageData) -> Self {
        let mut texture = Texture::new(image.width, image.height);
        for y in 0..image.height {
            for x in 0..image.width {
                let index = ((y * image.width + x) * 4) as usize;
                let color = Color::new(
                    image.data[index] as f32 / 255.0,
                    image.data[index + 1] as f32 / 255.0,
                    image.data[index + 2] as f32 / 255.0,
                    image.data[index + 3] as f32 / 255.0,
                );
                texture.set_pixel(x, y, color);
            }
        }
        texture
    }

    /// Load a texture from an image file on disk
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let image = ImageData::from_file(path)?;
        Ok(Self::from_image(&image))
    }

    /// Texture width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the texture has no pixel storage
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of pyramid levels including the base image
    pub fn level_count(&self) -> usize {
        1 + self.mipmaps.len()
    }

    /// Mipmap level below the base image, if generated
    pub fn mipmap(&self, level: usize) -> Option<&Texture> {
        self.mipmaps.get(level)
    }

    /// Set the filtering mode
    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
    }

    /// Set the wrapping mode
    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.wrap_mode = mode;
    }

    /// Write a pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[(y * self.width + x) as usize] = color;
    }

    /// Read a pixel with clamped coordinates; empty textures return black
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        if self.data.is_empty() {
            return Color::BLACK;
        }
        let x = (x.max(0) as u32).min(self.width - 1);
        let y = (y.max(0) as u32).min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }

    /// Apply the wrap mode to a pair of continuous coordinates
    fn wrap_coordinates(&self, u: f32, v: f32) -> (f32, f32) {
        match self.wrap_mode {
            WrapMode::Repeat => (u - u.floor(), v - v.floor()),
            WrapMode::Clamp => (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
            WrapMode::Mirror => {
                let mut u = u - u.floor();
                let mut v = v - v.floor();
                if ((u + 0.5).floor() as i32) % 2 == 1 {
                    u = 1.0 - u;
                }
                if ((v + 0.5).floor() as i32) % 2 == 1 {
                    v = 1.0 - v;
                }
                (u, v)
            }
        }
    }

    /// Nearest-neighbor sample
    pub fn sample_nearest(&self, u: f32, v: f32) -> Color {
        let (u, v) = self.wrap_coordinates(u, v);
        let x = (u * self.width as f32).floor() as i32;
        let y = (v * self.height as f32).floor() as i32;
        self.get_pixel(x, y)
    }

    /// Bilinear sample at pixel centers
    ///
    /// The 2x2 neighborhood around `(u*W - 0.5, v*H - 0.5)` is fetched with
    /// clamped integer coordinates; wrapping has already normalized (u, v).
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        let (u, v) = self.wrap_coordinates(u, v);

        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;

        let x0 = fx.floor() as i32;
        let y0 = fy.floor() as i32;
        let x1 = x0 + 1;
        let y1 = y0 + 1;

        let wx1 = fx - x0 as f32;
        let wy1 = fy - y0 as f32;
        let wx0 = 1.0 - wx1;
        let wy0 = 1.0 - wy1;

        let c00 = self.get_pixel(x0, y0);
        let c10 = self.get_pixel(x1, y0);
        let c01 = self.get_pixel(x0, y1);
        let c11 = self.get_pixel(x1, y1);

        c00 * (wx0 * wy0) + c10 * (wx1 * wy0) + c01 * (wx0 * wy1) + c11 * (wx1 * wy1)
    }

    /// Sample without derivative information
    ///
    /// Trilinear mode degrades to bilinear at the base level.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.data.is_empty() {
            return Color::BLACK;
        }
        match self.filter_mode {
            FilterMode::Nearest => self.sample_nearest(u, v),
            FilterMode::Bilinear | FilterMode::Trilinear => self.sample_bilinear(u, v),
        }
    }

    /// Sample with screen-space UV derivatives, enabling mipmap selection
    pub fn sample_with_derivatives(&self, u: f32, v: f32, dudx: f32, dvdy: f32) -> Color {
        if self.data.is_empty() {
            return Color::BLACK;
        }
        if self.filter_mode == FilterMode::Trilinear && !self.mipmaps.is_empty() {
            let level = self.mipmap_level(dudx, dvdy);
            return self.sample_trilinear(u, v, level);
        }
        self.sample(u, v)
    }

    /// Continuous LOD from scalar UV derivatives in normalized units
    fn mipmap_level(&self, dudx: f32, dvdy: f32) -> f32 {
        let dx = dudx * self.width as f32;
        let dy = dvdy * self.height as f32;
        let rho = dx.abs().max(dy.abs());
        let level = rho.log2();
        clamp(level, 0.0, self.mipmaps.len() as f32)
    }

    /// Bilinear samples at the two nearest levels, blended by fractional LOD
    fn sample_trilinear(&self, u: f32, v: f32, level: f32) -> Color {
        if level <= 0.0 {
            return self.sample_bilinear(u, v);
        }

        let level0 = level.floor() as usize;
        let level1 = level0 + 1;
        let factor = level - level0 as f32;

        let color0 = if level0 == 0 {
            self.sample_bilinear(u, v)
        } else if level0 <= self.mipmaps.len() {
            self.mipmaps[level0 - 1].sample_bilinear(u, v)
        } else {
            self.mipmaps[self.mipmaps.len() - 1].sample_bilinear(u, v)
        };

        let color1 = if level1 <= self.mipmaps.len() {
            self.mipmaps[level1 - 1].sample_bilinear(u, v)
        } else {
            self.mipmaps[self.mipmaps.len() - 1].sample_bilinear(u, v)
        };

        Color::lerp(color0, color1, factor)
    }

    /// Rebuild the mipmap chain down to 1x1
    ///
    /// Each level is the unweighted mean of 2x2 blocks of its parent. Must be
    /// called outside a draw; textures are read-only while drawing.
    pub fn generate_mipmaps(&mut self) {
        self.mipmaps.clear();

        if self.data.is_empty() || (self.width <= 1 && self.height <= 1) {
            return;
        }

        let mut current_width = self.width;
        let mut current_height = self.height;

        while current_width > 1 || current_height > 1 {
            let new_width = (current_width / 2).max(1);
            let new_height = (current_height / 2).max(1);

            let mut mip = Texture::new(new_width, new_height);
            mip.filter_mode = self.filter_mode;
            mip.wrap_mode = self.wrap_mode;

            {
                let parent: &Texture = self.mipmaps.last().unwrap_or(self);
                for y in 0..new_height {
                    for x in 0..new_width {
                        let x0 = (x * 2) as i32;
                        let y0 = (y * 2) as i32;

                        let c00 = parent.get_pixel(x0, y0);
                        let c10 = parent.get_pixel(x0 + 1, y0);
                        let c01 = parent.get_pixel(x0, y0 + 1);
                        let c11 = parent.get_pixel(x0 + 1, y0 + 1);

                        mip.data[(y * new_width + x) as usize] = (c00 + c10 + c01 + c11) * 0.25;
                    }
                }
            }

            self.mipmaps.push(mip);
            current_width = new_width;
            current_height = new_height;
        }

        log::debug!(
            "generated {} mipmap levels for {}x{} texture",
            self.mipmaps.len(),
            self.width,
            self.height
        );
    }

    /// Encode the base image as a JPEG file, quality 1-100
    pub fn save_to_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<(), AssetError> {
        if self.data.is_empty() {
            return Err(AssetError::InvalidData(
                "cannot encode an empty texture".to_string(),
            ));
        }

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for color in &self.data {
            let c = color.clamped();
            rgb.push((c.r * 255.0) as u8);
            rgb.push((c.g * 255.0) as u8);
            rgb.push((c.b * 255.0) as u8);
        }

        let file = File::create(path.as_ref()).map_err(|e| {
            AssetError::LoadFailed(format!("failed to create {:?}: {}", path.as_ref(), e))
        })?;
        let writer = BufWriter::new(file);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
        encoder
            .encode(&rgb, self.width, self.height, image::ExtendedColorType::Rgb8)
            .map_err(|e| AssetError::LoadFailed(format!("JPEG encode failed: {}", e)))?;

        log::info!(
            "saved {}x{} texture to {:?}",
            self.width,
            self.height,
            path.as_ref()
        );
        Ok(())
    }

    /// Save the base image and every mipmap level with `_mipN` suffixes
    pub fn save_mipmaps_to_jpeg(&self, base_path: &str, quality: u8) -> Result<(), AssetError> {
        let stem = match base_path.rfind('.') {
            Some(dot) => &base_path[..dot],
            None => base_path,
        };

        self.save_to_jpeg(format!("{}_mip0.jpg", stem), quality)?;
        for (i, mip) in self.mipmaps.iter().enumerate() {
            mip.save_to_jpeg(format!("{}_mip{}.jpg", stem, i + 1), quality)?;
        }
        Ok(())
    }

    /// Procedural checkerboard of two colors
    pub fn checkerboard(
        width: u32,
        height: u32,
        check_size: u32,
        color1: Color,
        color2: Color,
    ) -> Self {
        let mut texture = Texture::new(width, height);
        let check_size = check_size.max(1);
        for y in 0..height {
            for x in 0..width {
                let even_x = (x / check_size) % 2 == 0;
                let even_y = (y / check_size) % 2 == 0;
                texture.set_pixel(x, y, if even_x ^ even_y { color1 } else { color2 });
            }
        }
        texture
    }

    /// Procedural linear gradient, horizontal or vertical
    pub fn gradient(width: u32, height: u32, start: Color, end: Color, horizontal: bool) -> Self {
        let mut texture = Texture::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let t = if horizontal {
                    x as f32 / (width.max(2) - 1) as f32
                } else {
                    y as f32 / (height.max(2) - 1) as f32
                };
                texture.set_pixel(x, y, Color::lerp(start, end, t));
            }
        }
        texture
    }

    /// Procedural filled circle on a background
    pub fn circle(size: u32, circle_color: Color, background: Color) -> Self {
        let mut texture = Texture::new(size, size);
        let radius = size as f32 * 0.5;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - radius;
                let dy = y as f32 - radius;
                let inside = (dx * dx + dy * dy).sqrt() <= radius;
                texture.set_pixel(x, y, if inside { circle_color } else { background });
            }
        }
        texture
    }
}
