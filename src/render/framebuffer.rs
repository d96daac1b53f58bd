//! Color/depth buffers and double buffering
//!
//! The color buffer layout is fixed for bit-exact presentation: 4 bytes per
//! pixel in R,G,B,A order, rows top-to-bottom, no padding. The depth buffer
//! is one float per pixel with 1.0 meaning farthest.

use crate::assets::AssetError;
use crate::render::color::Color;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Destination for a finished frame
///
/// Implemented by whatever owns a platform surface: a window blitter, a
/// pixel-buffer upload, a file writer. The pipeline only ever hands it the
/// front color buffer bytes.
pub trait PresentTarget {
    /// Copy a top-down RGBA8 image to the target surface
    fn blit(&mut self, width: u32, height: u32, pixels: &[u8]);
}

/// 8-bit RGBA color buffer with top-left origin
#[derive(Debug, Clone)]
pub struct ColorBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorBuffer {
    /// Create a buffer cleared to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw bytes, 4 per pixel, rows top-to-bottom
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fill every pixel with a color, quantized to 8 bits per channel
    pub fn clear(&mut self, color: Color) {
        let c = color.clamped();
        let pixel = [
            (c.r * 255.0) as u8,
            (c.g * 255.0) as u8,
            (c.b * 255.0) as u8,
            (c.a * 255.0) as u8,
        ];
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    /// Write one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let c = color.clamped();
        let index = ((y * self.width + x) * 4) as usize;
        self.data[index] = (c.r * 255.0) as u8;
        self.data[index + 1] = (c.g * 255.0) as u8;
        self.data[index + 2] = (c.b * 255.0) as u8;
        self.data[index + 3] = (c.a * 255.0) as u8;
    }

    /// Read one pixel back as a float color; out-of-range reads are black
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::new(0.0, 0.0, 0.0, 0.0);
        }
        let index = ((y * self.width + x) * 4) as usize;
        Color::new(
            self.data[index] as f32 / 255.0,
            self.data[index + 1] as f32 / 255.0,
            self.data[index + 2] as f32 / 255.0,
            self.data[index + 3] as f32 / 255.0,
        )
    }

    /// Encode the buffer contents as a JPEG file, quality 1-100
    pub fn save_to_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<(), AssetError> {
        if self.data.is_empty() {
            return Err(AssetError::InvalidData(
                "cannot encode an empty color buffer".to_string(),
            ));
        }

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for chunk in self.data.chunks_exact(4) {
            rgb.extend_from_slice(&chunk[..3]);
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
        Ok(())
    }
}

/// Float depth buffer; 1.0 is farthest
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthBuffer {
    /// Create a buffer filled with the far value 1.0
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![1.0; (width as usize) * (height as usize)],
        }
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill every sample with a depth, clamped to [0, 1]
    pub fn clear(&mut self, depth: f32) {
        let depth = depth.clamp(0.0, 1.0);
        self.data.fill(depth);
    }

    /// Write one depth sample, clamped to [0, 1]; out-of-range writes are ignored
    pub fn set_depth(&mut self, x: u32, y: u32, depth: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[(y * self.width + x) as usize] = depth.clamp(0.0, 1.0);
    }

    /// Read one depth sample; out-of-range reads return the far value
    pub fn get_depth(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 1.0;
        }
        self.data[(y * self.width + x) as usize]
    }
}

/// A color buffer and depth buffer sharing the same dimensions
#[derive(Debug, Clone)]
pub struct Framebuffer {
    /// Color attachment
    pub color: ColorBuffer,
    /// Depth attachment
    pub depth: DepthBuffer,
}

impl Framebuffer {
    /// Create a framebuffer pair of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: ColorBuffer::new(width, height),
            depth: DepthBuffer::new(width, height),
        }
    }

    /// Width shared by both attachments
    pub fn width(&self) -> u32 {
        self.color.width()
    }

    /// Height shared by both attachments
    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Clear color and depth together
    pub fn clear(&mut self, color: Color, depth: f32) {
        self.color.clear(color);
        self.depth.clear(depth);
    }
}

/// Double-buffered framebuffer pair
///
/// An explicit value owned by the renderer. The back buffer is drawn into;
/// `swap` exchanges the two identities wholesale, keeping colors, depths,
/// and dimensions in lockstep.
#[derive(Debug)]
pub struct BufferManager {
    front: Framebuffer,
    back: Framebuffer,
    background: Color,
}

impl BufferManager {
    /// Create both framebuffers, cleared to the default black background
    pub fn new(width: u32, height: u32) -> Self {
        let background = Color::BLACK;
        let mut manager = Self {
            front: Framebuffer::new(width, height),
            back: Framebuffer::new(width, height),
            background,
        };
        manager.front.clear(background, 1.0);
        manager.back.clear(background, 1.0);
        manager
    }

    /// The color used when the back buffer is acquired
    pub fn background_color(&self) -> Color {
        self.background
    }

    /// Set the background color for subsequent acquisitions
    pub fn set_background_color(&mut self, color: Color) {
        self.background = color;
    }

    /// Clear the back buffer to (background, far) and hand it out for drawing
    pub fn acquire_back(&mut self) -> &mut Framebuffer {
        self.back.clear(self.background, 1.0);
        &mut self.back
    }

    /// The back buffer without clearing, for continued drawing within a frame
    pub fn back_mut(&mut self) -> &mut Framebuffer {
        &mut self.back
    }

    /// Read-only view of the back buffer
    pub fn back(&self) -> &Framebuffer {
        &self.back
    }

    /// Read-only view of the front buffer
    pub fn front(&self) -> &Framebuffer {
        &self.front
    }

    /// Exchange the front and back buffer identities
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Blit the front color buffer to an external target
    pub fn present(&self, target: &mut dyn PresentTarget) {
        target.blit(
            self.front.width(),
            self.front.height(),
            self.front.color.data(),
        );
    }
}
