//! Point-light parameters for the lit shaders

use crate::foundation::math::Vec3;
use crate::render::color::Color;

/// A single point light in world space
#[derive(Debug, Clone)]
pub struct LightParams {
    /// Light position
    pub position: Vec3,
    /// Ambient contribution
    pub ambient: Color,
    /// Diffuse contribution
    pub diffuse: Color,
    /// Specular contribution
    pub specular: Color,
    /// Overall intensity multiplier
    pub intensity: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 10.0),
            ambient: Color::new(0.1, 0.1, 0.1, 1.0),
            diffuse: Color::new(0.7, 0.7, 0.7, 1.0),
            specular: Color::WHITE,
            intensity: 1.0,
        }
    }
}

impl LightParams {
    /// Create a light at a position with default colors
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    /// Set the ambient color
    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    /// Set the diffuse color
    pub fn with_diffuse(mut self, diffuse: Color) -> Self {
        self.diffuse = diffuse;
        self
    }

    /// Set the specular color
    pub fn with_specular(mut self, specular: Color) -> Self {
        self.specular = specular;
        self
    }

    /// Set the intensity multiplier
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// A warm key light placed up and to the side
    pub fn warm_key() -> Self {
        Self::at(Vec3::new(4.0, 8.0, 6.0))
            .with_ambient(Color::new(0.15, 0.12, 0.1, 1.0))
            .with_diffuse(Color::new(0.9, 0.85, 0.7, 1.0))
    }
}
