//! Scene objects: material, transform, and mesh bundles

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::color::Color;
use crate::render::mesh::Mesh;

/// Surface material parameters for the lit shaders
#[derive(Debug, Clone)]
pub struct Material {
    /// Ambient reflectance
    pub ambient: Color,
    /// Diffuse reflectance
    pub diffuse: Color,
    /// Specular reflectance
    pub specular: Color,
    /// Specular exponent
    pub shininess: f32,
    /// Opacity in [0, 1]
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Color::WHITE,
            diffuse: Color::WHITE,
            specular: Color::WHITE,
            shininess: 32.0,
            opacity: 1.0,
        }
    }
}

/// Position, Euler rotation (degrees), and scale
///
/// The model matrix composes as `T * Rz * Ry * Rx * S`; each rotation is
/// right-handed around its axis.
#[derive(Debug, Clone)]
pub struct Transformer {
    /// World-space position
    pub position: Vec3,
    /// Euler rotation in degrees
    pub rotation: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transformer {
    /// Identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose the model matrix from this transform
    pub fn model_matrix(&self) -> Mat4 {
        let scale = Mat4::scale(self.scale);
        let rot_x = Mat4::rotation_x(self.rotation.x);
        let rot_y = Mat4::rotation_y(self.rotation.y);
        let rot_z = Mat4::rotation_z(self.rotation.z);
        let translation = Mat4::translate(self.position);

        translation * rot_z * rot_y * rot_x * scale
    }

    /// Move by a world-space offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Add to the Euler rotation, in degrees
    pub fn rotate(&mut self, degrees: Vec3) {
        self.rotation += degrees;
    }

    /// Multiply the scale component-wise
    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
    }
}

/// A mesh with its material and transform
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Geometry
    pub mesh: Mesh,
    /// Surface material
    pub material: Material,
    /// Placement in the world
    pub transform: Transformer,
}

impl Object {
    /// Create an object from its parts
    pub fn new(mesh: Mesh, material: Material, transform: Transformer) -> Self {
        Self { mesh, material, transform }
    }

    /// Create an object from a mesh with default material and transform
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self { mesh, ..Default::default() }
    }

    /// The object's model matrix
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.model_matrix()
    }

    /// Mesh center transformed into world space
    pub fn world_center(&self) -> Vec3 {
        let center = self.mesh.center();
        (self.model_matrix() * Vec4::from_vec3(center, 1.0)).xyz()
    }

    /// Bounding sphere in world space
    ///
    /// The radius scales by the largest axis scale.
    pub fn world_bounding_sphere(&self) -> (Vec3, f32) {
        let (center, radius) = self.mesh.bounding_sphere();
        let world_center = (self.model_matrix() * Vec4::from_vec3(center, 1.0)).xyz();
        let s = self.transform.scale;
        let max_scale = s.x.max(s.y).max(s.z);
        (world_center, radius * max_scale)
    }
}
