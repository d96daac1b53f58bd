//! Shader contract and built-in shader implementations
//!
//! A shader is a {vertex, fragment} stage pair. The vertex stage must write a
//! clip-space position; whatever else it writes is treated as opaque varying
//! attributes and interpolated by the rasterizer. The fragment stage receives
//! the interpolated attributes plus scalar UV derivatives for mipmap
//! selection, and must be pure with respect to its inputs - shaders never
//! panic, the pipeline has no error path.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::color::Color;
use crate::render::lighting::LightParams;
use crate::render::texture::Texture;

/// Per-vertex input to the vertex stage
#[derive(Debug, Clone)]
pub struct VertexShaderInput {
    /// Object-space homogeneous position
    pub position: Vec4,
    /// Vertex color
    pub color: Vec4,
    /// Object-space normal
    pub normal: Vec3,
    /// Texture coordinates
    pub uv: Vec2,
    /// Object-to-world matrix
    pub model_matrix: Mat4,
    /// World-to-camera matrix
    pub view_matrix: Mat4,
    /// Camera-to-clip matrix
    pub proj_matrix: Mat4,
}

/// Vertex stage output / fragment stage input
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexOutput {
    /// Clip-space position; pixel coordinates after the viewport transform
    pub position: Vec4,
    /// Interpolated color
    pub color: Vec4,
    /// World-space normal, unit length after the vertex stage
    pub normal: Vec3,
    /// Texture coordinates
    pub uv: Vec2,
    /// World-space position
    pub world_pos: Vec3,
}

/// A programmable vertex/fragment stage pair
pub trait Shader {
    /// Transform one vertex into clip space
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput;

    /// Shade one covered pixel
    ///
    /// `dudx` and `dvdy` are the magnitudes of the screen-space UV
    /// derivatives, in normalized texture units per pixel.
    fn fragment(&self, input: &VertexOutput, dudx: f32, dvdy: f32) -> Color;
}

/// Standard vertex transform: MVP position, world position, world normal
///
/// Normals transform by the inverse-transpose of the model matrix,
/// zero-extended to w = 0.
fn transform_vertex(input: &VertexShaderInput) -> VertexOutput {
    let mvp = input.proj_matrix * input.view_matrix * input.model_matrix;
    let position = mvp * input.position;

    let world_pos = (input.model_matrix * input.position).xyz();

    let normal_matrix = input.model_matrix.transpose().inverse();
    let world_normal = (normal_matrix * Vec4::from_vec3(input.normal, 0.0))
        .xyz()
        .normalized();

    VertexOutput {
        position,
        color: input.color,
        normal: world_normal,
        uv: input.uv,
        world_pos,
    }
}

/// Flat vertex-color shader
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorShader;

impl Shader for ColorShader {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        transform_vertex(input)
    }

    fn fragment(&self, input: &VertexOutput, _dudx: f32, _dvdy: f32) -> Color {
        Color::new(input.color.x, input.color.y, input.color.z, input.color.w)
    }
}

/// Phong lighting in world space with a single point light
#[derive(Debug, Clone)]
pub struct PhongShader {
    light: LightParams,
    shininess: f32,
    view_position: Vec3,
}

impl Default for PhongShader {
    fn default() -> Self {
        Self::new()
    }
}

impl PhongShader {
    /// Create a shader with default light, shininess 32, viewer at +10z
    pub fn new() -> Self {
        Self {
            light: LightParams::default(),
            shininess: 32.0,
            view_position: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    /// Set the light parameters
    pub fn set_light(&mut self, light: LightParams) {
        self.light = light;
    }

    /// Set the specular exponent
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Set the viewer position used for the specular term
    pub fn set_view_position(&mut self, position: Vec3) {
        self.view_position = position;
    }
}

impl Shader for PhongShader {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        transform_vertex(input)
    }

    fn fragment(&self, input: &VertexOutput, _dudx: f32, _dvdy: f32) -> Color {
        let base = Color::new(input.color.x, input.color.y, input.color.z, input.color.w);

        let ambient = self.light.ambient * base;

        let light_dir = (self.light.position - input.world_pos).normalized();
        let diff = input.normal.dot(light_dir).max(0.0);
        let diffuse = self.light.diffuse * base * diff;

        let view_dir = (self.view_position - input.world_pos).normalized();
        let reflect_dir = Vec3::reflect(-light_dir, input.normal);
        let spec = view_dir.dot(reflect_dir).max(0.0).powf(self.shininess);
        let specular = self.light.specular * spec;

        let mut color = ambient + diffuse + specular;
        color.a = base.a;
        Color::new(
            color.r.clamp(0.0, 1.0),
            color.g.clamp(0.0, 1.0),
            color.b.clamp(0.0, 1.0),
            color.a,
        )
    }
}

/// Blinn-Phong lighting: half-vector specular instead of the reflection term
#[derive(Debug, Clone)]
pub struct BlinnPhongShader {
    light: LightParams,
    shininess: f32,
    view_position: Vec3,
}

impl Default for BlinnPhongShader {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinnPhongShader {
    /// Create a shader with default light, shininess 32, viewer at +10z
    pub fn new() -> Self {
        Self {
            light: LightParams::default(),
            shininess: 32.0,
            view_position: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    /// Set the light parameters
    pub fn set_light(&mut self, light: LightParams) {
        self.light = light;
    }

    /// Set the specular exponent
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Set the viewer position used for the specular term
    pub fn set_view_position(&mut self, position: Vec3) {
        self.view_position = position;
    }
}

impl Shader for BlinnPhongShader {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        transform_vertex(input)
    }

    fn fragment(&self, input: &VertexOutput, _dudx: f32, _dvdy: f32) -> Color {
        let base = Color::new(input.color.x, input.color.y, input.color.z, input.color.w);

        let ambient = self.light.ambient * base;

        let light_dir = (self.light.position - input.world_pos).normalized();
        let diff = input.normal.dot(light_dir).max(0.0);
        let diffuse = self.light.diffuse * base * diff;

        let view_dir = (self.view_position - input.world_pos).normalized();
        let half_dir = (light_dir + view_dir).normalized();
        let spec = input.normal.dot(half_dir).max(0.0).powf(self.shininess);
        let specular = self.light.specular * spec;

        let mut color = ambient + diffuse + specular;
        color.a = base.a;
        Color::new(
            color.r.clamp(0.0, 1.0),
            color.g.clamp(0.0, 1.0),
            color.b.clamp(0.0, 1.0),
            color.a,
        )
    }
}

/// Unlit texture sampling
///
/// Holds a non-owning texture handle. Without a texture the vertex color is
/// used, so a missing asset degrades instead of failing the draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureShader<'a> {
    texture: Option<&'a Texture>,
}

impl<'a> TextureShader<'a> {
    /// Create a shader with no texture bound
    pub fn new() -> Self {
        Self { texture: None }
    }

    /// Create a shader sampling the given texture
    pub fn with_texture(texture: &'a Texture) -> Self {
        Self { texture: Some(texture) }
    }

    /// Bind or unbind the texture
    pub fn set_texture(&mut self, texture: Option<&'a Texture>) {
        self.texture = texture;
    }
}

impl Shader for TextureShader<'_> {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        let mvp = input.proj_matrix * input.view_matrix * input.model_matrix;
        let world_pos = (input.model_matrix * input.position).xyz();

        // No lighting happens here, so the object-space normal passes through
        VertexOutput {
            position: mvp * input.position,
            color: input.color,
            normal: input.normal,
            uv: input.uv,
            world_pos,
        }
    }

    fn fragment(&self, input: &VertexOutput, dudx: f32, dvdy: f32) -> Color {
        match self.texture {
            Some(texture) => texture.sample_with_derivatives(input.uv.x, input.uv.y, dudx, dvdy),
            None => Color::new(input.color.x, input.color.y, input.color.z, input.color.w),
        }
    }
}

/// Blinn-Phong lighting over a sampled albedo texture
#[derive(Debug, Clone)]
pub struct TexturedBlinnPhongShader<'a> {
    texture: Option<&'a Texture>,
    light: LightParams,
    shininess: f32,
    view_position: Vec3,
}

impl Default for TexturedBlinnPhongShader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TexturedBlinnPhongShader<'a> {
    /// Create a shader with no texture and default lighting
    pub fn new() -> Self {
        Self {
            texture: None,
            light: LightParams::default(),
            shininess: 32.0,
            view_position: Vec3::new(0.0, 0.0, 10.0),
        }
    }

    /// Bind or unbind the albedo texture
    pub fn set_texture(&mut self, texture: Option<&'a Texture>) {
        self.texture = texture;
    }

    /// Set the light parameters
    pub fn set_light(&mut self, light: LightParams) {
        self.light = light;
    }

    /// Set the specular exponent
    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess;
    }

    /// Set the viewer position used for the specular term
    pub fn set_view_position(&mut self, position: Vec3) {
        self.view_position = position;
    }
}

impl Shader for TexturedBlinnPhongShader<'_> {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        transform_vertex(input)
    }

    fn fragment(&self, input: &VertexOutput, dudx: f32, dvdy: f32) -> Color {
        let base = match self.texture {
            Some(texture) => texture.sample_with_derivatives(input.uv.x, input.uv.y, dudx, dvdy),
            None => Color::new(input.color.x, input.color.y, input.color.z, input.color.w),
        };

        let ambient = self.light.ambient * base;

        let light_dir = (self.light.position - input.world_pos).normalized();
        let diff = input.normal.dot(light_dir).max(0.0);
        let diffuse = self.light.diffuse * base * diff;

        let view_dir = (self.view_position - input.world_pos).normalized();
        let half_dir = (light_dir + view_dir).normalized();
        let spec = input.normal.dot(half_dir).max(0.0).powf(self.shininess);
        let specular = self.light.specular * spec;

        let mut color = ambient + (diffuse + specular) * self.light.intensity;
        color.a = base.a;
        Color::new(
            color.r.clamp(0.0, 1.0),
            color.g.clamp(0.0, 1.0),
            color.b.clamp(0.0, 1.0),
            color.a,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;

    fn identity_input(position: Vec4) -> VertexShaderInput {
        VertexShaderInput {
            position,
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            uv: Vec2::new(0.5, 0.5),
            model_matrix: Mat4::identity(),
            view_matrix: Mat4::identity(),
            proj_matrix: Mat4::identity(),
        }
    }

    #[test]
    fn test_color_shader_passes_vertex_color_through() {
        let shader = ColorShader;
        let output = shader.vertex(&identity_input(Vec4::new(0.0, 0.0, 0.0, 1.0)));
        let color = shader.fragment(&output, 0.0, 0.0);
        assert_eq!(color, Color::RED);
    }

    #[test]
    fn test_vertex_stage_produces_world_attributes() {
        let mut input = identity_input(Vec4::new(1.0, 0.0, 0.0, 1.0));
        input.model_matrix = Mat4::translate(Vec3::new(0.0, 2.0, 0.0));

        let output = ColorShader.vertex(&input);
        assert!((output.world_pos.y - 2.0).abs() < 1e-5);
        assert!((output.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normal_transform_handles_nonuniform_scale() {
        // Scaling X by 4 must not tilt a +Z normal, and a diagonal normal
        // must bend away from the stretched axis
        let mut input = identity_input(Vec4::new(0.0, 0.0, 0.0, 1.0));
        input.model_matrix = Mat4::scale(Vec3::new(4.0, 1.0, 1.0));
        input.normal = Vec3::new(1.0, 0.0, 1.0).normalized();

        let output = ColorShader.vertex(&input);
        assert!((output.normal.length() - 1.0).abs() < 1e-5);
        assert!(output.normal.x < output.normal.z);
    }

    #[test]
    fn test_phong_lit_surface_is_brighter_facing_the_light() {
        let mut shader = PhongShader::new();
        shader.set_light(LightParams::at(Vec3::new(0.0, 0.0, 10.0)));
        shader.set_view_position(Vec3::new(0.0, 0.0, 10.0));

        let facing = VertexOutput {
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            world_pos: Vec3::ZERO,
            ..Default::default()
        };
        let averted = VertexOutput {
            normal: Vec3::new(0.0, 0.0, -1.0),
            ..facing
        };

        let lit = shader.fragment(&facing, 0.0, 0.0);
        let unlit = shader.fragment(&averted, 0.0, 0.0);
        assert!(lit.r > unlit.r);
    }

    #[test]
    fn test_lit_fragment_is_clamped_with_alpha_passthrough() {
        let mut shader = BlinnPhongShader::new();
        let mut light = LightParams::default();
        light.diffuse = Color::new(10.0, 10.0, 10.0, 1.0);
        shader.set_light(light);

        let input = VertexOutput {
            color: Vec4::new(1.0, 1.0, 1.0, 0.5),
            normal: Vec3::new(0.0, 0.0, 1.0),
            world_pos: Vec3::ZERO,
            ..Default::default()
        };
        let color = shader.fragment(&input, 0.0, 0.0);
        assert!(color.r <= 1.0);
        assert!(color.g <= 1.0);
        assert!(color.b <= 1.0);
        assert_eq!(color.a, 0.5);
    }

    #[test]
    fn test_texture_shader_without_texture_uses_vertex_color() {
        let shader = TextureShader::new();
        let input = VertexOutput {
            color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            ..Default::default()
        };
        assert_eq!(shader.fragment(&input, 0.0, 0.0), Color::GREEN);
    }

    #[test]
    fn test_texture_shader_samples_bound_texture() {
        let mut texture = Texture::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                texture.set_pixel(x, y, Color::BLUE);
            }
        }
        let shader = TextureShader::with_texture(&texture);
        let input = VertexOutput {
            uv: Vec2::new(0.5, 0.5),
            ..Default::default()
        };
        let color = shader.fragment(&input, 0.0, 0.0);
        assert!((color.b - 1.0).abs() < 1e-6);
    }
}
