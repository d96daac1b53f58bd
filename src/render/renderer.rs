//! The rasterization pipeline
//!
//! `draw_triangle` carries a triangle through vertex shading, world-space
//! back-face culling, near-plane clipping, perspective divide and viewport
//! transform, and an 8x8-tile walk of the screen bounding box with
//! edge-function coverage, perspective-correct attribute interpolation, a
//! LESS-OR-EQUAL depth test, and fragment shading into the back buffer.
//!
//! Every failure is silent and local: a degenerate triangle, an all-outside
//! clip, or an out-of-range index drops that unit and the frame continues.

use crate::foundation::math::{Mat4, Vec2, Vec3, EPSILON};
use crate::render::camera::Camera;
use crate::render::color::Color;
use crate::render::framebuffer::{BufferManager, Framebuffer, PresentTarget};
use crate::render::mesh::{Mesh, Vertex};
use crate::render::object::Object;
use crate::render::shader::{Shader, VertexOutput, VertexShaderInput};

/// Which faces to discard before rasterization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// Discard faces pointing away from the viewer
    Back,
    /// Discard faces pointing toward the viewer
    Front,
    /// Rasterize everything
    None,
}

/// Winding order that counts as front-facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    /// Counter-clockwise front faces
    Ccw,
    /// Clockwise front faces
    Cw,
}

/// Triangle area below this is treated as degenerate
const AREA_EPSILON: f32 = 1e-5;
/// Smallest |w| allowed into the perspective divide
const MIN_DIVIDE_W: f32 = 0.001;
/// Rasterization tile edge in pixels
const TILE_SIZE: i32 = 8;

/// The software rasterizer
///
/// Owns the double-buffered framebuffer and the per-draw state (matrices,
/// view position, cull mode). Shaders are borrowed per draw call and never
/// owned.
pub struct Renderer {
    width: u32,
    height: u32,
    buffers: BufferManager,
    model_matrix: Mat4,
    view_matrix: Mat4,
    proj_matrix: Mat4,
    view_position: Vec3,
    cull_mode: CullMode,
    front_face: FrontFace,
    near_plane: f32,
}

impl Renderer {
    /// Create a renderer with both framebuffers sized `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        log::info!("initializing software renderer at {}x{}", width, height);
        Self {
            width,
            height,
            buffers: BufferManager::new(width, height),
            model_matrix: Mat4::identity(),
            view_matrix: Mat4::identity(),
            proj_matrix: Mat4::identity(),
            view_position: Vec3::new(0.0, 0.0, 10.0),
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            near_plane: 0.1,
        }
    }

    /// Framebuffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Framebuffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set the object-to-world matrix for subsequent draws
    pub fn set_model_matrix(&mut self, matrix: Mat4) {
        self.model_matrix = matrix;
    }

    /// Set the world-to-camera matrix for subsequent draws
    pub fn set_view_matrix(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    /// Set the camera-to-clip matrix for subsequent draws
    pub fn set_projection_matrix(&mut self, matrix: Mat4) {
        self.proj_matrix = matrix;
    }

    /// Set the world-space viewer position used by back-face culling
    pub fn set_view_position(&mut self, position: Vec3) {
        self.view_position = position;
    }

    /// Set the face culling mode
    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    /// Set which winding order is front-facing
    pub fn set_front_face(&mut self, front_face: FrontFace) {
        self.front_face = front_face;
    }

    /// Set the near-plane distance used for clipping; kept equal to the
    /// camera's near plane by convention
    pub fn set_near_plane(&mut self, near: f32) {
        self.near_plane = near;
    }

    /// Take view, projection, view position, and near plane from a camera
    pub fn apply_camera(&mut self, camera: &Camera) {
        self.view_matrix = camera.view_matrix();
        self.proj_matrix = camera.projection_matrix();
        self.view_position = camera.position;
        self.near_plane = camera.near();
    }

    /// Background color used when the back buffer is acquired
    pub fn set_background_color(&mut self, color: Color) {
        self.buffers.set_background_color(color);
    }

    /// Read-only access to the buffer in progress
    pub fn back_buffer(&self) -> &Framebuffer {
        self.buffers.back()
    }

    /// Read-only access to the presented buffer
    pub fn front_buffer(&self) -> &Framebuffer {
        self.buffers.front()
    }

    /// Clear the back buffer's color and depth (depth to 1.0)
    pub fn clear_back_buffer(&mut self, color: Color) {
        self.buffers.back_mut().clear(color, 1.0);
    }

    /// Clear only the back depth buffer
    pub fn clear_depth(&mut self, depth: f32) {
        self.buffers.back_mut().depth.clear(depth);
    }

    /// Finish the frame: swap buffers, present the front, and acquire a
    /// cleared back buffer for the next frame
    pub fn swap(&mut self, target: &mut dyn PresentTarget) {
        self.buffers.swap();
        self.buffers.present(target);
        self.buffers.acquire_back();
    }

    /// Write a single pixel to the back buffer; out-of-range is ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.buffers.back_mut().color.set_pixel(x as u32, y as u32, color);
    }

    /// Draw a line with the DDA algorithm
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let steps = dx.abs().max(dy.abs());
        if steps == 0 {
            self.set_pixel(x1, y1, color);
            return;
        }

        let x_increment = dx as f32 / steps as f32;
        let y_increment = dy as f32 / steps as f32;
        let mut x = x1 as f32;
        let mut y = y1 as f32;

        self.set_pixel(x.round() as i32, y.round() as i32, color);
        for _ in 0..steps {
            x += x_increment;
            y += y_increment;
            self.set_pixel(x.round() as i32, y.round() as i32, color);
        }
    }

    /// Draw every triangle of a mesh under a model matrix
    ///
    /// Triangles with out-of-range indices are skipped.
    pub fn draw_mesh(&mut self, mesh: &Mesh, model_matrix: Mat4, shader: &dyn Shader) {
        self.model_matrix = model_matrix;

        for triangle in &mesh.triangles {
            let [i0, i1, i2] = *triangle;
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            if i0 >= mesh.vertices.len() || i1 >= mesh.vertices.len() || i2 >= mesh.vertices.len()
            {
                log::trace!("skipping triangle with out-of-range indices");
                continue;
            }
            let v0 = mesh.vertices[i0];
            let v1 = mesh.vertices[i1];
            let v2 = mesh.vertices[i2];
            self.draw_triangle(&v0, &v1, &v2, shader);
        }
    }

    /// Draw an object using its own model matrix
    pub fn draw_object(&mut self, object: &Object, shader: &dyn Shader) {
        self.draw_mesh(&object.mesh, object.model_matrix(), shader);
    }

    /// Run one triangle through the full pipeline
    pub fn draw_triangle(&mut self, v0: &Vertex, v1: &Vertex, v2: &Vertex, shader: &dyn Shader) {
        // Stage 1: vertex shading
        let out0 = shader.vertex(&self.vertex_input(v0));
        let out1 = shader.vertex(&self.vertex_input(v1));
        let out2 = shader.vertex(&self.vertex_input(v2));

        // Stage 2: back-face culling in world space
        if self.cull_mode != CullMode::None && self.is_culled(&out0, &out1, &out2) {
            return;
        }

        // Stage 3: near-plane clipping
        let clipped = self.clip_triangle_against_near(&out0, &out1, &out2);

        for triangle in clipped {
            self.rasterize(triangle, shader);
        }
    }

    fn vertex_input(&self, vertex: &Vertex) -> VertexShaderInput {
        VertexShaderInput {
            position: vertex.position,
            color: vertex.color,
            normal: vertex.normal,
            uv: vertex.uv,
            model_matrix: self.model_matrix,
            view_matrix: self.view_matrix,
            proj_matrix: self.proj_matrix,
        }
    }

    /// Cull against the world-space face normal and view direction
    fn is_culled(&self, v0: &VertexOutput, v1: &VertexOutput, v2: &VertexOutput) -> bool {
        let edge1 = v1.world_pos - v0.world_pos;
        let edge2 = v2.world_pos - v0.world_pos;
        let normal = edge1.cross(edge2).normalized();

        let center = (v0.world_pos + v1.world_pos + v2.world_pos) / 3.0;
        let view_dir = self.view_position - center;
        let facing = normal.dot(view_dir);

        let is_front = match self.front_face {
            FrontFace::Ccw => facing > EPSILON,
            FrontFace::Cw => facing < -EPSILON,
        };

        match self.cull_mode {
            CullMode::Back => !is_front,
            CullMode::Front => is_front,
            CullMode::None => false,
        }
    }

    /// Intersect the edge from an inside vertex to an outside vertex with the
    /// near plane `w = near`
    ///
    /// Attributes are interpolated linearly in clip space; the near-plane
    /// intersection is itself linear in the homogeneous coordinates. The
    /// normal is renormalized.
    fn clip_edge(&self, inside: &VertexOutput, outside: &VertexOutput) -> VertexOutput {
        let t = (self.near_plane - inside.position.w)
            / (outside.position.w - inside.position.w);

        let mut position = inside.position + (outside.position - inside.position) * t;
        position.w = self.near_plane;

        VertexOutput {
            position,
            color: inside.color + (outside.color - inside.color) * t,
            normal: (inside.normal + (outside.normal - inside.normal) * t).normalized(),
            uv: inside.uv + (outside.uv - inside.uv) * t,
            world_pos: inside.world_pos + (outside.world_pos - inside.world_pos) * t,
        }
    }

    /// Clip a triangle against the near plane, yielding 0, 1, or 2 triangles
    ///
    /// A vertex is inside when `w >= near`. With one inside vertex A the
    /// result is {A, clip(A,B), clip(A,C)}; with two inside the surviving
    /// quad splits into two triangles with winding preserved.
    fn clip_triangle_against_near(
        &self,
        v0: &VertexOutput,
        v1: &VertexOutput,
        v2: &VertexOutput,
    ) -> Vec<[VertexOutput; 3]> {
        let inside0 = v0.position.w >= self.near_plane;
        let inside1 = v1.position.w >= self.near_plane;
        let inside2 = v2.position.w >= self.near_plane;
        let inside_count = inside0 as u32 + inside1 as u32 + inside2 as u32;

        match inside_count {
            0 => Vec::new(),
            3 => vec![[*v0, *v1, *v2]],
            1 => {
                let triangle = if inside0 {
                    [*v0, self.clip_edge(v0, v1), self.clip_edge(v0, v2)]
                } else if inside1 {
                    [self.clip_edge(v1, v0), *v1, self.clip_edge(v1, v2)]
                } else {
                    [self.clip_edge(v2, v0), self.clip_edge(v2, v1), *v2]
                };
                vec![triangle]
            }
            _ => {
                // Two inside: the quad {inside, inside, two clip points}
                // becomes two triangles
                if !inside0 {
                    let a = self.clip_edge(v1, v0);
                    let b = self.clip_edge(v2, v0);
                    vec![[a, *v1, *v2], [a, *v2, b]]
                } else if !inside1 {
                    let a = self.clip_edge(v0, v1);
                    let b = self.clip_edge(v2, v1);
                    vec![[*v0, a, *v2], [a, b, *v2]]
                } else {
                    let a = self.clip_edge(v0, v2);
                    let b = self.clip_edge(v1, v2);
                    vec![[*v0, *v1, a], [*v1, b, a]]
                }
            }
        }
    }

    /// Perspective divide and viewport transform
    ///
    /// x,y,z divide by w (clamped away from zero); x,y map to pixel
    /// coordinates with a top-left origin and z maps from [-1,1] to [0,1].
    /// The pre-divide w stays in `position.w` for the interpolator.
    fn to_screen(&self, vertex: &mut VertexOutput) {
        let mut w = vertex.position.w;
        if w.abs() < MIN_DIVIDE_W {
            w = MIN_DIVIDE_W;
        }

        vertex.position.x /= w;
        vertex.position.y /= w;
        vertex.position.z /= w;

        vertex.position.x = (vertex.position.x + 1.0) * self.width as f32 * 0.5;
        vertex.position.y = (1.0 - vertex.position.y) * self.height as f32 * 0.5;
        vertex.position.z = vertex.position.z * 0.5 + 0.5;
    }

    /// Stages 4-7 for one clipped triangle
    fn rasterize(&mut self, triangle: [VertexOutput; 3], shader: &dyn Shader) {
        let [mut s0, mut s1, mut s2] = triangle;
        self.to_screen(&mut s0);
        self.to_screen(&mut s1);
        self.to_screen(&mut s2);

        let p0 = Vec2::new(s0.position.x, s0.position.y);
        let p1 = Vec2::new(s1.position.x, s1.position.y);
        let p2 = Vec2::new(s2.position.x, s2.position.y);

        // Signed double area; degenerate triangles are dropped
        let area = edge_function(p0, p1, p2);
        if area.abs() < AREA_EPSILON {
            return;
        }
        let inv_area = 1.0 / area;

        // Screen bounding box clamped to the viewport
        let min_x = (p0.x.min(p1.x).min(p2.x).floor() as i32).max(0);
        let max_x = (p0.x.max(p1.x).max(p2.x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (p0.y.min(p1.y).min(p2.y).floor() as i32).max(0);
        let max_y = (p0.y.max(p1.y).max(p2.y).ceil() as i32).min(self.height as i32 - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        // UV derivatives for mipmap selection, from the 2x2 screen-space
        // system; a degenerate determinant falls back to invDet = 1
        let edge12 = p1 - p0;
        let edge13 = p2 - p0;
        let tex12 = s1.uv - s0.uv;
        let tex13 = s2.uv - s0.uv;
        let det = edge12.x * edge13.y - edge12.y * edge13.x;
        let inv_det = if det.abs() < EPSILON { 1.0 } else { 1.0 / det };

        let dudx = (edge13.y * tex12.x - edge12.y * tex13.x) * inv_det;
        let dvdx = (edge13.y * tex12.y - edge12.y * tex13.y) * inv_det;
        let dudy = (edge12.x * tex13.x - edge13.x * tex12.x) * inv_det;
        let dvdy = (edge12.x * tex13.y - edge13.x * tex12.y) * inv_det;

        let duv_dx = (dudx * dudx + dvdx * dvdx).sqrt();
        let duv_dy = (dudy * dudy + dvdy * dvdy).sqrt();

        // Stage 6-7: walk the bounding box in tiles; test, interpolate,
        // depth-test, shade, write
        let framebuffer = self.buffers.back_mut();
        let mut block_y = min_y;
        while block_y <= max_y {
            let mut block_x = min_x;
            let end_y = (block_y + TILE_SIZE).min(max_y + 1);
            while block_x <= max_x {
                let end_x = (block_x + TILE_SIZE).min(max_x + 1);

                for y in block_y..end_y {
                    for x in block_x..end_x {
                        let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

                        let alpha = edge_function(p1, p2, pixel) * inv_area;
                        if alpha < 0.0 {
                            continue;
                        }
                        let beta = edge_function(p2, p0, pixel) * inv_area;
                        if beta < 0.0 {
                            continue;
                        }
                        let gamma = 1.0 - alpha - beta;
                        if gamma < 0.0 {
                            continue;
                        }

                        let fragment = interpolate_vertex(&s0, &s1, &s2, alpha, beta, gamma);

                        let z = fragment.position.z;
                        if z <= framebuffer.depth.get_depth(x as u32, y as u32) {
                            let color = shader.fragment(&fragment, duv_dx, duv_dy);
                            framebuffer.color.set_pixel(x as u32, y as u32, color);
                            framebuffer.depth.set_depth(x as u32, y as u32, z);
                        }
                    }
                }

                block_x += TILE_SIZE;
            }
            block_y += TILE_SIZE;
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        log::info!("software renderer shut down");
    }
}

/// Edge function: `(c.x-a.x)(b.y-a.y) - (c.y-a.y)(b.x-a.x)`
///
/// The sign tells which side of edge a->b the point c lies on; the magnitude
/// is twice the signed sub-triangle area.
#[inline]
fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Perspective-correct attribute interpolation
///
/// Each varying attribute is weighted by its vertex's reciprocal pre-divide
/// w, recovering values that vary linearly in world space. Depth is already
/// divided by w, so z interpolates linearly in screen space.
fn interpolate_vertex(
    v0: &VertexOutput,
    v1: &VertexOutput,
    v2: &VertexOutput,
    alpha: f32,
    beta: f32,
    gamma: f32,
) -> VertexOutput {
    let z = alpha * v0.position.z + beta * v1.position.z + gamma * v2.position.z;

    let c0 = alpha / v0.position.w;
    let c1 = beta / v1.position.w;
    let c2 = gamma / v2.position.w;
    let normalizer = 1.0 / (c0 + c1 + c2);

    let color = (v0.color * c0 + v1.color * c1 + v2.color * c2) * normalizer;
    let normal = ((v0.normal * c0 + v1.normal * c1 + v2.normal * c2) * normalizer).normalized();
    let uv = (v0.uv * c0 + v1.uv * c1 + v2.uv * c2) * normalizer;
    let world_pos = (v0.world_pos * c0 + v1.world_pos * c1 + v2.world_pos * c2) * normalizer;

    let x = alpha * v0.position.x + beta * v1.position.x + gamma * v2.position.x;
    let y = alpha * v0.position.y + beta * v1.position.y + gamma * v2.position.y;

    VertexOutput {
        position: crate::foundation::math::Vec4::new(x, y, z, 1.0),
        color,
        normal,
        uv,
        world_pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{to_radians, Vec4};

    fn clip_vertex(w: f32) -> VertexOutput {
        VertexOutput {
            position: Vec4::new(0.0, 0.0, 0.0, w),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_clip_keeps_a_fully_inside_triangle_unchanged() {
        let renderer = Renderer::new(64, 64);
        let v0 = clip_vertex(2.0);
        let v1 = clip_vertex(1.5);
        let v2 = clip_vertex(0.5);

        let result = renderer.clip_triangle_against_near(&v0, &v1, &v2);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0][0].position, v0.position);
        assert_eq!(result[0][1].position, v1.position);
        assert_eq!(result[0][2].position, v2.position);
    }

    #[test]
    fn test_clip_drops_a_fully_outside_triangle() {
        let renderer = Renderer::new(64, 64);
        let result = renderer.clip_triangle_against_near(
            &clip_vertex(0.05),
            &clip_vertex(-1.0),
            &clip_vertex(0.0),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_clip_with_one_inside_vertex_emits_one_triangle() {
        let renderer = Renderer::new(64, 64);
        let result = renderer.clip_triangle_against_near(
            &clip_vertex(2.0),
            &clip_vertex(-0.5),
            &clip_vertex(-0.5),
        );
        assert_eq!(result.len(), 1);

        // The two generated vertices sit exactly on the near plane
        assert!((result[0][1].position.w - 0.1).abs() < 1e-5);
        assert!((result[0][2].position.w - 0.1).abs() < 1e-5);
        assert!((result[0][0].position.w - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_with_two_inside_vertices_emits_a_quad() {
        let renderer = Renderer::new(64, 64);
        let result = renderer.clip_triangle_against_near(
            &clip_vertex(2.0),
            &clip_vertex(2.0),
            &clip_vertex(-0.5),
        );
        assert_eq!(result.len(), 2);

        // Every generated vertex lands on the near plane
        for triangle in &result {
            for vertex in triangle {
                assert!(vertex.position.w >= 0.1 - 1e-5);
            }
        }
    }

    #[test]
    fn test_projected_frustum_point_lands_in_the_viewport() {
        let mut renderer = Renderer::new(800, 600);
        let proj = Mat4::perspective(to_radians(60.0), 800.0 / 600.0, 0.1, 100.0);
        renderer.set_projection_matrix(proj);

        // A point well inside the frustum
        let mut inside = VertexOutput {
            position: proj * Vec4::new(0.5, 0.2, -5.0, 1.0),
            ..Default::default()
        };
        renderer.to_screen(&mut inside);
        assert!(inside.position.x >= 0.0 && inside.position.x <= 800.0);
        assert!(inside.position.y >= 0.0 && inside.position.y <= 600.0);
        assert!(inside.position.z >= 0.0 && inside.position.z <= 1.0);

        // A point beyond the far plane projects outside [0, 1] depth
        let mut outside = VertexOutput {
            position: proj * Vec4::new(0.0, 0.0, -200.0, 1.0),
            ..Default::default()
        };
        renderer.to_screen(&mut outside);
        assert!(outside.position.z > 1.0);
    }

    #[test]
    fn test_edge_function_sign_and_magnitude() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 0.0);
        // Twice the area of the 2x2 right triangle
        let c = Vec2::new(0.0, 2.0);
        assert_eq!(edge_function(a, b, c).abs(), 4.0);
    }

    #[test]
    fn test_interpolation_weights_recover_vertex_values() {
        let make = |x: f32, w: f32, color: f32| VertexOutput {
            position: Vec4::new(x, 0.0, 0.5, w),
            color: Vec4::new(color, color, color, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        let v0 = make(0.0, 1.0, 0.0);
        let v1 = make(10.0, 2.0, 1.0);
        let v2 = make(0.0, 4.0, 0.5);

        // A corner barycentric returns that vertex's attribute exactly
        let at_v1 = interpolate_vertex(&v0, &v1, &v2, 0.0, 1.0, 0.0);
        assert!((at_v1.color.x - 1.0).abs() < 1e-6);
        assert!((at_v1.position.x - 10.0).abs() < 1e-6);
    }
}
