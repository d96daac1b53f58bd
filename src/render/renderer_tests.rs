//! End-to-end pipeline tests
//!
//! Each test drives the public renderer API through full frames and asserts
//! on the resulting pixels, exercising vertex shading, clipping, coverage,
//! interpolation, depth testing, and presentation together.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::camera::Camera;
use crate::render::color::Color;
use crate::render::framebuffer::PresentTarget;
use crate::render::mesh::{Mesh, Vertex};
use crate::render::object::Object;
use crate::render::renderer::{CullMode, FrontFace, Renderer};
use crate::render::shader::{ColorShader, Shader, TextureShader, VertexOutput, VertexShaderInput};
use crate::render::texture::Texture;
use std::cell::RefCell;

/// Collects presented frames for assertions
struct CaptureTarget {
    frames: Vec<(u32, u32, Vec<u8>)>,
}

impl CaptureTarget {
    fn new() -> Self {
        Self { frames: Vec::new() }
    }
}

impl PresentTarget for CaptureTarget {
    fn blit(&mut self, width: u32, height: u32, pixels: &[u8]) {
        self.frames.push((width, height, pixels.to_vec()));
    }
}

/// Records every shaded fragment so interpolation can be inspected
struct ProbeShader {
    fragments: RefCell<Vec<VertexOutput>>,
}

impl ProbeShader {
    fn new() -> Self {
        Self { fragments: RefCell::new(Vec::new()) }
    }
}

impl Shader for ProbeShader {
    fn vertex(&self, input: &VertexShaderInput) -> VertexOutput {
        ColorShader.vertex(input)
    }

    fn fragment(&self, input: &VertexOutput, _dudx: f32, _dvdy: f32) -> Color {
        self.fragments.borrow_mut().push(*input);
        Color::WHITE
    }
}

fn red_vertex(x: f32, y: f32, z: f32) -> Vertex {
    Vertex::with_color(Vec4::new(x, y, z, 1.0), Vec4::new(1.0, 0.0, 0.0, 1.0))
}

fn colored_triangle(z: f32, color: Vec4) -> [Vertex; 3] {
    [
        Vertex::with_color(Vec4::new(-1.0, -1.0, z, 1.0), color),
        Vertex::with_color(Vec4::new(1.0, -1.0, z, 1.0), color),
        Vertex::with_color(Vec4::new(0.0, 1.0, z, 1.0), color),
    ]
}

#[test]
fn test_red_triangle_covers_screen_center() {
    let mut renderer = Renderer::new(800, 600);
    renderer.clear_back_buffer(Color::BLACK);

    let [v0, v1, v2] = [
        red_vertex(-1.0, -1.0, -0.5),
        red_vertex(1.0, -1.0, -0.5),
        red_vertex(0.0, 1.0, -0.5),
    ];
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);

    let center = renderer.back_buffer().color.get_pixel(400, 300);
    assert!(center.r >= 0.9, "center pixel should be red, got {:?}", center);
    assert!(center.g < 0.1);
    assert!(center.b < 0.1);

    let corner = renderer.back_buffer().color.get_pixel(10, 10);
    assert_eq!(corner.r, 0.0);
    assert_eq!(corner.g, 0.0);
    assert_eq!(corner.b, 0.0);
}

#[test]
fn test_depth_occlusion_is_order_independent() {
    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let green = Vec4::new(0.0, 1.0, 0.0, 1.0);

    for near_first in [false, true] {
        let mut renderer = Renderer::new(200, 200);
        renderer.set_cull_mode(CullMode::None);
        renderer.clear_back_buffer(Color::BLACK);

        let near = colored_triangle(0.3, red);
        let far = colored_triangle(0.7, green);

        let order: [&[Vertex; 3]; 2] = if near_first { [&near, &far] } else { [&far, &near] };
        for triangle in order {
            renderer.draw_triangle(&triangle[0], &triangle[1], &triangle[2], &ColorShader);
        }

        // The near triangle wins regardless of submission order
        let pixel = renderer.back_buffer().color.get_pixel(100, 100);
        assert!(pixel.r >= 0.9, "near-first={}: expected red, got {:?}", near_first, pixel);
        assert!(pixel.g < 0.1);
    }
}

#[test]
fn test_drawing_the_same_triangle_twice_changes_nothing() {
    let mut renderer = Renderer::new(100, 100);
    renderer.set_cull_mode(CullMode::None);
    renderer.clear_back_buffer(Color::BLACK);

    let [v0, v1, v2] = colored_triangle(0.5, Vec4::new(0.2, 0.4, 0.8, 1.0));
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);
    let after_once = renderer.back_buffer().color.data().to_vec();
    let depth_once = renderer.back_buffer().depth.get_depth(50, 50);

    // LESS-OR-EQUAL depth lets the second pass rewrite identical values
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);
    assert_eq!(renderer.back_buffer().color.data(), &after_once[..]);
    assert_eq!(renderer.back_buffer().depth.get_depth(50, 50), depth_once);
}

#[test]
fn test_backface_culling_respects_winding() {
    let mut renderer = Renderer::new(100, 100);
    renderer.set_cull_mode(CullMode::Back);
    renderer.set_front_face(FrontFace::Ccw);
    renderer.set_view_position(Vec3::new(0.0, 0.0, 10.0));
    renderer.clear_back_buffer(Color::BLACK);

    let [v0, v1, v2] = colored_triangle(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));

    // CCW as seen from +Z: rendered
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);
    assert!(renderer.back_buffer().color.get_pixel(50, 50).r >= 0.9);

    // Reversed winding: culled, nothing written
    renderer.clear_back_buffer(Color::BLACK);
    renderer.draw_triangle(&v0, &v2, &v1, &ColorShader);
    let data = renderer.back_buffer().color.data();
    assert!(
        data.chunks_exact(4).all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0),
        "culled triangle must write no pixels"
    );
}

#[test]
fn test_cull_front_inverts_the_selection() {
    let mut renderer = Renderer::new(100, 100);
    renderer.set_cull_mode(CullMode::Front);
    renderer.clear_back_buffer(Color::BLACK);

    let [v0, v1, v2] = colored_triangle(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);
    assert_eq!(renderer.back_buffer().color.get_pixel(50, 50).r, 0.0);

    renderer.draw_triangle(&v0, &v2, &v1, &ColorShader);
    assert!(renderer.back_buffer().color.get_pixel(50, 50).r >= 0.9);
}

#[test]
fn test_triangle_straddling_the_near_plane_still_renders() {
    let mut renderer = Renderer::new(200, 200);
    let camera = Camera::perspective(
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
        60.0,
        1.0,
        0.1,
        100.0,
    );
    renderer.apply_camera(&camera);
    renderer.set_cull_mode(CullMode::None);
    renderer.clear_back_buffer(Color::BLACK);

    // One vertex far behind the camera forces a near-plane split
    let v0 = red_vertex(-1.0, -0.5, 0.0);
    let v1 = red_vertex(1.0, -0.5, 0.0);
    let v2 = red_vertex(0.0, 0.5, 10.0);
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);

    let drawn = renderer
        .back_buffer()
        .color
        .data()
        .chunks_exact(4)
        .filter(|p| p[0] > 200)
        .count();
    assert!(drawn > 0, "the clipped portion in front of the camera must rasterize");
}

#[test]
fn test_interpolated_world_position_reprojects_to_its_pixel() {
    let mut renderer = Renderer::new(160, 120);
    let camera = Camera::perspective(
        Vec3::new(0.0, 0.0, 4.0),
        Vec3::ZERO,
        45.0,
        160.0 / 120.0,
        0.1,
        100.0,
    );
    renderer.apply_camera(&camera);
    renderer.set_cull_mode(CullMode::None);
    renderer.clear_back_buffer(Color::BLACK);

    // A slanted triangle so w varies noticeably across the surface
    let v0 = red_vertex(-1.0, -1.0, 0.0);
    let v1 = red_vertex(1.5, -0.5, -2.0);
    let v2 = red_vertex(0.0, 1.0, -1.0);

    let probe = ProbeShader::new();
    renderer.draw_triangle(&v0, &v1, &v2, &probe);

    let view_proj = camera.projection_matrix() * camera.view_matrix();
    let fragments = probe.fragments.borrow();
    assert!(!fragments.is_empty());

    for fragment in fragments.iter() {
        // Reproject the perspective-correct world position through the same
        // view/projection and viewport mapping
        let clip = view_proj * Vec4::from_vec3(fragment.world_pos, 1.0);
        assert!(clip.w > 0.0);
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let screen_x = (ndc_x + 1.0) * 160.0 * 0.5;
        let screen_y = (1.0 - ndc_y) * 120.0 * 0.5;

        let dx = (screen_x - fragment.position.x).abs();
        let dy = (screen_y - fragment.position.y).abs();
        assert!(
            dx < 0.5 && dy < 0.5,
            "world position reprojected {} px off its pixel",
            (dx * dx + dy * dy).sqrt()
        );
    }
}

#[test]
fn test_full_frame_loop_presents_and_clears() {
    let mut renderer = Renderer::new(64, 64);
    renderer.set_background_color(Color::BLACK);
    renderer.clear_back_buffer(Color::BLACK);

    let [v0, v1, v2] = colored_triangle(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
    renderer.draw_triangle(&v0, &v1, &v2, &ColorShader);

    let mut target = CaptureTarget::new();
    renderer.swap(&mut target);

    // The drawn frame reached the target
    assert_eq!(target.frames.len(), 1);
    let (w, h, pixels) = &target.frames[0];
    assert_eq!((*w, *h), (64, 64));
    let center = ((32 * 64 + 32) * 4) as usize;
    assert_eq!(pixels[center], 255);

    // The fresh back buffer starts from the background again
    let back = renderer.back_buffer().color.get_pixel(32, 32);
    assert_eq!(back.r, 0.0);
    assert_eq!(renderer.back_buffer().depth.get_depth(32, 32), 1.0);
}

#[test]
fn test_textured_object_renders_through_camera() {
    let mut renderer = Renderer::new(128, 128);
    let camera = Camera::perspective(
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::ZERO,
        60.0,
        1.0,
        0.1,
        100.0,
    );
    renderer.apply_camera(&camera);
    renderer.set_cull_mode(CullMode::None);
    renderer.clear_back_buffer(Color::BLACK);

    let mut mesh = Mesh::new();
    let white = Vec4::new(1.0, 1.0, 1.0, 1.0);
    let a = mesh.add_vertex(Vertex::new(
        Vec4::new(-1.0, -1.0, 0.0, 1.0),
        white,
        Vec3::new(0.0, 0.0, 1.0),
        Vec2::new(0.0, 1.0),
    ));
    let b = mesh.add_vertex(Vertex::new(
        Vec4::new(1.0, -1.0, 0.0, 1.0),
        white,
        Vec3::new(0.0, 0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ));
    let c = mesh.add_vertex(Vertex::new(
        Vec4::new(1.0, 1.0, 0.0, 1.0),
        white,
        Vec3::new(0.0, 0.0, 1.0),
        Vec2::new(1.0, 0.0),
    ));
    let d = mesh.add_vertex(Vertex::new(
        Vec4::new(-1.0, 1.0, 0.0, 1.0),
        white,
        Vec3::new(0.0, 0.0, 1.0),
        Vec2::new(0.0, 0.0),
    ));
    mesh.add_triangle(a, b, c);
    mesh.add_triangle(a, c, d);

    let texture = Texture::checkerboard(8, 8, 1, Color::WHITE, Color::BLUE);
    let shader = TextureShader::with_texture(&texture);
    let object = Object::from_mesh(mesh);
    renderer.draw_object(&object, &shader);

    // The quad spans the view; the checker must produce both colors
    let mut whites = 0;
    let mut blues = 0;
    for chunk in renderer.back_buffer().color.data().chunks_exact(4) {
        if chunk[0] > 200 && chunk[2] > 200 {
            whites += 1;
        } else if chunk[2] > 200 {
            blues += 1;
        }
    }
    assert!(whites > 0 && blues > 0, "checker texture should show both colors");
}

#[test]
fn test_null_size_mesh_draws_nothing() {
    let mut renderer = Renderer::new(32, 32);
    renderer.clear_back_buffer(Color::BLACK);

    let mesh = Mesh::new();
    renderer.draw_mesh(&mesh, Mat4::identity(), &ColorShader);

    // Degenerate triangle: two identical vertices, zero area
    let v = red_vertex(0.0, 0.0, 0.0);
    renderer.set_cull_mode(CullMode::None);
    renderer.draw_triangle(&v, &v, &v, &ColorShader);

    let data = renderer.back_buffer().color.data();
    assert!(data.chunks_exact(4).all(|p| p[0] == 0));
}

#[test]
fn test_mesh_with_bad_indices_skips_only_those_triangles() {
    let mut renderer = Renderer::new(100, 100);
    renderer.set_cull_mode(CullMode::None);
    renderer.clear_back_buffer(Color::BLACK);

    let mut mesh = Mesh::new();
    let [v0, v1, v2] = colored_triangle(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
    let a = mesh.add_vertex(v0);
    let b = mesh.add_vertex(v1);
    let c = mesh.add_vertex(v2);
    mesh.add_triangle(a, b, 999);
    mesh.add_triangle(a, b, c);

    renderer.draw_mesh(&mesh, Mat4::identity(), &ColorShader);
    assert!(renderer.back_buffer().color.get_pixel(50, 50).r >= 0.9);
}

#[test]
fn test_draw_line_marks_its_endpoints() {
    let mut renderer = Renderer::new(32, 32);
    renderer.clear_back_buffer(Color::BLACK);
    renderer.draw_line(2, 2, 29, 17, Color::CYAN);

    assert!(renderer.back_buffer().color.get_pixel(2, 2).g > 0.9);
    assert!(renderer.back_buffer().color.get_pixel(29, 17).g > 0.9);

    // A zero-length line still plots its single pixel
    renderer.draw_line(5, 20, 5, 20, Color::CYAN);
    assert!(renderer.back_buffer().color.get_pixel(5, 20).g > 0.9);
}
