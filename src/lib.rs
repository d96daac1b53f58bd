//! # softrender
//!
//! A CPU software rasterizer. Indexed triangle meshes run through
//! programmable vertex and fragment stages, are clipped against the near
//! plane, rasterized with an edge-function coverage test, interpolated
//! perspective-correctly, depth-tested, and written into a double-buffered
//! color/depth image.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use softrender::prelude::*;
//!
//! let mut renderer = Renderer::new(800, 600);
//! let mut mesh = Mesh::new();
//! mesh.add_vertex(Vertex::from_position(Vec4::new(-1.0, -1.0, -0.5, 1.0)));
//! mesh.add_vertex(Vertex::from_position(Vec4::new(1.0, -1.0, -0.5, 1.0)));
//! mesh.add_vertex(Vertex::from_position(Vec4::new(0.0, 1.0, -0.5, 1.0)));
//! mesh.add_triangle(0, 1, 2);
//!
//! let shader = ColorShader;
//! renderer.clear_back_buffer(Color::BLACK);
//! renderer.draw_mesh(&mesh, Mat4::identity(), &shader);
//! ```
//!
//! The pipeline is single-threaded and exception-free: degenerate triangles,
//! all-outside clips, and singular matrices drop the offending unit and the
//! frame continues.

pub mod foundation;
pub mod render;
pub mod assets;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData, ObjLoader, ObjOptions},
        foundation::{
            math::{Mat4, Vec2, Vec3, Vec4},
            time::{Stopwatch, Timer},
        },
        render::{
            camera::Camera,
            color::Color,
            framebuffer::{BufferManager, Framebuffer, PresentTarget},
            lighting::LightParams,
            mesh::{Mesh, Vertex},
            object::{Material, Object, Transformer},
            renderer::{CullMode, FrontFace, Renderer},
            shader::{
                BlinnPhongShader, ColorShader, PhongShader, Shader, TextureShader,
                TexturedBlinnPhongShader, VertexOutput, VertexShaderInput,
            },
            texture::{FilterMode, Texture, WrapMode},
        },
    };
}
