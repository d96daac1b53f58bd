//! Rendering module - the software rasterization pipeline
//!
//! Contains the color/texture/mesh data model, the shader contract and its
//! built-in implementations, the double-buffered framebuffer, and the
//! rasterizer itself.

pub mod camera;
pub mod color;
pub mod framebuffer;
pub mod lighting;
pub mod mesh;
pub mod object;
pub mod renderer;
pub mod shader;
pub mod texture;

#[cfg(test)]
mod renderer_tests;

pub use camera::Camera;
pub use color::Color;
pub use framebuffer::{BufferManager, Framebuffer, PresentTarget};
pub use lighting::LightParams;
pub use mesh::{Mesh, Vertex};
pub use object::{Material, Object, Transformer};
pub use renderer::{CullMode, FrontFace, Renderer};
pub use shader::{Shader, VertexOutput, VertexShaderInput};
pub use texture::{FilterMode, Texture, WrapMode};
