//! Vertex and mesh geometry
//!
//! A vertex bundles a homogeneous position with color, normal, and UV
//! attributes; a mesh is an append-only vertex array plus triangle index
//! triples.

use crate::foundation::math::{Vec2, Vec3, Vec4};

/// A single vertex with position, color, normal, and texture coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Homogeneous position
    pub position: Vec4,
    /// Vertex color
    pub color: Vec4,
    /// Surface normal
    pub normal: Vec3,
    /// Texture coordinates
    pub uv: Vec2,
}

impl Vertex {
    /// Create a vertex from all attributes
    pub fn new(position: Vec4, color: Vec4, normal: Vec3, uv: Vec2) -> Self {
        Self { position, color, normal, uv }
    }

    /// Create a vertex with only a position
    pub fn from_position(position: Vec4) -> Self {
        Self { position, ..Default::default() }
    }

    /// Create a vertex with position and color
    pub fn with_color(position: Vec4, color: Vec4) -> Self {
        Self { position, color, ..Default::default() }
    }

    /// Linearly interpolate all attributes; the normal is renormalized
    pub fn lerp(a: &Vertex, b: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: Vec4::lerp(a.position, b.position, t),
            color: Vec4::lerp(a.color, b.color, t),
            normal: Vec3::lerp(a.normal, b.normal, t).normalized(),
            uv: Vec2::lerp(a.uv, b.uv, t),
        }
    }
}

/// Indexed triangle mesh
///
/// Triangles are `[u32; 3]` index triples into the vertex array. Counting is
/// triangle-based throughout; there is no separate raw-index count.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle index triples
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from existing vertex and triangle data
    pub fn from_parts(vertices: Vec<Vertex>, triangles: Vec<[u32; 3]>) -> Self {
        Self { vertices, triangles }
    }

    /// Append a vertex, returning its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    /// Append a triangle by three vertex indices
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.triangles.push([i0, i1, i2]);
    }

    /// Remove all vertices and triangles
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounding box of the vertex positions
    ///
    /// Returns `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.vertices.first()?;
        let mut min = first.position.xyz();
        let mut max = min;
        for vertex in &self.vertices {
            let p = vertex.position.xyz();
            min = Vec3::min(min, p);
            max = Vec3::max(max, p);
        }
        Some((min, max))
    }

    /// Mean of all vertex positions
    pub fn center(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        for vertex in &self.vertices {
            sum += vertex.position.xyz();
        }
        sum / self.vertices.len() as f32
    }

    /// Bounding sphere around the mesh center
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        let center = self.center();
        let mut radius = 0.0f32;
        for vertex in &self.vertices {
            let distance = (vertex.position.xyz() - center).length();
            if distance > radius {
                radius = distance;
            }
        }
        (center, radius)
    }

    /// Recompute vertex normals as face-weighted averages
    ///
    /// Every vertex normal is zeroed, each triangle's face normal is added to
    /// its three corners, and the results are normalized. Triangles with
    /// out-of-range indices are skipped.
    pub fn calculate_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = Vec3::ZERO;
        }

        for triangle in &self.triangles {
            let [i0, i1, i2] = *triangle;
            let (i0, i1, i2) = (i0 as usize, i1 as usize, i2 as usize);
            if i0 >= self.vertices.len() || i1 >= self.vertices.len() || i2 >= self.vertices.len() {
                continue;
            }

            let p0 = self.vertices[i0].position.xyz();
            let p1 = self.vertices[i1].position.xyz();
            let p2 = self.vertices[i2].position.xyz();

            let face_normal = (p1 - p0).cross(p2 - p0).normalized();

            self.vertices[i0].normal += face_normal;
            self.vertices[i1].normal += face_normal;
            self.vertices[i2].normal += face_normal;
        }

        for vertex in &mut self.vertices {
            vertex.normal = vertex.normal.normalized();
        }
    }
}
