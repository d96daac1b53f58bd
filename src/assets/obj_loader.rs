//! OBJ file loader for triangle meshes
//!
//! Parses v/vt/vn/f records into a [`Mesh`]. V coordinates are flipped to
//! the top-left UV origin, quad faces split into two triangles, negative
//! indices resolve against the current attribute arrays, missing UVs are
//! synthesized from the vertex position, and missing normals are computed
//! per face after the load.

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::render::mesh::{Mesh, Vertex};
use crate::render::object::Object;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during OBJ file loading
#[derive(Error, Debug)]
pub enum ObjError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing OBJ file content
    #[error("parse error: {0}")]
    Parse(String),
    /// Structurally invalid or unsupported OBJ data
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Load-time adjustments
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjOptions {
    /// Negate every normal
    pub flip_normals: bool,
    /// Swap the second and third index of each triangle, reversing winding
    pub flip_faces: bool,
}

/// One parsed face corner before mesh assembly
struct FaceVertex {
    position: Vec3,
    uv: Vec2,
    normal: Option<Vec3>,
}

/// OBJ file loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file into an object with default material and transform
    pub fn load_object<P: AsRef<Path>>(path: P) -> Result<Object, ObjError> {
        Self::load_object_with_options(path, ObjOptions::default())
    }

    /// Load an OBJ file into an object, applying the given options
    pub fn load_object_with_options<P: AsRef<Path>>(
        path: P,
        options: ObjOptions,
    ) -> Result<Object, ObjError> {
        let mesh = Self::load_mesh_with_options(path, options)?;
        Ok(Object::from_mesh(mesh))
    }

    /// Load an OBJ file into a mesh
    pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh, ObjError> {
        Self::load_mesh_with_options(path, ObjOptions::default())
    }

    /// Load an OBJ file into a mesh, applying the given options
    pub fn load_mesh_with_options<P: AsRef<Path>>(
        path: P,
        options: ObjOptions,
    ) -> Result<Mesh, ObjError> {
        let file = File::open(path.as_ref())?;
        let mesh = Self::parse(BufReader::new(file), options)?;
        log::info!(
            "loaded OBJ {:?}: {} vertices, {} triangles{}{}",
            path.as_ref(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            if options.flip_normals { " (normals flipped)" } else { "" },
            if options.flip_faces { " (faces flipped)" } else { "" },
        );
        Ok(mesh)
    }

    /// Parse OBJ text from any buffered reader
    pub fn parse<R: BufRead>(reader: R, options: ObjOptions) -> Result<Mesh, ObjError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut texcoords: Vec<Vec2> = Vec::new();
        let mut normals: Vec<Vec3> = Vec::new();
        let mut faces: Vec<Vec<FaceVertex>> = Vec::new();
        let mut any_normals = false;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };

            match keyword {
                "v" => {
                    let (x, y, z) = parse_three(&mut parts, "vertex position")?;
                    positions.push(Vec3::new(x, y, z));
                }
                "vt" => {
                    let u = parse_float(parts.next(), "texture coordinate u")?;
                    let v = parse_float(parts.next(), "texture coordinate v")?;
                    // Flip V to the top-left origin convention
                    texcoords.push(Vec2::new(u, 1.0 - v));
                }
                "vn" => {
                    let (x, y, z) = parse_three(&mut parts, "normal")?;
                    normals.push(Vec3::new(x, y, z));
                }
                "f" => {
                    let mut corners = Vec::new();
                    for entry in parts {
                        let corner = parse_face_vertex(
                            entry,
                            &positions,
                            &texcoords,
                            &normals,
                            &mut any_normals,
                        )?;
                        corners.push(corner);
                    }
                    faces.push(corners);
                }
                // Groups, materials, smoothing: ignored
                _ => {}
            }
        }

        if positions.is_empty() || faces.is_empty() {
            return Err(ObjError::InvalidFormat(
                "OBJ file contains no usable geometry".to_string(),
            ));
        }

        Ok(build_mesh(faces, any_normals, options))
    }
}

fn parse_float(token: Option<&str>, what: &str) -> Result<f32, ObjError> {
    token
        .ok_or_else(|| ObjError::Parse(format!("missing {}", what)))?
        .parse()
        .map_err(|_| ObjError::Parse(format!("invalid {}", what)))
}

fn parse_three<'a, I: Iterator<Item = &'a str>>(
    parts: &mut I,
    what: &str,
) -> Result<(f32, f32, f32), ObjError> {
    let x = parse_float(parts.next(), what)?;
    let y = parse_float(parts.next(), what)?;
    let z = parse_float(parts.next(), what)?;
    Ok((x, y, z))
}

/// Resolve a 1-based or negative OBJ index against an attribute array
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    let resolved = if raw < 0 { len as i64 + raw } else { raw - 1 };
    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Parse one `v`, `v/vt`, `v//vn`, or `v/vt/vn` face corner
fn parse_face_vertex(
    entry: &str,
    positions: &[Vec3],
    texcoords: &[Vec2],
    normals: &[Vec3],
    any_normals: &mut bool,
) -> Result<FaceVertex, ObjError> {
    let mut fields = entry.split('/');

    let position_field = fields.next().unwrap_or("");
    let raw_position: i64 = position_field
        .parse()
        .map_err(|_| ObjError::Parse(format!("invalid position index '{}'", entry)))?;
    let position_index = resolve_index(raw_position, positions.len())
        .ok_or_else(|| ObjError::InvalidFormat(format!("position index out of bounds in '{}'", entry)))?;
    let position = positions[position_index];

    let uv = match fields.next().filter(|f| !f.is_empty()) {
        Some(field) => {
            let raw: i64 = field
                .parse()
                .map_err(|_| ObjError::Parse(format!("invalid texture index '{}'", entry)))?;
            match resolve_index(raw, texcoords.len()) {
                Some(index) => texcoords[index],
                None => synthesize_uv(position),
            }
        }
        // Without a UV, derive one from the position
        None => synthesize_uv(position),
    };

    let normal = match fields.next().filter(|f| !f.is_empty()) {
        Some(field) => {
            let raw: i64 = field
                .parse()
                .map_err(|_| ObjError::Parse(format!("invalid normal index '{}'", entry)))?;
            resolve_index(raw, normals.len()).map(|index| {
                *any_normals = true;
                normals[index]
            })
        }
        None => None,
    };

    Ok(FaceVertex { position, uv, normal })
}

/// UVs for meshes that ship without them: map x,y from [-1,1] into [0,1]
fn synthesize_uv(position: Vec3) -> Vec2 {
    Vec2::new((position.x + 1.0) * 0.5, (position.y + 1.0) * 0.5)
}

fn build_mesh(faces: Vec<Vec<FaceVertex>>, any_normals: bool, options: ObjOptions) -> Mesh {
    let mut mesh = Mesh::new();
    let white = Vec4::new(1.0, 1.0, 1.0, 1.0);

    let add_triangle = |mesh: &mut Mesh, corners: [&FaceVertex; 3]| {
        let order: [usize; 3] = if options.flip_faces { [0, 2, 1] } else { [0, 1, 2] };
        let base = mesh.vertex_count() as u32;
        for slot in order {
            let corner = corners[slot];
            let mut normal = corner.normal.unwrap_or(Vec3::new(0.0, 1.0, 0.0));
            if options.flip_normals {
                normal = -normal;
            }
            mesh.add_vertex(Vertex::new(
                Vec4::from_vec3(corner.position, 1.0),
                white,
                normal,
                corner.uv,
            ));
        }
        mesh.add_triangle(base, base + 1, base + 2);
    };

    for face in &faces {
        match face.len() {
            3 => add_triangle(&mut mesh, [&face[0], &face[1], &face[2]]),
            4 => {
                // Quads split along the 0-2 diagonal
                add_triangle(&mut mesh, [&face[0], &face[1], &face[2]]);
                add_triangle(&mut mesh, [&face[0], &face[2], &face[3]]);
            }
            _ => {
                log::warn!("ignoring face with {} vertices", face.len());
            }
        }
    }

    if !any_normals {
        mesh.calculate_normals();
        if options.flip_normals {
            for vertex in &mut mesh.vertices {
                vertex.normal = -vertex.normal;
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRIANGLE_OBJ: &str = "\
# simple triangle
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.5 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    const QUAD_OBJ: &str = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
f 1 2 3 4
";

    #[test]
    fn test_triangle_parses_with_attributes() {
        let mesh = ObjLoader::parse(Cursor::new(TRIANGLE_OBJ), ObjOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);

        // V is stored flipped: vt 0.5 1.0 becomes (0.5, 0.0)
        assert!((mesh.vertices[2].uv.x - 0.5).abs() < 1e-6);
        assert!(mesh.vertices[2].uv.y.abs() < 1e-6);
        assert!((mesh.vertices[0].normal.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quad_splits_into_two_triangles() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD_OBJ), ObjOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);

        // Split along the 0-2 diagonal: second triangle reuses corners 0 and 2
        assert_eq!(mesh.vertices[3].position, mesh.vertices[0].position);
        assert_eq!(mesh.vertices[4].position, mesh.vertices[2].position);
    }

    #[test]
    fn test_missing_uvs_are_synthesized_from_position() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD_OBJ), ObjOptions::default()).unwrap();
        // Position (-1, -1) maps to UV (0, 0); (1, 1) maps to (1, 1)
        assert!(mesh.vertices[0].uv.x.abs() < 1e-6);
        assert!(mesh.vertices[0].uv.y.abs() < 1e-6);
        assert!((mesh.vertices[2].uv.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_normals_are_computed_per_face() {
        let mesh = ObjLoader::parse(Cursor::new(QUAD_OBJ), ObjOptions::default()).unwrap();
        for vertex in &mesh.vertices {
            // CCW in the XY plane faces +Z
            assert!((vertex.normal.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_flip_faces_reverses_winding() {
        let options = ObjOptions { flip_faces: true, ..Default::default() };
        let flipped = ObjLoader::parse(Cursor::new(TRIANGLE_OBJ), options).unwrap();
        let normal = ObjLoader::parse(Cursor::new(TRIANGLE_OBJ), ObjOptions::default()).unwrap();

        assert_eq!(flipped.vertices[1].position, normal.vertices[2].position);
        assert_eq!(flipped.vertices[2].position, normal.vertices[1].position);
    }

    #[test]
    fn test_flip_normals_negates() {
        let options = ObjOptions { flip_normals: true, ..Default::default() };
        let mesh = ObjLoader::parse(Cursor::new(TRIANGLE_OBJ), options).unwrap();
        assert!((mesh.vertices[0].normal.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_indices_resolve_from_the_end() {
        let source = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f -3 -2 -1
";
        let mesh = ObjLoader::parse(Cursor::new(source), ObjOptions::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices[2].position.y, 1.0);
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let result = ObjLoader::parse(Cursor::new("# nothing here\n"), ObjOptions::default());
        assert!(matches!(result, Err(ObjError::InvalidFormat(_))));
    }

    #[test]
    fn test_out_of_bounds_position_index_is_an_error() {
        let source = "v 0 0 0\nf 1 2 3\n";
        let result = ObjLoader::parse(Cursor::new(source), ObjOptions::default());
        assert!(result.is_err());
    }
}
