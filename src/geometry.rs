//! Mesh geometry analysis backing routing decisions.
//!
//! Supports both ASCII and binary STL. Analysis is a pure function of
//! the file contents: no state, deterministic, safe to call from
//! concurrent tasks. Dimensions are cheap to recompute and are never
//! persisted.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Binary STL header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle record in binary STL (normal + 3 vertices +
/// attribute count).
const TRIANGLE_SIZE: usize = 50;

/// A mesh volume below this is treated as degenerate.
const MIN_VOLUME: f64 = 1e-6;

type Triangle = [[f32; 3]; 3];

/// Bounding dimensions and bulk metrics of one model file. Derived,
/// immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelDimensions {
    /// Extent along x, millimeters.
    pub width: f64,
    /// Extent along y, millimeters.
    pub depth: f64,
    /// Extent along z, millimeters.
    pub height: f64,
    /// Largest of the three extents.
    pub max_dimension: f64,
    /// Enclosed volume, cubic millimeters.
    pub volume: f64,
    /// Total surface area, square millimeters.
    pub surface_area: f64,
    /// Lower corner of the bounding box.
    pub min_bound: [f64; 3],
    /// Upper corner of the bounding box.
    pub max_bound: [f64; 3],
}

/// Analyze a model file.
///
/// Fails with [Error::NotFound] when the file is absent and
/// [Error::InvalidGeometry] when the mesh cannot be parsed or has
/// degenerate bounds (zero volume).
pub fn analyze(path: &Path) -> Result<ModelDimensions, Error> {
    let triangles = load_triangles(path)?;
    dimensions_of(&triangles)
}

/// Write a uniformly scaled copy of a model.
///
/// The scale factor is `target_dimension / max_dimension` of the source;
/// the source file is never mutated. Returns the dimensions of the
/// scaled mesh, computed by the same bounds analysis [analyze] uses, so
/// downstream fit checks agree with it.
pub fn scale(path: &Path, target_dimension: f64, output: &Path) -> Result<ModelDimensions, Error> {
    if target_dimension <= 0.0 {
        return Err(Error::InvalidGeometry(format!(
            "target dimension must be positive, got {}",
            target_dimension
        )));
    }

    let triangles = load_triangles(path)?;
    let dims = dimensions_of(&triangles)?;
    let factor = (target_dimension / dims.max_dimension) as f32;

    let scaled: Vec<Triangle> = triangles
        .iter()
        .map(|tri| tri.map(|v| v.map(|c| c * factor)))
        .collect();

    write_binary_stl(output, &scaled)?;
    dimensions_of(&scaled)
}

fn load_triangles(path: &Path) -> Result<Vec<Triangle>, Error> {
    let bytes = std::fs::read(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::InvalidGeometry(format!("cannot read {}: {}", path.display(), err))
        }
    })?;

    if looks_ascii(&bytes) {
        parse_ascii(&bytes)
    } else {
        parse_binary(&bytes)
    }
}

/// ASCII files start with "solid", but some binary exporters put "solid"
/// in the 80-byte header too. Trust "solid" only when the binary length
/// arithmetic does not add up.
fn looks_ascii(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(HEADER_SIZE)]);
    if !head.trim_start().starts_with("solid") {
        return false;
    }
    if bytes.len() < HEADER_SIZE + 4 {
        return true;
    }
    let count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]) as usize;
    bytes.len() != HEADER_SIZE + 4 + count * TRIANGLE_SIZE
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Triangle>, Error> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(Error::InvalidGeometry(
            "file too small to be a binary stl".to_owned(),
        ));
    }

    let count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]) as usize;

    let expected = HEADER_SIZE + 4 + count * TRIANGLE_SIZE;
    if bytes.len() < expected {
        return Err(Error::InvalidGeometry(format!(
            "binary stl truncated: {} triangles declared, {} bytes present",
            count,
            bytes.len()
        )));
    }

    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        // Skip the 12-byte normal; it is recomputed when needed.
        let base = HEADER_SIZE + 4 + i * TRIANGLE_SIZE + 12;
        let mut tri: Triangle = [[0.0; 3]; 3];
        for (v, vertex) in tri.iter_mut().enumerate() {
            for (c, coord) in vertex.iter_mut().enumerate() {
                let at = base + (v * 3 + c) * 4;
                *coord = f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
            }
        }
        triangles.push(tri);
    }

    Ok(triangles)
}

fn parse_ascii(bytes: &[u8]) -> Result<Vec<Triangle>, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::InvalidGeometry("ascii stl is not valid utf-8".to_owned()))?;

    let mut triangles = Vec::new();
    let mut pending: Vec<[f32; 3]> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("vertex") => {
                let mut vertex = [0.0f32; 3];
                for coord in vertex.iter_mut() {
                    *coord = tokens
                        .next()
                        .and_then(|t| t.parse().ok())
                        .ok_or_else(|| {
                            Error::InvalidGeometry(format!(
                                "bad vertex on line {}",
                                line_no + 1
                            ))
                        })?;
                }
                pending.push(vertex);
            }
            Some("endfacet") => {
                if pending.len() != 3 {
                    return Err(Error::InvalidGeometry(format!(
                        "facet ending on line {} has {} vertices",
                        line_no + 1,
                        pending.len()
                    )));
                }
                triangles.push([pending[0], pending[1], pending[2]]);
                pending.clear();
            }
            _ => {}
        }
    }

    Ok(triangles)
}

fn dimensions_of(triangles: &[Triangle]) -> Result<ModelDimensions, Error> {
    if triangles.is_empty() {
        return Err(Error::InvalidGeometry("mesh has no triangles".to_owned()));
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    let mut signed_volume = 0.0f64;
    let mut area = 0.0f64;

    for tri in triangles {
        let v: Vec<[f64; 3]> = tri.iter().map(|p| p.map(f64::from)).collect();
        for p in &v {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        let e1 = sub(v[1], v[0]);
        let e2 = sub(v[2], v[0]);
        let n = cross(e1, e2);
        area += norm(n) / 2.0;

        // Signed tetrahedron volume against the origin; the sum over a
        // closed mesh is the enclosed volume.
        signed_volume += dot(v[0], cross(v[1], v[2])) / 6.0;
    }

    let volume = signed_volume.abs();
    let width = max[0] - min[0];
    let depth = max[1] - min[1];
    let height = max[2] - min[2];
    let max_dimension = width.max(depth).max(height);

    if volume < MIN_VOLUME || max_dimension <= 0.0 {
        return Err(Error::InvalidGeometry(
            "degenerate bounds: mesh encloses no volume".to_owned(),
        ));
    }

    Ok(ModelDimensions {
        width,
        depth,
        height,
        max_dimension,
        volume,
        surface_area: area,
        min_bound: min,
        max_bound: max,
    })
}

fn write_binary_stl(path: &Path, triangles: &[Triangle]) -> Result<(), Error> {
    let mut out = Vec::with_capacity(HEADER_SIZE + 4 + triangles.len() * TRIANGLE_SIZE);
    let mut header = [0u8; HEADER_SIZE];
    let tag = b"scaled mesh";
    header[..tag.len()].copy_from_slice(tag);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    for tri in triangles {
        let e1 = sub(tri[1].map(f64::from), tri[0].map(f64::from));
        let e2 = sub(tri[2].map(f64::from), tri[0].map(f64::from));
        let n = normalize(cross(e1, e2));
        for c in n {
            out.extend_from_slice(&(c as f32).to_le_bytes());
        }
        for vertex in tri {
            for c in vertex {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }

    let mut file = std::fs::File::create(path)
        .map_err(|err| Error::InvalidGeometry(format!("cannot create {}: {}", path.display(), err)))?;
    file.write_all(&out)
        .map_err(|err| Error::InvalidGeometry(format!("cannot write {}: {}", path.display(), err)))?;
    Ok(())
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn normalize(a: [f64; 3]) -> [f64; 3] {
    let n = norm(a);
    if n == 0.0 {
        return [0.0; 3];
    }
    [a[0] / n, a[1] / n, a[2] / n]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Canonical outward-wound triangulation of an axis-aligned cube
    /// with one corner at the origin.
    pub(crate) fn cube_triangles(size: f32) -> Vec<Triangle> {
        let s = size;
        vec![
            // -z
            [[0.0, 0.0, 0.0], [s, s, 0.0], [s, 0.0, 0.0]],
            [[0.0, 0.0, 0.0], [0.0, s, 0.0], [s, s, 0.0]],
            // +z
            [[0.0, 0.0, s], [s, 0.0, s], [s, s, s]],
            [[0.0, 0.0, s], [s, s, s], [0.0, s, s]],
            // -y
            [[0.0, 0.0, 0.0], [s, 0.0, 0.0], [s, 0.0, s]],
            [[0.0, 0.0, 0.0], [s, 0.0, s], [0.0, 0.0, s]],
            // +y
            [[0.0, s, 0.0], [s, s, s], [s, s, 0.0]],
            [[0.0, s, 0.0], [0.0, s, s], [s, s, s]],
            // -x
            [[0.0, 0.0, 0.0], [0.0, 0.0, s], [0.0, s, s]],
            [[0.0, 0.0, 0.0], [0.0, s, s], [0.0, s, 0.0]],
            // +x
            [[s, 0.0, 0.0], [s, s, 0.0], [s, s, s]],
            [[s, 0.0, 0.0], [s, s, s], [s, 0.0, s]],
        ]
    }

    /// Write a binary STL cube of the given edge length.
    pub(crate) fn write_cube_stl(path: &Path, size: f32) {
        write_binary_stl(path, &cube_triangles(size)).unwrap();
    }
}
