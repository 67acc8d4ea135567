//! STL export for meshes over scanned clouds.
//!
//! A [`Mesh`] only stores indices, so every face is resolved against the
//! cloud it references while writing. Both STL variants are supported.
//!
//! # ASCII Format
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//!   ...
//! endsolid name
//! ```
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (0)
//! end
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use scan_types::{Mesh, Point, PointSource, Triangle, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::IoResult;

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// STL flavor to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StlFormat {
    /// Human-readable text.
    #[default]
    Ascii,
    /// Compact little-endian binary.
    Binary,
}

/// Save a mesh to an STL file, resolving faces against `source`.
///
/// The file is only created once every face has been resolved, so a stale
/// mesh never leaves a truncated file behind.
///
/// # Errors
///
/// Returns an error if a face references a point `source` does not have, or
/// if the file cannot be written.
///
/// # Example
///
/// ```no_run
/// use scan_io::{save_stl, StlFormat};
/// use scan_types::{Mesh, Point};
///
/// let points = vec![
///     Point::from_coords(0.0, 0.0, 0.0),
///     Point::from_coords(1.0, 0.0, 0.0),
///     Point::from_coords(0.0, 1.0, 0.0),
/// ];
/// let mesh = Mesh::new("scan", vec![[0, 1, 2]]);
/// save_stl(&mesh, &points, "scan.stl", StlFormat::Ascii).unwrap();
/// ```
pub fn save_stl<S, P>(mesh: &Mesh, source: &S, path: P, format: StlFormat) -> IoResult<()>
where
    S: PointSource + ?Sized,
    P: AsRef<Path>,
{
    let triangles = mesh.triangles(source).collect::<Result<Vec<_>, _>>()?;
    let writer = BufWriter::new(File::create(path)?);
    write_triangles(&triangles, mesh.cloud_name(), writer, format)
}

/// Write a mesh as STL to any writer, resolving faces against `source`.
///
/// # Errors
///
/// Returns an error if a face cannot be resolved or the writer fails.
pub fn write_stl<S, W>(mesh: &Mesh, source: &S, writer: W, format: StlFormat) -> IoResult<()>
where
    S: PointSource + ?Sized,
    W: Write,
{
    let triangles = mesh.triangles(source).collect::<Result<Vec<_>, _>>()?;
    write_triangles(&triangles, mesh.cloud_name(), writer, format)
}

fn write_triangles<W: Write>(
    triangles: &[Triangle],
    name: &str,
    mut writer: W,
    format: StlFormat,
) -> IoResult<()> {
    match format {
        StlFormat::Ascii => write_ascii(triangles, name, &mut writer)?,
        StlFormat::Binary => write_binary(triangles, name, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_ascii<W: Write>(triangles: &[Triangle], name: &str, writer: &mut W) -> IoResult<()> {
    let name = solid_name(name);
    writeln!(writer, "solid {name}")?;

    for tri in triangles {
        let n = tri.normal().unwrap_or_else(Vector3::zeros);
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in &tri.vertices {
            writeln!(
                writer,
                "      vertex {:.6e} {:.6e} {:.6e}",
                v.x(),
                v.y(),
                v.z()
            )?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid {name}")?;
    Ok(())
}

fn write_binary<W: Write>(triangles: &[Triangle], name: &str, writer: &mut W) -> IoResult<()> {
    let mut header = [b' '; HEADER_SIZE];
    let text = format!("binary STL of cloud {}", solid_name(name));
    let len = text.len().min(HEADER_SIZE);
    header[..len].copy_from_slice(&text.as_bytes()[..len]);
    writer.write_all(&header)?;

    #[allow(clippy::cast_possible_truncation)]
    // Face count: STL stores it as u32, meshes are indexed by u32 as well
    let face_count = triangles.len() as u32;
    writer.write_all(&face_count.to_le_bytes())?;

    for tri in triangles {
        let n = tri.normal().unwrap_or_else(Vector3::zeros);
        for value in [n.x, n.y, n.z] {
            writer.write_all(&value.to_le_bytes())?;
        }
        for v in &tri.vertices {
            write_vertex_binary(writer, v)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

fn write_vertex_binary<W: Write>(writer: &mut W, point: &Point) -> IoResult<()> {
    writer.write_all(&point.x().to_le_bytes())?;
    writer.write_all(&point.y().to_le_bytes())?;
    writer.write_all(&point.z().to_le_bytes())?;
    Ok(())
}

/// STL solid names are a single token.
fn solid_name(name: &str) -> String {
    let token: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if token.is_empty() {
        "mesh".to_string()
    } else {
        token
    }
}
