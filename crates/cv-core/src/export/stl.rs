//! STL writers

use std::fmt::Write as _;
use std::io::{BufWriter, Write};
use std::path::Path;

use cv_cad::{TessellatedMesh, triangle_normal};

use super::options::{FloatFormat, StlExportOptions, StlFormat, StlWriterBackend};
use crate::error::{IoError, IoResult};
use crate::progress::ProgressSink;

/// A named mesh written as one STL solid
#[derive(Debug, Clone)]
pub struct StlSolid {
    pub name: String,
    pub mesh: TessellatedMesh,
}

impl StlSolid {
    pub fn new(name: impl Into<String>, mesh: TessellatedMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
        }
    }
}

/// Write `solids` to `path` with the backend selected in `options`
pub fn write_stl(
    path: &Path,
    solids: &[StlSolid],
    options: &StlExportOptions,
    progress: &dyn ProgressSink,
) -> IoResult {
    if solids.is_empty() {
        return Err(IoError::NothingToExport);
    }

    match options.backend {
        StlWriterBackend::General => write_general(path, solids, options, progress),
        StlWriterBackend::Restricted => {
            let [solid] = solids else {
                return Err(IoError::UnsupportedMultiSolid);
            };
            write_single(path, solid, options.format, progress)
        }
    }
}

fn write_general(
    path: &Path,
    solids: &[StlSolid],
    options: &StlExportOptions,
    progress: &dyn ProgressSink,
) -> IoResult {
    match options.format {
        StlFormat::Binary => {
            let mut mesh = TessellatedMesh::new();
            for solid in solids {
                mesh.merge(&solid.mesh);
            }
            write_binary(path, &mesh, progress)
        }
        StlFormat::Ascii => {
            let notation = Notation::new(options.float_format, options.float_precision);
            write_ascii(path, solids, notation, progress)
        }
    }
}

fn write_single(
    path: &Path,
    solid: &StlSolid,
    format: StlFormat,
    progress: &dyn ProgressSink,
) -> IoResult {
    match format {
        StlFormat::Binary => write_binary(path, &solid.mesh, progress),
        StlFormat::Ascii => write_ascii(
            path,
            std::slice::from_ref(solid),
            Notation::new(FloatFormat::Shortest, 0),
            progress,
        ),
    }
}

fn write_binary(path: &Path, mesh: &TessellatedMesh, progress: &dyn ProgressSink) -> IoResult {
    progress.set_step("Writing binary STL");
    if progress.is_abort_requested() {
        return Err(IoError::Cancelled);
    }

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|tri| stl_io::Triangle {
            normal: stl_io::Normal::new(triangle_normal(&tri)),
            vertices: [
                stl_io::Vertex::new(tri[0]),
                stl_io::Vertex::new(tri[1]),
                stl_io::Vertex::new(tri[2]),
            ],
        })
        .collect();

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .map_err(|e| IoError::WriterFailed(e.to_string()))?;
    writer.flush()?;

    progress.set_value(100);
    Ok(())
}

/// Number of facets written between two abort checks
const ABORT_CHECK_INTERVAL: usize = 4096;

fn write_ascii(
    path: &Path,
    solids: &[StlSolid],
    notation: Notation,
    progress: &dyn ProgressSink,
) -> IoResult {
    progress.set_step("Writing ASCII STL");
    let total: usize = solids.iter().map(|s| s.mesh.triangle_count()).sum();
    let mut written = 0usize;

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut line = String::new();

    for solid in solids {
        writeln!(writer, "solid {}", solid.name)?;
        for tri in solid.mesh.triangles() {
            if written % ABORT_CHECK_INTERVAL == 0 {
                if progress.is_abort_requested() {
                    return Err(IoError::Cancelled);
                }
                if total > 0 {
                    progress.set_value((written * 100 / total) as u8);
                }
            }

            line.clear();
            notation.facet(&mut line, &tri);
            writer.write_all(line.as_bytes())?;
            written += 1;
        }
        writeln!(writer, "endsolid {}", solid.name)?;
    }

    writer.flush()?;
    progress.set_value(100);
    Ok(())
}

/// Float notation of ASCII output
#[derive(Debug, Clone, Copy)]
struct Notation {
    format: FloatFormat,
    precision: usize,
}

impl Notation {
    fn new(format: FloatFormat, precision: u8) -> Self {
        Self {
            format,
            precision: usize::from(precision),
        }
    }

    fn number(&self, out: &mut String, value: f32) {
        // Writing into a String cannot fail
        let _ = match self.format {
            FloatFormat::Fixed => write!(out, "{:.*}", self.precision, value),
            FloatFormat::Scientific => write!(out, "{:.*e}", self.precision, value),
            FloatFormat::Shortest => write!(out, "{}", value),
        };
    }

    fn triple(&self, out: &mut String, v: &[f32; 3]) {
        for (i, c) in v.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.number(out, *c);
        }
    }

    fn facet(&self, out: &mut String, tri: &[[f32; 3]; 3]) {
        out.push_str("  facet normal ");
        self.triple(out, &triangle_normal(tri));
        out.push_str("\n    outer loop\n");
        for v in tri {
            out.push_str("      vertex ");
            self.triple(out, v);
            out.push('\n');
        }
        out.push_str("    endloop\n  endfacet\n");
    }
}
