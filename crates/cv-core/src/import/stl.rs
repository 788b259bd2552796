//! STL reader
//!
//! Binary files hold a single mesh. ASCII files may hold several
//! `solid ... endsolid` blocks, each becoming its own mesh.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use cv_cad::TessellatedMesh;

use super::ReadOutcome;
use crate::application::is_binary_stl;
use crate::document::DocumentItem;
use crate::error::IoError;
use crate::progress::ProgressSink;

/// Read an STL file into one mesh item per solid
pub(crate) fn read_stl(path: &Path, progress: &dyn ProgressSink) -> ReadOutcome {
    progress.set_step("Reading STL");
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return ReadOutcome::failed(e.into()),
    };
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();

    let binary = is_binary_stl(&bytes, bytes.len() as u64);
    let blocks = if binary {
        Vec::new()
    } else {
        solid_blocks(&bytes)
    };

    // Binary file, or text without any solid: one attempt on the whole content
    if blocks.is_empty() {
        if progress.is_abort_requested() {
            return ReadOutcome::failed(IoError::Cancelled);
        }
        let content = if binary {
            binary_header_cleared(&bytes)
        } else {
            Cow::Borrowed(bytes.as_slice())
        };
        return match parse_mesh(&content) {
            Ok(mesh) => {
                progress.set_value(100);
                ReadOutcome::complete(vec![DocumentItem::new_mesh(stem, mesh)])
            }
            Err(e) => ReadOutcome::failed(e),
        };
    }

    let count = blocks.len();
    let mut outcome = ReadOutcome::default();
    for (index, block) in blocks.into_iter().enumerate() {
        if progress.is_abort_requested() {
            outcome.error = Some(IoError::Cancelled);
            break;
        }

        match parse_mesh(&ascii_header_fixed(block.content)) {
            Ok(mesh) => {
                let label = match (block.name.is_empty(), count) {
                    (false, _) => block.name,
                    (true, 1) => stem.clone(),
                    (true, _) => format!("{}_{}", stem, index + 1),
                };
                outcome.items.push(DocumentItem::new_mesh(label, mesh));
            }
            Err(e) => {
                outcome.error = Some(e);
                break;
            }
        }
        progress.set_value(((index + 1) * 100 / count) as u8);
    }
    outcome
}

struct SolidBlock<'a> {
    name: String,
    content: &'a [u8],
}

/// Split ASCII content into `solid ... endsolid` blocks
///
/// An unterminated last block runs to the end of the content.
fn solid_blocks(bytes: &[u8]) -> Vec<SolidBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, String)> = None;
    let mut offset = 0;

    for line in bytes.split_inclusive(|b| *b == b'\n') {
        let trimmed = line.trim_ascii_start();
        if trimmed.starts_with(b"endsolid") {
            if let Some((start, name)) = open.take() {
                blocks.push(SolidBlock {
                    name,
                    content: &bytes[start..offset + line.len()],
                });
            }
        } else if open.is_none()
            && let Some(rest) = trimmed.strip_prefix(b"solid")
        {
            let name = String::from_utf8_lossy(rest).trim().to_string();
            open = Some((offset + line.len() - trimmed.len(), name));
        }
        offset += line.len();
    }

    if let Some((start, name)) = open {
        blocks.push(SolidBlock {
            name,
            content: &bytes[start..],
        });
    }
    blocks
}

/// Size of the free-form header of binary STL files
const BINARY_HEADER_LEN: usize = 80;

/// `stl_io` takes any content starting with `"solid "` for ASCII, which many
/// binary headers do
fn binary_header_cleared(content: &[u8]) -> Cow<'_, [u8]> {
    if !content.starts_with(b"solid") {
        return Cow::Borrowed(content);
    }
    let mut cleared = content.to_vec();
    let header = BINARY_HEADER_LEN.min(cleared.len());
    cleared[..header].fill(0);
    Cow::Owned(cleared)
}

/// `stl_io` only recognizes ASCII content starting with `"solid "`
fn ascii_header_fixed(content: &[u8]) -> Cow<'_, [u8]> {
    match content.strip_prefix(b"solid") {
        Some(rest) if !rest.starts_with(b" ") => {
            let mut fixed = b"solid ".to_vec();
            fixed.extend_from_slice(rest);
            Cow::Owned(fixed)
        }
        _ => Cow::Borrowed(content),
    }
}

fn parse_mesh(content: &[u8]) -> Result<TessellatedMesh, IoError> {
    let mesh = stl_io::read_stl(&mut Cursor::new(content))
        .map_err(|e| IoError::ReaderFailed(format!("Invalid STL data: {}", e)))?;

    Ok(TessellatedMesh {
        vertices: mesh.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect(),
        normals: Vec::new(),
        indices: mesh
            .faces
            .iter()
            .flat_map(|face| face.vertices.iter().map(|&i| i as u32))
            .collect(),
    })
}
