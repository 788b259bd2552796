//! Part file formats and content sniffing
//!
//! File extensions are only a hint. The sniffer looks at the first bytes of a
//! file (plus its total size) and is authoritative.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IoResult;
use crate::property::EnumChoice;

/// Supported part file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartFormat {
    #[default]
    Unknown,
    Iges,
    Step,
    /// Native BRep format of the CAD kernel
    OccBrep,
    Stl,
}

impl PartFormat {
    /// All known formats (excluding `Unknown`)
    pub const ALL: &'static [PartFormat] = &[
        PartFormat::Iges,
        PartFormat::Step,
        PartFormat::OccBrep,
        PartFormat::Stl,
    ];

    /// Get format name
    pub fn name(&self) -> &'static str {
        match self {
            PartFormat::Unknown => "Unknown",
            PartFormat::Iges => "IGES",
            PartFormat::Step => "STEP",
            PartFormat::OccBrep => "OCC BREP",
            PartFormat::Stl => "STL",
        }
    }

    /// File dialog filters
    pub fn filters(&self) -> &'static [&'static str] {
        match self {
            PartFormat::Unknown => &[],
            PartFormat::Iges => &["*.igs", "*.iges"],
            PartFormat::Step => &["*.stp", "*.step"],
            PartFormat::OccBrep => &["*.brep", "*.rle", "*.occ"],
            PartFormat::Stl => &["*.stl"],
        }
    }

    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> PartFormat {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return PartFormat::Unknown;
        };
        let extension = extension.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|format| {
                format
                    .filters()
                    .iter()
                    .any(|filter| filter.trim_start_matches("*.") == extension)
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Display for PartFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl EnumChoice for PartFormat {
    fn all() -> &'static [Self] {
        &[
            PartFormat::Unknown,
            PartFormat::Iges,
            PartFormat::Step,
            PartFormat::OccBrep,
            PartFormat::Stl,
        ]
    }

    fn code(self) -> i32 {
        self as i32
    }

    fn display_name(self) -> &'static str {
        self.name()
    }
}

/// Binary STL: 80 byte header, facet count, 50 bytes per facet
const STL_BINARY_HEADER_LEN: usize = 80;
const STL_BINARY_FACET_LEN: u64 = 50;

/// IGES start section: 'S' at column 73, sequence number in 74..80
const IGES_SECTION_COLUMN: usize = 72;
const IGES_SEQUENCE_RANGE: std::ops::Range<usize> = 73..80;
const IGES_LINE_END_COLUMN: usize = 80;

/// Classify file content
///
/// `prefix` is the beginning of the file, `total_size` its full length in
/// bytes. Checks run in a fixed order and the first match wins.
pub fn detect_part_format(prefix: &[u8], total_size: u64) -> PartFormat {
    if is_binary_stl(prefix, total_size) {
        return PartFormat::Stl;
    }

    if is_iges(prefix) {
        return PartFormat::Iges;
    }

    let text = skip_c_whitespace(prefix);
    if is_step(text) {
        PartFormat::Step
    } else if text.starts_with(b"DBRep_DrawableShape") {
        PartFormat::OccBrep
    } else if text.starts_with(b"solid") {
        PartFormat::Stl
    } else {
        PartFormat::Unknown
    }
}

/// Sniff the format of a file on disk, reading at most `sniff_len` bytes
pub fn find_part_format(path: &Path, sniff_len: usize) -> IoResult<PartFormat> {
    let file = std::fs::File::open(path)?;
    let total_size = file.metadata()?.len();

    let mut prefix = Vec::with_capacity(sniff_len);
    file.take(sniff_len as u64).read_to_end(&mut prefix)?;

    let format = detect_part_format(&prefix, total_size);
    tracing::debug!("Detected format of {}: {}", path.display(), format);
    Ok(format)
}

pub(crate) fn is_binary_stl(prefix: &[u8], total_size: u64) -> bool {
    let Some(count) = prefix.get(STL_BINARY_HEADER_LEN..STL_BINARY_HEADER_LEN + 4) else {
        return false;
    };
    let facet_count = u32::from_le_bytes([count[0], count[1], count[2], count[3]]);
    let expected = (STL_BINARY_HEADER_LEN as u64 + 4) + u64::from(facet_count) * STL_BINARY_FACET_LEN;
    expected == total_size
}

fn is_iges(prefix: &[u8]) -> bool {
    if prefix.len() <= IGES_LINE_END_COLUMN {
        return false;
    }

    prefix[IGES_SECTION_COLUMN] == b'S'
        && prefix[IGES_SEQUENCE_RANGE]
            .iter()
            .all(|c| c.is_ascii_digit() || *c == b' ')
        && matches!(prefix[IGES_LINE_END_COLUMN], b'\n' | b'\r' | 0x0c)
        && c_atoi(&prefix[IGES_SEQUENCE_RANGE.start..]) == 1
}

fn is_step(text: &[u8]) -> bool {
    let Some(rest) = text.strip_prefix(b"ISO-10303-21") else {
        return false;
    };
    let Some(rest) = skip_c_whitespace(rest).strip_prefix(b";") else {
        return false;
    };
    skip_c_whitespace(rest).starts_with(b"HEADER")
}

/// Whitespace as understood by C `isspace`
fn is_c_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn skip_c_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|c| !is_c_space(*c))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Integer parse with C `atoi` semantics: leading whitespace, optional sign,
/// digits up to the first non-digit, 0 when nothing parses
fn c_atoi(bytes: &[u8]) -> i64 {
    let bytes = skip_c_whitespace(bytes);
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, bytes),
    };

    let value = digits
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .fold(0i64, |acc, c| {
            acc.saturating_mul(10).saturating_add(i64::from(c - b'0'))
        });
    if negative { -value } else { value }
}
