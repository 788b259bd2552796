//! Application configuration
//!
//! Stored as RON on disk. Missing fields fall back to their defaults so older
//! files keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cv_cad::AssemblyWriteOptions;

use crate::error::AppError;
use crate::export::StlExportOptions;

/// Default number of bytes read by the format sniffer
pub const DEFAULT_SNIFF_LEN: usize = 2048;

/// Default chordal tolerance used when a shape is tessellated for STL export
pub const DEFAULT_TESSELLATION_TOLERANCE: f64 = 0.01;

/// Settings of the document core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Threads of the background import pool (0 = one per CPU)
    pub worker_threads: usize,
    /// Bytes read from the start of a file for format detection
    pub sniff_len: usize,
    /// Defaults for STL export
    pub stl_export: StlExportOptions,
    /// Defaults for STEP/IGES export
    pub assembly_export: AssemblyWriteOptions,
    /// Tessellation tolerance for shapes exported as meshes
    pub tessellation_tolerance: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            sniff_len: DEFAULT_SNIFF_LEN,
            stl_export: StlExportOptions::default(),
            assembly_export: AssemblyWriteOptions::default(),
            tessellation_tolerance: DEFAULT_TESSELLATION_TOLERANCE,
        }
    }
}

impl AppConfig {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| AppError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse configuration from RON text
    pub fn from_ron(content: &str) -> Result<Self, AppError> {
        ron::from_str(content).map_err(|e| AppError::ConfigParse(e.to_string()))
    }

    /// Save configuration to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let content = self.to_ron()?;
        std::fs::write(path.as_ref(), content).map_err(|e| AppError::Io(e.to_string()))
    }

    /// Serialize configuration to pretty RON text
    pub fn to_ron(&self) -> Result<String, AppError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| AppError::ConfigSerialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{FloatFormat, StlFormat};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sniff_len, 2048);
        assert_eq!(config.worker_threads, 0);
        assert_eq!(config.stl_export.format, StlFormat::Binary);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadview.ron");

        let mut config = AppConfig::default();
        config.worker_threads = 3;
        config.stl_export.format = StlFormat::Ascii;
        config.stl_export.float_format = FloatFormat::Scientific;
        config.assembly_export.author = Some("Jane".into());
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_ron("(sniff_len: 512)").unwrap();
        assert_eq!(config.sniff_len, 512);
        assert_eq!(config.tessellation_tolerance, DEFAULT_TESSELLATION_TOLERANCE);
    }

    #[test]
    fn test_invalid_file() {
        assert!(matches!(
            AppConfig::from_ron("(sniff_len: \"many\")"),
            Err(AppError::ConfigParse(_))
        ));
        assert!(matches!(
            AppConfig::load("/nonexistent/cadview.ron"),
            Err(AppError::Io(_))
        ));
    }
}
