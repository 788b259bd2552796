//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assembly::AssemblyDocument;
use crate::progress::ProgressIndicator;
use crate::shape::{Shape, TessellatedMesh};

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Operation aborted")]
    Aborted,
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// Exchange formats carrying an assembly structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssemblyFormat {
    Iges,
    Step,
}

impl AssemblyFormat {
    /// Get format name
    pub fn name(&self) -> &'static str {
        match self {
            AssemblyFormat::Iges => "IGES",
            AssemblyFormat::Step => "STEP",
        }
    }
}

/// Options for assembly (STEP/IGES) export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyWriteOptions {
    /// Author name in the file header
    pub author: Option<String>,
    /// Organization name in the file header
    pub organization: Option<String>,
}

/// The CAD kernel trait
///
/// Implementations own global state that is not safe for concurrent use, so
/// every operation takes `&mut self`. Callers are expected to funnel all
/// kernel access through a single owner (see the executor in `cv-core`).
pub trait CadKernel: Send {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Read a native BRep file into a single shape
    fn read_shape(&mut self, path: &Path, progress: &mut dyn ProgressIndicator)
    -> CadResult<Shape>;

    /// Read a STEP/IGES file into an assembly document
    fn read_assembly(
        &mut self,
        path: &Path,
        format: AssemblyFormat,
        progress: &mut dyn ProgressIndicator,
    ) -> CadResult<AssemblyDocument>;

    /// Write a single shape to a native BRep file
    fn write_shape(
        &mut self,
        shape: &Shape,
        path: &Path,
        progress: &mut dyn ProgressIndicator,
    ) -> CadResult<()>;

    /// Write an assembly document to a STEP/IGES file
    fn write_assembly(
        &mut self,
        document: &AssemblyDocument,
        path: &Path,
        format: AssemblyFormat,
        options: &AssemblyWriteOptions,
        progress: &mut dyn ProgressIndicator,
    ) -> CadResult<()>;

    /// Tessellate a shape into triangles
    ///
    /// # Arguments
    /// * `shape` - The shape to tessellate
    /// * `tolerance` - The tessellation tolerance (lower = more triangles)
    fn tessellate(&mut self, shape: &Shape, tolerance: f64) -> CadResult<TessellatedMesh>;

    /// Group shapes into one compound
    fn make_compound(&mut self, shapes: &[Shape]) -> CadResult<Shape>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>(what: &str) -> CadResult<T> {
        Err(CadError::KernelNotAvailable(format!(
            "No CAD kernel available for {}",
            what
        )))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn read_shape(
        &mut self,
        _path: &Path,
        _progress: &mut dyn ProgressIndicator,
    ) -> CadResult<Shape> {
        Self::unavailable("BRep import")
    }

    fn read_assembly(
        &mut self,
        _path: &Path,
        format: AssemblyFormat,
        _progress: &mut dyn ProgressIndicator,
    ) -> CadResult<AssemblyDocument> {
        Self::unavailable(&format!("{} import", format.name()))
    }

    fn write_shape(
        &mut self,
        _shape: &Shape,
        _path: &Path,
        _progress: &mut dyn ProgressIndicator,
    ) -> CadResult<()> {
        Self::unavailable("BRep export")
    }

    fn write_assembly(
        &mut self,
        _document: &AssemblyDocument,
        _path: &Path,
        format: AssemblyFormat,
        _options: &AssemblyWriteOptions,
        _progress: &mut dyn ProgressIndicator,
    ) -> CadResult<()> {
        Self::unavailable(&format!("{} export", format.name()))
    }

    fn tessellate(&mut self, _shape: &Shape, _tolerance: f64) -> CadResult<TessellatedMesh> {
        Self::unavailable("tessellation")
    }

    fn make_compound(&mut self, _shapes: &[Shape]) -> CadResult<Shape> {
        Self::unavailable("compound creation")
    }
}

/// Get the default CAD kernel
///
/// No geometry backend is bundled with this crate; applications register
/// their own kernel and fall back to `NullKernel` otherwise.
pub fn default_kernel() -> Box<dyn CadKernel> {
    tracing::debug!("No CAD kernel backend compiled in, using null kernel");
    Box::new(NullKernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::shape::ShapeType;

    #[test]
    fn test_null_kernel_reports_unavailable() {
        let mut kernel = NullKernel;
        assert!(!kernel.is_available());
        assert_eq!(kernel.name(), "null");

        let err = kernel
            .read_assembly(Path::new("a.step"), AssemblyFormat::Step, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, CadError::KernelNotAvailable(_)));
        assert!(err.to_string().contains("STEP import"));

        let shape = Shape::new(ShapeType::Solid);
        assert!(kernel.tessellate(&shape, 0.1).is_err());
        assert!(
            kernel
                .write_shape(&shape, Path::new("a.brep"), &mut NoProgress)
                .is_err()
        );
    }

    #[test]
    fn test_default_kernel_is_null() {
        let kernel = default_kernel();
        assert_eq!(kernel.name(), "null");
    }
}
