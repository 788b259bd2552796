//! CAD Kernel Abstraction
//!
//! This crate provides the seam between the document core and the CAD kernel
//! that actually understands IGES, STEP and BRep files:
//! - The `CadKernel` trait (read/write shapes and assembly documents)
//! - Opaque shape handles, tessellated meshes and colors passed across it
//! - Kernel-side assembly documents (labels, components, references)
//! - The kernel-native progress indicator interface

pub mod assembly;
pub mod color;
pub mod kernel;
pub mod progress;
pub mod shape;

// Re-exports for convenience
pub use assembly::{AssemblyDocument, AssemblyLabel, LabelId, LabelKind};
pub use color::Color;
pub use kernel::{
    AssemblyFormat, AssemblyWriteOptions, CadError, CadKernel, CadResult, NullKernel,
    default_kernel,
};
pub use progress::{NoProgress, ProgressIndicator};
pub use shape::{Shape, ShapeType, TessellatedMesh, triangle_normal};
