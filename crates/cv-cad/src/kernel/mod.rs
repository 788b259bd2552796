//! CAD kernel interface

mod traits;

pub use traits::{
    AssemblyFormat, AssemblyWriteOptions, CadError, CadKernel, CadResult, NullKernel,
    default_kernel,
};
