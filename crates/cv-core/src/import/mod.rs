//! Reader strategies
//!
//! Each supported format has a reader producing detached document items.
//! IGES, STEP and BRep content is read by the CAD kernel (through the
//! executor), STL content directly.

mod stl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cv_cad::{AssemblyFormat, CadResult};

use crate::application::PartFormat;
use crate::document::{AssemblyItem, DocumentItem};
use crate::error::{IoError, IoResult};
use crate::executor::{KernelHandle, KernelSession};
use crate::progress::{KernelProgressAdapter, ProgressSink};

/// Items produced by a reader, and the error that stopped it (if any)
///
/// Items read before a failure are kept.
#[derive(Debug, Default)]
pub struct ReadOutcome {
    pub items: Vec<DocumentItem>,
    pub error: Option<IoError>,
}

impl ReadOutcome {
    pub fn complete(items: Vec<DocumentItem>) -> Self {
        Self { items, error: None }
    }

    pub fn failed(error: IoError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error),
        }
    }

    fn from_result(result: IoResult<DocumentItem>) -> Self {
        match result {
            Ok(item) => Self::complete(vec![item]),
            Err(e) => Self::failed(e),
        }
    }
}

/// Read `path` as `format`
pub fn read_items(
    kernel: &KernelHandle,
    format: PartFormat,
    path: &Path,
    progress: Arc<dyn ProgressSink>,
) -> ReadOutcome {
    if progress.is_abort_requested() {
        return ReadOutcome::failed(IoError::Cancelled);
    }

    let label = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();

    match format {
        PartFormat::Unknown => ReadOutcome::failed(IoError::UnknownFormat),
        PartFormat::Iges => {
            ReadOutcome::from_result(read_assembly(kernel, AssemblyFormat::Iges, path, label, progress))
        }
        PartFormat::Step => {
            ReadOutcome::from_result(read_assembly(kernel, AssemblyFormat::Step, path, label, progress))
        }
        PartFormat::OccBrep => ReadOutcome::from_result(read_brep(kernel, path, label, progress)),
        PartFormat::Stl => stl::read_stl(path, progress.as_ref()),
    }
}

/// Run a kernel read with progress forwarding
fn run_kernel_read<T, F>(
    kernel: &KernelHandle,
    path: &Path,
    progress: Arc<dyn ProgressSink>,
    read: F,
) -> IoResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut KernelSession, &Path, &mut KernelProgressAdapter<'_>) -> CadResult<T>
        + Send
        + 'static,
{
    let path: PathBuf = path.to_path_buf();
    kernel
        .run(move |session| {
            let mut adapter = KernelProgressAdapter::new(progress.as_ref());
            read(session, &path, &mut adapter)
        })?
        .map_err(IoError::from_read)
}

fn read_assembly(
    kernel: &KernelHandle,
    format: AssemblyFormat,
    path: &Path,
    label: String,
    progress: Arc<dyn ProgressSink>,
) -> IoResult<DocumentItem> {
    progress.set_step(&format!("Reading {}", format.name()));
    let document = run_kernel_read(kernel, path, progress, move |session, path, adapter| {
        session.kernel().read_assembly(path, format, adapter)
    })?;

    let assembly = AssemblyItem::from_document(document)?;
    Ok(DocumentItem::new_assembly(label, assembly))
}

fn read_brep(
    kernel: &KernelHandle,
    path: &Path,
    label: String,
    progress: Arc<dyn ProgressSink>,
) -> IoResult<DocumentItem> {
    progress.set_step("Reading BRep");
    let shape = run_kernel_read(kernel, path, progress, |session, path, adapter| {
        session.kernel().read_shape(path, adapter)
    })?;
    Ok(DocumentItem::new_shape(label, shape, None))
}
