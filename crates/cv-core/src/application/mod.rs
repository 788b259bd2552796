//! Application context
//!
//! The `Application` owns every document, the kernel executor and the worker
//! pool used for background imports. Documents are only mutated on the
//! thread that owns the `Application`; background reads send detached items
//! back over a channel and are attached by `process_completed_tasks`.

mod format;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

use cv_cad::{CadKernel, default_kernel};

use crate::config::AppConfig;
use crate::document::{Document, DocumentId, DocumentItem, ItemId};
use crate::error::{AppError, IoError, IoResult};
use crate::event::{AppEvent, EventQueue};
use crate::executor::{KernelExecutor, KernelHandle};
use crate::export::{ExportEntity, ExportOptions, write_entities};
use crate::import::{ReadOutcome, read_items};
use crate::progress::ProgressSink;
use crate::tree::TreeNodeId;

pub use format::{PartFormat, detect_part_format, find_part_format};
pub(crate) use format::is_binary_stl;

/// Identifier of a background import
pub type TaskId = u64;

/// Something the application can export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationItem {
    /// Every root item of a document
    Document(DocumentId),
    Item(DocumentId, ItemId),
    /// One node of an assembly item
    Node(DocumentId, ItemId, TreeNodeId),
}

struct CompletedRead {
    task: TaskId,
    document: DocumentId,
    outcome: ReadOutcome,
}

/// The application context
pub struct Application {
    config: AppConfig,
    executor: KernelExecutor,
    pool: rayon::ThreadPool,
    documents: Vec<Document>,
    events: EventQueue,
    completed_tx: mpsc::Sender<CompletedRead>,
    completed_rx: mpsc::Receiver<CompletedRead>,
    next_task: TaskId,
    pending_tasks: usize,
}

impl Application {
    /// Create a new application with the default kernel
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        Self::with_kernel(config, default_kernel())
    }

    /// Create a new application driving `kernel`
    pub fn with_kernel(config: AppConfig, kernel: Box<dyn CadKernel>) -> Result<Self, AppError> {
        let executor =
            KernelExecutor::spawn(kernel).map_err(|e| AppError::WorkerPool(e.to_string()))?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("cv-worker-{}", i))
            .build()
            .map_err(|e| AppError::WorkerPool(e.to_string()))?;
        let (completed_tx, completed_rx) = mpsc::channel();

        tracing::info!(
            "Application started with kernel '{}' and {} worker threads",
            executor.kernel_name(),
            pool.current_num_threads()
        );

        Ok(Self {
            config,
            executor,
            pool,
            documents: Vec::new(),
            events: EventQueue::new(),
            completed_tx,
            completed_rx,
            next_task: 1,
            pending_tasks: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn kernel_handle(&self) -> KernelHandle {
        self.executor.handle()
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&self) -> Vec<AppEvent> {
        self.events.drain()
    }

    // ---- documents ----

    /// Create an empty document
    pub fn new_document(&mut self, label: impl Into<String>) -> DocumentId {
        self.add_document(Document::new(label, None, self.events.clone()))
    }

    /// Create a document named after `path` and import the file into it
    ///
    /// The document is kept even when the import fails.
    pub fn open_document(
        &mut self,
        path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> (DocumentId, IoResult<Vec<ItemId>>) {
        let label = file_label(path);
        let id = self.add_document(Document::new(label, Some(path), self.events.clone()));
        let result = self.import_file(id, path, progress);
        (id, result)
    }

    fn add_document(&mut self, document: Document) -> DocumentId {
        let id = document.id();
        tracing::info!("Document '{}' added ({})", document.label(), id);
        self.documents.push(document);
        self.events.push(AppEvent::DocumentAdded(id));
        id
    }

    /// Destroy a document and its items
    pub fn erase_document(&mut self, id: DocumentId) -> bool {
        let Some(index) = self.documents.iter().position(|d| d.id() == id) else {
            return false;
        };
        let document = self.documents.remove(index);
        tracing::info!("Document '{}' erased ({})", document.label(), id);
        self.events.push(AppEvent::DocumentErased(id));
        true
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id() == id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id() == id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    // ---- import ----

    /// Read `path` as `format` and attach the new items to `document`
    ///
    /// Items read before a failure stay attached, the error is still returned.
    pub fn import_in_document(
        &mut self,
        document: DocumentId,
        format: PartFormat,
        path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> IoResult<Vec<ItemId>> {
        if self.document(document).is_none() {
            return Err(IoError::DocumentNotFound(document));
        }

        tracing::info!("Importing {} as {}", path.display(), format);
        let outcome = read_items(&self.executor.handle(), format, path, progress);
        self.attach_outcome(document, outcome)
    }

    /// Sniff the format of `path`, then import it into `document`
    pub fn import_file(
        &mut self,
        document: DocumentId,
        path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> IoResult<Vec<ItemId>> {
        let format = find_part_format(path, self.config.sniff_len)?;
        if format == PartFormat::Unknown {
            tracing::warn!("Unknown format for {}", path.display());
            return Err(IoError::UnknownFormat);
        }
        self.import_in_document(document, format, path, progress)
    }

    fn attach_outcome(
        &mut self,
        document: DocumentId,
        outcome: ReadOutcome,
    ) -> IoResult<Vec<ItemId>> {
        let Some(doc) = self.document_mut(document) else {
            tracing::warn!(
                "Document {} is gone, {} imported items dropped",
                document,
                outcome.items.len()
            );
            return Err(IoError::DocumentNotFound(document));
        };

        let ids: Vec<ItemId> = outcome.items.into_iter().map(|item| doc.add_item(item)).collect();
        match outcome.error {
            None => {
                tracing::info!("Imported {} items into '{}'", ids.len(), doc.label());
                Ok(ids)
            }
            Some(e) => {
                if !ids.is_empty() {
                    tracing::warn!("Partial import into '{}': {} items kept", doc.label(), ids.len());
                }
                tracing::error!("Import failed: {}", e);
                Err(e)
            }
        }
    }

    // ---- background tasks ----

    /// Start an import on the worker pool
    ///
    /// The format is sniffed on the worker when `format` is `None`. The read
    /// items are attached by `process_completed_tasks` or `wait_for_tasks`.
    pub fn spawn_import(
        &mut self,
        document: DocumentId,
        format: Option<PartFormat>,
        path: impl Into<PathBuf>,
        progress: Arc<dyn ProgressSink>,
    ) -> TaskId {
        let task = self.next_task;
        self.next_task += 1;
        self.pending_tasks += 1;

        let path = path.into();
        let kernel = self.executor.handle();
        let sniff_len = self.config.sniff_len;
        let sender = self.completed_tx.clone();
        tracing::debug!("Task {} started for {}", task, path.display());

        self.pool.spawn(move || {
            let outcome = match format.map_or_else(|| find_part_format(&path, sniff_len), Ok) {
                Ok(PartFormat::Unknown) => ReadOutcome::failed(IoError::UnknownFormat),
                Ok(format) => read_items(&kernel, format, &path, progress),
                Err(e) => ReadOutcome::failed(e),
            };
            // The application may be shutting down
            let _ = sender.send(CompletedRead {
                task,
                document,
                outcome,
            });
        });
        task
    }

    pub fn pending_task_count(&self) -> usize {
        self.pending_tasks
    }

    /// Attach the items of every finished import, without blocking
    pub fn process_completed_tasks(&mut self) -> Vec<(TaskId, IoResult<Vec<ItemId>>)> {
        let mut results = Vec::new();
        while let Ok(completed) = self.completed_rx.try_recv() {
            results.push(self.finish_task(completed));
        }
        results
    }

    /// Block until every pending import has finished and attach their items
    pub fn wait_for_tasks(&mut self) -> Vec<(TaskId, IoResult<Vec<ItemId>>)> {
        let mut results = Vec::new();
        while self.pending_tasks > 0 {
            match self.completed_rx.recv() {
                Ok(completed) => results.push(self.finish_task(completed)),
                Err(_) => break,
            }
        }
        results
    }

    fn finish_task(&mut self, completed: CompletedRead) -> (TaskId, IoResult<Vec<ItemId>>) {
        self.pending_tasks = self.pending_tasks.saturating_sub(1);
        tracing::debug!("Task {} finished", completed.task);
        (
            completed.task,
            self.attach_outcome(completed.document, completed.outcome),
        )
    }

    // ---- export ----

    /// Write `items` to `path` as `format`
    pub fn export_application_items(
        &self,
        items: &[ApplicationItem],
        format: PartFormat,
        options: &ExportOptions,
        path: &Path,
        progress: Arc<dyn ProgressSink>,
    ) -> IoResult {
        let entities = self.resolve(items)?;
        tracing::info!(
            "Exporting {} entities to {} as {}",
            entities.len(),
            path.display(),
            format
        );

        let result = write_entities(
            &self.executor.handle(),
            &entities,
            format,
            options,
            path,
            progress,
        );
        if let Err(e) = &result {
            tracing::error!("Export to {} failed: {}", path.display(), e);
        }
        result
    }

    fn resolve(&self, items: &[ApplicationItem]) -> IoResult<Vec<ExportEntity<'_>>> {
        let mut entities = Vec::new();
        for item in items {
            match *item {
                ApplicationItem::Document(doc) => {
                    let document = self.find_document(doc)?;
                    entities.extend(document.items().map(ExportEntity::Item));
                }
                ApplicationItem::Item(doc, id) => {
                    entities.push(ExportEntity::Item(self.find_item(doc, id)?));
                }
                ApplicationItem::Node(doc, id, node) => {
                    entities.push(ExportEntity::Node(self.find_item(doc, id)?, node));
                }
            }
        }
        Ok(entities)
    }

    fn find_document(&self, id: DocumentId) -> IoResult<&Document> {
        self.document(id).ok_or(IoError::DocumentNotFound(id))
    }

    fn find_item(&self, doc: DocumentId, id: ItemId) -> IoResult<&DocumentItem> {
        self.find_document(doc)?
            .item(id)
            .ok_or(IoError::ItemNotFound(id))
    }
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use cv_cad::{
        AssemblyDocument, AssemblyFormat, AssemblyWriteOptions, CadError, CadResult,
        ProgressIndicator, Shape, ShapeType, TessellatedMesh,
    };
    use glam::DMat4;
    use parking_lot::Mutex;

    use crate::document::ItemKind;
    use crate::export::{StlFormat, StlWriterBackend};
    use crate::progress::{AbortOnProgress, NullProgress, ProgressTracker};

    const TRIANGLE_SOLID: &str = "solid part
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid part
";

    /// Kernel recording calls, reading every file as one solid
    #[derive(Default)]
    struct FakeKernel {
        written: Arc<Mutex<Vec<String>>>,
        reads: Arc<AtomicUsize>,
        /// Counter updated without synchronisation to detect overlapping calls
        unguarded: Arc<Mutex<usize>>,
    }

    impl FakeKernel {
        fn square() -> TessellatedMesh {
            TessellatedMesh {
                vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
                normals: Vec::new(),
                indices: vec![0, 1, 2],
            }
        }
    }

    impl CadKernel for FakeKernel {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn read_shape(
            &mut self,
            path: &Path,
            progress: &mut dyn ProgressIndicator,
        ) -> CadResult<Shape> {
            if path.ends_with("slow.brep") {
                for step in 0..=100 {
                    progress.show("Transfer", f64::from(step) / 100.0);
                    if progress.user_break() {
                        return Err(CadError::Aborted);
                    }
                }
            }

            // Split load and store: overlapping calls would lose increments
            let value = *self.unguarded.lock();
            std::thread::sleep(Duration::from_millis(2));
            *self.unguarded.lock() = value + 1;

            self.reads.fetch_add(1, Ordering::SeqCst);
            progress.show("Reading", 1.0);
            Ok(Shape::new(ShapeType::Solid))
        }

        fn read_assembly(
            &mut self,
            path: &Path,
            _format: AssemblyFormat,
            _progress: &mut dyn ProgressIndicator,
        ) -> CadResult<AssemblyDocument> {
            if path.ends_with("broken.step") {
                return Err(CadError::ReadFailed("Bad header".to_string()));
            }
            let mut document = AssemblyDocument::new();
            let part = document.add_simple("Part", Shape::new(ShapeType::Solid));
            let root = document.add_assembly("Root");
            let instance = document.add_reference("", part, DMat4::IDENTITY);
            document.add_component(root, instance);
            document.add_free_shape(root);
            Ok(document)
        }

        fn write_shape(
            &mut self,
            shape: &Shape,
            path: &Path,
            _progress: &mut dyn ProgressIndicator,
        ) -> CadResult<()> {
            self.written.lock().push(format!("brep {:?}", shape.shape_type));
            std::fs::write(path, b"DBRep_DrawableShape\n").map_err(|e| CadError::FileIo(e.to_string()))
        }

        fn write_assembly(
            &mut self,
            document: &AssemblyDocument,
            _path: &Path,
            format: AssemblyFormat,
            options: &AssemblyWriteOptions,
            _progress: &mut dyn ProgressIndicator,
        ) -> CadResult<()> {
            self.written.lock().push(format!(
                "{} {} labels, {} free, author {:?}",
                format.name(),
                document.len(),
                document.free_shapes().len(),
                options.author
            ));
            Ok(())
        }

        fn tessellate(&mut self, _shape: &Shape, _tolerance: f64) -> CadResult<TessellatedMesh> {
            Ok(Self::square())
        }

        fn make_compound(&mut self, shapes: &[Shape]) -> CadResult<Shape> {
            self.written.lock().push(format!("compound of {}", shapes.len()));
            Ok(Shape::new(ShapeType::Compound))
        }
    }

    fn fake_app() -> (Application, Arc<Mutex<Vec<String>>>) {
        let kernel = FakeKernel::default();
        let written = Arc::clone(&kernel.written);
        let config = AppConfig {
            worker_threads: 4,
            ..AppConfig::default()
        };
        let app = Application::with_kernel(config, Box::new(kernel)).unwrap();
        (app, written)
    }

    fn null() -> Arc<dyn ProgressSink> {
        Arc::new(NullProgress)
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_document_lifecycle_events() {
        let (mut app, _) = fake_app();
        let doc = app.new_document("Scratch");
        assert_eq!(app.document_count(), 1);
        assert_eq!(app.document(doc).unwrap().label(), "Scratch");
        assert!(app.erase_document(doc));
        assert!(!app.erase_document(doc));
        assert_eq!(
            app.drain_events(),
            vec![AppEvent::DocumentAdded(doc), AppEvent::DocumentErased(doc)]
        );
    }

    #[test]
    fn test_import_stl_attaches_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "part.stl", TRIANGLE_SOLID.as_bytes());
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        app.drain_events();

        let ids = app.import_file(doc, &path, null()).unwrap();
        assert_eq!(ids.len(), 1);
        let document = app.document(doc).unwrap();
        let item = document.item(ids[0]).unwrap();
        assert_eq!(item.kind(), ItemKind::Mesh);
        assert_eq!(item.label(), "part");
        assert_eq!(item.document(), Some(doc));
        assert_eq!(
            app.drain_events(),
            vec![AppEvent::ItemAdded {
                document: doc,
                item: ids[0]
            }]
        );
    }

    #[test]
    fn test_import_assembly_through_kernel() {
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        let ids = app
            .import_in_document(doc, PartFormat::Step, Path::new("car.step"), null())
            .unwrap();
        let item = app.document(doc).unwrap().item(ids[0]).unwrap();
        assert_eq!(item.kind(), ItemKind::Assembly);
        assert_eq!(item.label(), "car");
        let assembly = item.as_assembly().unwrap();
        assert_eq!(assembly.tree().len(), 3);

        let result = app.import_in_document(doc, PartFormat::Step, Path::new("broken.step"), null());
        assert!(matches!(result, Err(IoError::ReaderFailed(_))));
        assert_eq!(app.document(doc).unwrap().item_count(), 1);
    }

    #[test]
    fn test_import_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello world");
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        assert_eq!(app.import_file(doc, &path, null()), Err(IoError::UnknownFormat));
        assert_eq!(
            app.import_in_document(doc, PartFormat::Unknown, &path, null()),
            Err(IoError::UnknownFormat)
        );
    }

    #[test]
    fn test_import_into_missing_document() {
        let (mut app, _) = fake_app();
        let missing = DocumentId::new();
        assert_eq!(
            app.import_in_document(missing, PartFormat::Stl, Path::new("x.stl"), null()),
            Err(IoError::DocumentNotFound(missing))
        );
    }

    #[test]
    fn test_open_document_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bracket.stl", TRIANGLE_SOLID.as_bytes());
        let (mut app, _) = fake_app();
        let (doc, result) = app.open_document(&path, null());
        assert_eq!(result.unwrap().len(), 1);
        let document = app.document(doc).unwrap();
        assert_eq!(document.label(), "bracket");
        assert_eq!(document.file_path(), path.to_string_lossy());
    }

    #[test]
    fn test_cancelled_import() {
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        let tracker = Arc::new(ProgressTracker::new());
        tracker.request_abort();
        assert_eq!(
            app.import_in_document(doc, PartFormat::OccBrep, Path::new("a.brep"), tracker),
            Err(IoError::Cancelled)
        );
    }

    #[test]
    fn test_abort_while_kernel_reads() {
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        let progress = Arc::new(AbortOnProgress::new());
        assert_eq!(
            app.import_in_document(
                doc,
                PartFormat::OccBrep,
                Path::new("slow.brep"),
                progress.clone()
            ),
            Err(IoError::Cancelled)
        );
        assert_eq!(progress.tracker.step(), "Transfer");
        assert_eq!(progress.tracker.value(), 0);
        assert_eq!(app.document(doc).unwrap().item_count(), 0);
    }

    #[test]
    fn test_concurrent_imports_are_serialized() {
        const TASKS: usize = 16;
        let kernel = FakeKernel::default();
        let reads = Arc::clone(&kernel.reads);
        let unguarded = Arc::clone(&kernel.unguarded);
        let config = AppConfig {
            worker_threads: 8,
            ..AppConfig::default()
        };
        let mut app = Application::with_kernel(config, Box::new(kernel)).unwrap();
        let doc = app.new_document("Doc");

        let tasks: Vec<TaskId> = (0..TASKS)
            .map(|i| {
                app.spawn_import(
                    doc,
                    Some(PartFormat::OccBrep),
                    format!("part_{}.brep", i),
                    null(),
                )
            })
            .collect();
        assert_eq!(app.pending_task_count(), TASKS);

        let results = app.wait_for_tasks();
        assert_eq!(results.len(), TASKS);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert!(results.iter().all(|(task, _)| tasks.contains(task)));
        assert_eq!(app.pending_task_count(), 0);
        assert_eq!(app.document(doc).unwrap().item_count(), TASKS);
        assert_eq!(reads.load(Ordering::SeqCst), TASKS);
        assert_eq!(*unguarded.lock(), TASKS);
    }

    #[test]
    fn test_spawn_import_sniffs_format() {
        let dir = tempfile::tempdir().unwrap();
        let stl = write_file(&dir, "a.stl", TRIANGLE_SOLID.as_bytes());
        let text = write_file(&dir, "b.txt", b"plain text");
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");

        let ok = app.spawn_import(doc, None, &stl, null());
        let unknown = app.spawn_import(doc, None, &text, null());
        let mut results = app.wait_for_tasks();
        results.sort_by_key(|(task, _)| *task);
        assert_eq!(results[0].0, ok);
        assert_eq!(results[0].1.as_ref().map(Vec::len), Ok(1));
        assert_eq!(results[1], (unknown, Err(IoError::UnknownFormat)));
        assert!(app.process_completed_tasks().is_empty());
    }

    #[test]
    fn test_spawn_import_into_erased_document() {
        let dir = tempfile::tempdir().unwrap();
        let stl = write_file(&dir, "a.stl", TRIANGLE_SOLID.as_bytes());
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        app.spawn_import(doc, Some(PartFormat::Stl), &stl, null());
        app.erase_document(doc);

        let results = app.wait_for_tasks();
        assert_eq!(results[0].1, Err(IoError::DocumentNotFound(doc)));
    }

    #[test]
    fn test_export_stl_tessellates_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        app.import_in_document(doc, PartFormat::OccBrep, Path::new("a.brep"), null())
            .unwrap();
        app.import_in_document(doc, PartFormat::OccBrep, Path::new("b.brep"), null())
            .unwrap();

        let mut options = ExportOptions::default();
        options.stl.format = StlFormat::Ascii;
        let path = dir.path().join("out.stl");
        app.export_application_items(
            &[ApplicationItem::Document(doc)],
            PartFormat::Stl,
            &options,
            &path,
            null(),
        )
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("solid a\n"));
        assert!(text.contains("endsolid a\nsolid b\n"));
        assert_eq!(text.matches("endfacet").count(), 2);

        options.stl.backend = StlWriterBackend::Restricted;
        assert_eq!(
            app.export_application_items(
                &[ApplicationItem::Document(doc)],
                PartFormat::Stl,
                &options,
                &path,
                null()
            ),
            Err(IoError::UnsupportedMultiSolid)
        );
    }

    #[test]
    fn test_export_brep_compound() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, written) = fake_app();
        let doc = app.new_document("Doc");
        let a = app
            .import_in_document(doc, PartFormat::OccBrep, Path::new("a.brep"), null())
            .unwrap();
        app.import_in_document(doc, PartFormat::OccBrep, Path::new("b.brep"), null())
            .unwrap();
        let options = ExportOptions::default();
        let path = dir.path().join("out.brep");

        app.export_application_items(
            &[ApplicationItem::Item(doc, a[0])],
            PartFormat::OccBrep,
            &options,
            &path,
            null(),
        )
        .unwrap();
        app.export_application_items(
            &[ApplicationItem::Document(doc)],
            PartFormat::OccBrep,
            &options,
            &path,
            null(),
        )
        .unwrap();

        assert_eq!(
            *written.lock(),
            vec!["brep Solid", "compound of 2", "brep Compound"]
        );
    }

    #[test]
    fn test_export_step_wraps_shapes_and_keeps_assemblies() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, written) = fake_app();
        let doc = app.new_document("Doc");
        app.import_in_document(doc, PartFormat::Step, Path::new("car.step"), null())
            .unwrap();
        app.import_in_document(doc, PartFormat::OccBrep, Path::new("wheel.brep"), null())
            .unwrap();

        let mut options = ExportOptions::default();
        options.assembly.author = Some("Tester".to_string());
        app.export_application_items(
            &[ApplicationItem::Document(doc)],
            PartFormat::Step,
            &options,
            &dir.path().join("out.step"),
            null(),
        )
        .unwrap();

        assert_eq!(
            *written.lock(),
            vec!["STEP 4 labels, 2 free, author Some(\"Tester\")"]
        );
    }

    #[test]
    fn test_export_errors() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _) = fake_app();
        let doc = app.new_document("Doc");
        let path = dir.path().join("out.step");
        let options = ExportOptions::default();

        assert_eq!(
            app.export_application_items(
                &[ApplicationItem::Document(doc)],
                PartFormat::Step,
                &options,
                &path,
                null()
            ),
            Err(IoError::NothingToExport)
        );

        let missing = ItemId::new();
        assert_eq!(
            app.export_application_items(
                &[ApplicationItem::Item(doc, missing)],
                PartFormat::Step,
                &options,
                &path,
                null()
            ),
            Err(IoError::ItemNotFound(missing))
        );
        assert_eq!(
            app.export_application_items(
                &[ApplicationItem::Document(doc)],
                PartFormat::Unknown,
                &options,
                &path,
                null()
            ),
            Err(IoError::UnknownFormat)
        );
    }

    #[test]
    fn test_null_kernel_reports_unavailable() {
        let mut app = Application::new(AppConfig::default()).unwrap();
        let doc = app.new_document("Doc");
        let result = app.import_in_document(doc, PartFormat::Iges, Path::new("a.igs"), null());
        assert!(matches!(result, Err(IoError::ReaderFailed(msg)) if msg.contains("No CAD kernel")));
    }
}
