//! Writer strategies
//!
//! IGES, STEP and BRep files are written by the CAD kernel, STL files by the
//! writers of this module (shapes are tessellated by the kernel first).

mod options;
mod stl;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cv_cad::{
    AssemblyDocument, AssemblyFormat, AssemblyLabel, Color, LabelId, LabelKind, Shape,
    TessellatedMesh,
};

use crate::application::PartFormat;
use crate::document::{AssemblyItem, DocumentItem, ItemContent, ItemId};
use crate::error::{IoError, IoResult};
use crate::executor::KernelHandle;
use crate::progress::{KernelProgressAdapter, ProgressSink};
use crate::tree::TreeNodeId;

pub use options::{
    ExportOptions, FloatFormat, MAX_FLOAT_PRECISION, MIN_FLOAT_PRECISION, StlExportOptions,
    StlExportParameters, StlFormat, StlWriterBackend,
};
pub use stl::{StlSolid, write_stl};

/// Something to export: a whole item or one node of an assembly item
#[derive(Debug, Clone, Copy)]
pub enum ExportEntity<'a> {
    Item(&'a DocumentItem),
    Node(&'a DocumentItem, TreeNodeId),
}

impl ExportEntity<'_> {
    fn label(&self) -> &str {
        match self {
            ExportEntity::Item(item) => item.label(),
            ExportEntity::Node(item, node) => item
                .as_assembly()
                .map(|assembly| assembly.node_name(*node))
                .unwrap_or_default(),
        }
    }
}

/// Write `entities` to `path` as `format`
pub fn write_entities(
    kernel: &KernelHandle,
    entities: &[ExportEntity<'_>],
    format: PartFormat,
    options: &ExportOptions,
    path: &Path,
    progress: Arc<dyn ProgressSink>,
) -> IoResult {
    if progress.is_abort_requested() {
        return Err(IoError::Cancelled);
    }

    match format {
        PartFormat::Unknown => Err(IoError::UnknownFormat),
        PartFormat::Iges => {
            write_assembly(kernel, entities, AssemblyFormat::Iges, options, path, progress)
        }
        PartFormat::Step => {
            write_assembly(kernel, entities, AssemblyFormat::Step, options, path, progress)
        }
        PartFormat::OccBrep => write_brep(kernel, entities, path, progress),
        PartFormat::Stl => write_stl_entities(kernel, entities, options, path, progress),
    }
}

fn write_assembly(
    kernel: &KernelHandle,
    entities: &[ExportEntity<'_>],
    format: AssemblyFormat,
    options: &ExportOptions,
    path: &Path,
    progress: Arc<dyn ProgressSink>,
) -> IoResult {
    let document = assembly_document(entities, format);
    if document.free_shapes().is_empty() {
        return Err(IoError::NothingToExport);
    }

    progress.set_step(&format!("Writing {}", format.name()));
    let write_options = options.assembly.clone();
    let path: PathBuf = path.to_path_buf();
    kernel
        .run(move |session| {
            let mut adapter = KernelProgressAdapter::new(progress.as_ref());
            session
                .kernel()
                .write_assembly(&document, &path, format, &write_options, &mut adapter)
        })?
        .map_err(IoError::from_write)
}

/// Gather `entities` into one kernel assembly document
///
/// The label table of an assembly item is copied once, however many of its
/// nodes are exported.
fn assembly_document(entities: &[ExportEntity<'_>], format: AssemblyFormat) -> AssemblyDocument {
    let mut document = AssemblyDocument::new();
    let mut offsets: HashMap<ItemId, u32> = HashMap::new();
    for entity in entities {
        match (entity, entity_content(entity)) {
            (ExportEntity::Item(item), ItemContent::Shape(shape)) => {
                let id = document.add_simple(item.label(), shape.shape().clone());
                if let Some(label) = document.label_mut(id) {
                    label.color = item.shape_color();
                }
                add_free_shape(&mut document, id);
            }
            (_, ItemContent::Mesh(_)) => {
                tracing::warn!(
                    "Mesh '{}' cannot be written as {}, skipped",
                    entity.label(),
                    format.name()
                );
            }
            (ExportEntity::Item(item), ItemContent::Assembly(assembly)) => {
                let offset = *offsets
                    .entry(item.id())
                    .or_insert_with(|| merge_labels(&mut document, assembly.document()));
                for &free in assembly.document().free_shapes() {
                    add_free_shape(&mut document, shifted(free, offset));
                }
            }
            (ExportEntity::Node(item, node), ItemContent::Assembly(assembly)) => {
                if let Some(label) = assembly.node_label(*node) {
                    let offset = *offsets
                        .entry(item.id())
                        .or_insert_with(|| merge_labels(&mut document, assembly.document()));
                    add_free_shape(&mut document, shifted(label, offset));
                }
            }
            (ExportEntity::Node(..), ItemContent::Shape(_)) => {}
        }
    }
    document
}

fn add_free_shape(document: &mut AssemblyDocument, id: LabelId) {
    if !document.free_shapes().contains(&id) {
        document.add_free_shape(id);
    }
}

fn write_brep(
    kernel: &KernelHandle,
    entities: &[ExportEntity<'_>],
    path: &Path,
    progress: Arc<dyn ProgressSink>,
) -> IoResult {
    let shapes: Vec<Shape> = entities
        .iter()
        .flat_map(|entity| entity_shapes(entity).into_iter().map(|(shape, _)| shape))
        .collect();
    if shapes.is_empty() {
        return Err(IoError::NothingToExport);
    }

    progress.set_step("Writing BRep");
    let path: PathBuf = path.to_path_buf();
    kernel
        .run(move |session| {
            let mut adapter = KernelProgressAdapter::new(progress.as_ref());
            let kernel = session.kernel();
            let shape = match shapes.as_slice() {
                [single] => single.clone(),
                many => kernel.make_compound(many)?,
            };
            kernel.write_shape(&shape, &path, &mut adapter)
        })?
        .map_err(IoError::from_write)
}

fn write_stl_entities(
    kernel: &KernelHandle,
    entities: &[ExportEntity<'_>],
    options: &ExportOptions,
    path: &Path,
    progress: Arc<dyn ProgressSink>,
) -> IoResult {
    // Meshes are taken as they are, shapes are tessellated in one kernel job
    let mut solids: Vec<StlSolid> = Vec::new();
    let mut to_tessellate: Vec<(usize, Vec<Shape>)> = Vec::new();
    for entity in entities {
        if let ItemContent::Mesh(mesh) = entity_content(entity) {
            solids.push(StlSolid::new(entity.label(), mesh.mesh().clone()));
            continue;
        }

        let shapes: Vec<Shape> = entity_shapes(entity).into_iter().map(|(s, _)| s).collect();
        if shapes.is_empty() {
            tracing::warn!("'{}' has no shape to export, skipped", entity.label());
            continue;
        }
        to_tessellate.push((solids.len(), shapes));
        solids.push(StlSolid::new(entity.label(), TessellatedMesh::new()));
    }

    if !to_tessellate.is_empty() {
        progress.set_step("Tessellating");
        let tolerance = options.tessellation_tolerance;
        let meshes = kernel
            .run(move |session| {
                to_tessellate
                    .into_iter()
                    .map(|(index, shapes)| {
                        let mut mesh = TessellatedMesh::new();
                        for shape in &shapes {
                            mesh.merge(&session.kernel().tessellate(shape, tolerance)?);
                        }
                        Ok((index, mesh))
                    })
                    .collect::<cv_cad::CadResult<Vec<_>>>()
            })?
            .map_err(IoError::from_write)?;

        for (index, mesh) in meshes {
            if let Some(solid) = solids.get_mut(index) {
                solid.mesh = mesh;
            }
        }
    }

    write_stl(path, &solids, &options.stl, progress.as_ref())
}

fn entity_content<'a>(entity: &ExportEntity<'a>) -> &'a ItemContent {
    match *entity {
        ExportEntity::Item(item) | ExportEntity::Node(item, _) => item.content(),
    }
}

/// Kernel shapes of an entity with their colors
fn entity_shapes(entity: &ExportEntity<'_>) -> Vec<(Shape, Option<Color>)> {
    match (entity, entity_content(entity)) {
        (ExportEntity::Item(item), ItemContent::Shape(shape)) => {
            vec![(shape.shape().clone(), item.shape_color())]
        }
        (ExportEntity::Item(_), ItemContent::Assembly(assembly)) => assembly
            .root_shapes()
            .map(|(node, shape)| (shape.clone(), assembly.node_color(node)))
            .collect(),
        (ExportEntity::Node(_, node), ItemContent::Assembly(assembly)) => node_shape(assembly, *node),
        _ => Vec::new(),
    }
}

fn node_shape(assembly: &AssemblyItem, node: TreeNodeId) -> Vec<(Shape, Option<Color>)> {
    assembly
        .node_shape(node)
        .map(|shape| (shape.clone(), assembly.node_color(node)))
        .into_iter()
        .collect()
}

/// Copy every label of `source` into `target`, returns the id offset
fn merge_labels(target: &mut AssemblyDocument, source: &AssemblyDocument) -> u32 {
    let offset = target.len() as u32;
    for (_, label) in source.labels() {
        let kind = match &label.kind {
            LabelKind::Simple => LabelKind::Simple,
            LabelKind::Assembly(components) => {
                LabelKind::Assembly(components.iter().map(|&c| shifted(c, offset)).collect())
            }
            LabelKind::Reference(id) => LabelKind::Reference(shifted(*id, offset)),
        };
        target.add_label(AssemblyLabel {
            kind,
            ..label.clone()
        });
    }
    offset
}

fn shifted(id: LabelId, offset: u32) -> LabelId {
    LabelId(id.0 + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_cad::ShapeType;
    use glam::DMat4;

    #[test]
    fn test_merge_labels_shifts_ids() {
        let mut source = AssemblyDocument::new();
        let part = source.add_simple("Part", Shape::new(ShapeType::Solid));
        let asm = source.add_assembly("Asm");
        let reference = source.add_reference("Ref", part, DMat4::IDENTITY);
        source.add_component(asm, reference);

        let mut target = AssemblyDocument::new();
        target.add_simple("Existing", Shape::new(ShapeType::Solid));
        let offset = merge_labels(&mut target, &source);
        assert_eq!(offset, 1);
        assert_eq!(target.len(), 4);
        assert_eq!(target.components(LabelId(2)), &[LabelId(3)]);
        assert_eq!(target.referred(LabelId(3)), Some(LabelId(1)));
        assert_eq!(target.name(LabelId(1)), "Part");
    }

    #[test]
    fn test_assembly_labels_copied_once_per_item() {
        let mut source = AssemblyDocument::new();
        let part = source.add_simple("Part", Shape::new(ShapeType::Solid));
        let asm = source.add_assembly("Asm");
        let first = source.add_reference("First", part, DMat4::IDENTITY);
        let second = source.add_reference("Second", part, DMat4::IDENTITY);
        source.add_component(asm, first);
        source.add_component(asm, second);
        source.add_free_shape(asm);
        let item = DocumentItem::new_assembly("Asm", AssemblyItem::from_document(source).unwrap());
        let shape = DocumentItem::new_shape("Loose", Shape::new(ShapeType::Solid), None);

        let tree = item.as_assembly().unwrap().tree();
        let root = tree.roots()[0];
        let first_node = tree.node_child_first(root);
        let second_node = tree.node_sibling_next(first_node);

        let entities = [
            ExportEntity::Item(&shape),
            ExportEntity::Node(&item, first_node),
            ExportEntity::Node(&item, second_node),
            ExportEntity::Node(&item, first_node),
            ExportEntity::Item(&item),
        ];
        let document = assembly_document(&entities, AssemblyFormat::Step);
        assert_eq!(document.len(), 5);
        assert_eq!(
            document.free_shapes(),
            &[LabelId(0), LabelId(3), LabelId(4), LabelId(2)]
        );
        assert_eq!(document.name(LabelId(3)), "First");
    }

    #[test]
    fn test_entity_shapes() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let item = DocumentItem::new_shape("Part", Shape::new(ShapeType::Solid), Some(red));
        let shapes = entity_shapes(&ExportEntity::Item(&item));
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].1, Some(red));

        let mesh = DocumentItem::new_mesh("Mesh", TessellatedMesh::new());
        assert!(entity_shapes(&ExportEntity::Item(&mesh)).is_empty());
    }
}
