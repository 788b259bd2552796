//! Assembly items: a kernel assembly document expanded into a `Tree`

use std::collections::{HashMap, HashSet};

use glam::DMat4;

use cv_cad::{AssemblyDocument, Color, LabelId, LabelKind, Shape};

use crate::error::IoError;
use crate::property::{Property, PropertyGroup, PropertyKey};
use crate::tree::{NULL_NODE, Tree, TreeNodeId};

/// Multi-level assembly with shared sub-shapes
///
/// Each tree node carries the label it was expanded from. Assembly labels
/// expand into their components and references into their target, so a
/// shared label appears once per instance.
#[derive(Debug, Clone)]
pub struct AssemblyItem {
    document: AssemblyDocument,
    tree: Tree<LabelId>,
    shapes: HashMap<LabelId, Shape>,
    colors: HashMap<LabelId, Color>,
    label_count: Option<PropertyKey>,
}

impl AssemblyItem {
    /// Expand the free shapes of `document` into a tree
    ///
    /// Fails when a label refers to itself through its ancestors, or when a
    /// component or reference points at a label that does not exist.
    pub fn from_document(document: AssemblyDocument) -> Result<Self, IoError> {
        let tree = build_tree(&document)?;

        let mut shapes = HashMap::new();
        let mut colors = HashMap::new();
        for (id, label) in document.labels() {
            if let Some(shape) = &label.shape {
                shapes.insert(id, shape.clone());
            }
            if let Some(color) = label.color {
                colors.insert(id, color);
            }
        }

        Ok(Self {
            document,
            tree,
            shapes,
            colors,
            label_count: None,
        })
    }

    pub(crate) fn register_properties(&mut self, properties: &mut PropertyGroup) {
        let count = super::item::count_value(self.tree.len());
        self.label_count = Some(properties.add(Property::new("Label count", count).read_only()));
    }

    pub fn document(&self) -> &AssemblyDocument {
        &self.document
    }

    pub fn tree(&self) -> &Tree<LabelId> {
        &self.tree
    }

    pub fn label_count_key(&self) -> Option<PropertyKey> {
        self.label_count
    }

    /// Label a node was expanded from
    pub fn node_label(&self, node: TreeNodeId) -> Option<LabelId> {
        self.tree.node_data(node).copied()
    }

    /// Name of the label behind a node
    ///
    /// Unnamed references take the name of their target.
    pub fn node_name(&self, node: TreeNodeId) -> &str {
        let Some(label) = self.node_label(node) else {
            return "";
        };
        match self.document.name(label) {
            "" => self
                .document
                .referred(label)
                .map(|target| self.document.name(target))
                .unwrap_or_default(),
            name => name,
        }
    }

    /// Shape of a node, looking through references
    pub fn node_shape(&self, node: TreeNodeId) -> Option<&Shape> {
        let label = self.node_label(node)?;
        self.shapes.get(&label).or_else(|| {
            let target = self.document.referred(label)?;
            self.shapes.get(&target)
        })
    }

    /// Color of a node, looking through references
    pub fn node_color(&self, node: TreeNodeId) -> Option<Color> {
        let label = self.node_label(node)?;
        self.colors.get(&label).copied().or_else(|| {
            let target = self.document.referred(label)?;
            self.colors.get(&target).copied()
        })
    }

    /// Placement of a node in the assembly frame
    pub fn node_location(&self, node: TreeNodeId) -> DMat4 {
        let mut location = DMat4::IDENTITY;
        let mut current = node;
        while current != NULL_NODE {
            if let Some(label) = self.node_label(current).and_then(|id| self.document.label(id)) {
                location = label.location * location;
            }
            current = self.tree.node_parent(current);
        }
        location
    }

    /// Root nodes carrying a shape, with their shape
    pub fn root_shapes(&self) -> impl Iterator<Item = (TreeNodeId, &Shape)> {
        self.tree
            .roots()
            .iter()
            .filter_map(|&node| self.node_shape(node).map(|shape| (node, shape)))
    }
}

fn build_tree(document: &AssemblyDocument) -> Result<Tree<LabelId>, IoError> {
    let mut tree = Tree::new();

    // Pending labels with the node to attach them to and their depth
    let mut stack: Vec<(LabelId, TreeNodeId, usize)> = document
        .free_shapes()
        .iter()
        .rev()
        .map(|&id| (id, NULL_NODE, 0))
        .collect();

    // Labels of the ancestors of the node being expanded
    let mut ancestors: Vec<LabelId> = Vec::new();
    let mut on_path: HashSet<LabelId> = HashSet::new();

    while let Some((id, parent, depth)) = stack.pop() {
        while ancestors.len() > depth {
            if let Some(popped) = ancestors.pop() {
                on_path.remove(&popped);
            }
        }
        if on_path.contains(&id) {
            return Err(IoError::ReaderFailed(format!(
                "Cyclic assembly structure at label '{}' ({})",
                document.name(id),
                id
            )));
        }

        let label = document.label(id).ok_or_else(|| {
            IoError::ReaderFailed(format!("Assembly refers to missing label {}", id))
        })?;

        let node = tree.append_child(parent, id);
        ancestors.push(id);
        on_path.insert(id);

        match &label.kind {
            LabelKind::Simple => {}
            LabelKind::Assembly(components) => {
                stack.extend(components.iter().rev().map(|&c| (c, node, depth + 1)));
            }
            LabelKind::Reference(target) => stack.push((*target, node, depth + 1)),
        }
    }

    Ok(tree)
}
