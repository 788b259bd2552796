//! Kernel-side assembly documents
//!
//! An assembly document is a flat table of labels. A label is either a simple
//! shape, an assembly listing its component labels, or a reference pointing
//! at one other label (a shared sub-tree placed with its own location).
//! The top-level entries are the "free shapes".

use glam::DMat4;

use crate::color::Color;
use crate::shape::Shape;

/// Index of a label inside an `AssemblyDocument`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u32);

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural role of a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKind {
    /// A plain shape with no sub-structure
    Simple,
    /// An assembly of component labels (usually references)
    Assembly(Vec<LabelId>),
    /// An instance of another label
    Reference(LabelId),
}

/// A single entry of an assembly document
#[derive(Debug, Clone)]
pub struct AssemblyLabel {
    /// Name attribute (if the file carried one)
    pub name: Option<String>,
    /// Structural role
    pub kind: LabelKind,
    /// Shape attached to the label
    pub shape: Option<Shape>,
    /// Color attribute
    pub color: Option<Color>,
    /// Placement relative to the parent (meaningful for references)
    pub location: DMat4,
}

impl AssemblyLabel {
    /// Create a label of the given kind
    pub fn new(name: Option<String>, kind: LabelKind) -> Self {
        Self {
            name,
            kind,
            shape: None,
            color: None,
            location: DMat4::IDENTITY,
        }
    }

    pub fn is_assembly(&self) -> bool {
        matches!(self.kind, LabelKind::Assembly(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, LabelKind::Reference(_))
    }
}

/// An assembly document as produced by the kernel's STEP/IGES readers
#[derive(Debug, Clone, Default)]
pub struct AssemblyDocument {
    labels: Vec<AssemblyLabel>,
    free_shapes: Vec<LabelId>,
}

impl AssemblyDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label, returns its ID
    pub fn add_label(&mut self, label: AssemblyLabel) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(label);
        id
    }

    /// Add a simple shape label
    pub fn add_simple(&mut self, name: impl Into<String>, shape: Shape) -> LabelId {
        let mut label = AssemblyLabel::new(Some(name.into()), LabelKind::Simple);
        label.shape = Some(shape);
        self.add_label(label)
    }

    /// Add an empty assembly label
    pub fn add_assembly(&mut self, name: impl Into<String>) -> LabelId {
        self.add_label(AssemblyLabel::new(
            Some(name.into()),
            LabelKind::Assembly(Vec::new()),
        ))
    }

    /// Add a reference to `target` placed at `location`
    pub fn add_reference(
        &mut self,
        name: impl Into<String>,
        target: LabelId,
        location: DMat4,
    ) -> LabelId {
        let mut label = AssemblyLabel::new(Some(name.into()), LabelKind::Reference(target));
        label.location = location;
        self.add_label(label)
    }

    /// Append `component` to the components of `assembly`
    ///
    /// Returns false if `assembly` is not an assembly label.
    pub fn add_component(&mut self, assembly: LabelId, component: LabelId) -> bool {
        match self.labels.get_mut(assembly.0 as usize).map(|l| &mut l.kind) {
            Some(LabelKind::Assembly(components)) => {
                components.push(component);
                true
            }
            _ => false,
        }
    }

    /// Mark a label as a top-level (free) shape
    pub fn add_free_shape(&mut self, id: LabelId) {
        self.free_shapes.push(id);
    }

    /// Top-level labels in document order
    pub fn free_shapes(&self) -> &[LabelId] {
        &self.free_shapes
    }

    /// Get a label by ID
    pub fn label(&self, id: LabelId) -> Option<&AssemblyLabel> {
        self.labels.get(id.0 as usize)
    }

    /// Get a mutable label by ID
    pub fn label_mut(&mut self, id: LabelId) -> Option<&mut AssemblyLabel> {
        self.labels.get_mut(id.0 as usize)
    }

    /// Iterate over all labels with their IDs
    pub fn labels(&self) -> impl Iterator<Item = (LabelId, &AssemblyLabel)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (LabelId(i as u32), l))
    }

    /// Components of an assembly label (empty for other kinds)
    pub fn components(&self, id: LabelId) -> &[LabelId] {
        match self.label(id).map(|l| &l.kind) {
            Some(LabelKind::Assembly(components)) => components,
            _ => &[],
        }
    }

    /// Target of a reference label
    pub fn referred(&self, id: LabelId) -> Option<LabelId> {
        match self.label(id)?.kind {
            LabelKind::Reference(target) => Some(target),
            _ => None,
        }
    }

    /// Name of a label, or an empty string
    pub fn name(&self, id: LabelId) -> &str {
        self.label(id)
            .and_then(|l| l.name.as_deref())
            .unwrap_or_default()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
