//! Document items: shapes, meshes and assemblies

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cv_cad::{Color, Shape, ShapeType, TessellatedMesh};

use super::DocumentId;
use super::assembly::AssemblyItem;
use crate::event::{AppEvent, EventQueue};
use crate::property::{
    EnumChoice, Enumeration, Property, PropertyError, PropertyGroup, PropertyKey, PropertyOwner,
    PropertyValue,
};

/// Unique identifier of a document item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminator of the item variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Shape,
    Mesh,
    Assembly,
}

impl ItemKind {
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Shape => "Shape",
            ItemKind::Mesh => "Mesh",
            ItemKind::Assembly => "Assembly",
        }
    }
}

impl EnumChoice for ShapeType {
    fn all() -> &'static [Self] {
        &[
            ShapeType::Compound,
            ShapeType::CompSolid,
            ShapeType::Solid,
            ShapeType::Shell,
            ShapeType::Face,
            ShapeType::Wire,
            ShapeType::Edge,
            ShapeType::Vertex,
        ]
    }

    fn code(self) -> i32 {
        self as i32
    }

    fn display_name(self) -> &'static str {
        ShapeType::display_name(&self)
    }
}

static SHAPE_TYPES: LazyLock<Arc<Enumeration>> =
    LazyLock::new(|| Arc::new(Enumeration::from_choices::<ShapeType>()));

/// A single boundary-representation shape
#[derive(Debug, Clone)]
pub struct ShapeItem {
    shape: Shape,
    shape_type: PropertyKey,
    /// Present only while the shape has a color
    color: Option<PropertyKey>,
}

impl ShapeItem {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_type_key(&self) -> PropertyKey {
        self.shape_type
    }

    pub fn color_key(&self) -> Option<PropertyKey> {
        self.color
    }
}

/// A triangulated mesh
#[derive(Debug, Clone)]
pub struct MeshItem {
    mesh: TessellatedMesh,
    node_count: PropertyKey,
    triangle_count: PropertyKey,
}

impl MeshItem {
    pub fn mesh(&self) -> &TessellatedMesh {
        &self.mesh
    }

    pub fn node_count_key(&self) -> PropertyKey {
        self.node_count
    }

    pub fn triangle_count_key(&self) -> PropertyKey {
        self.triangle_count
    }
}

/// Variant payload of an item
#[derive(Debug, Clone)]
pub enum ItemContent {
    Shape(ShapeItem),
    Mesh(MeshItem),
    Assembly(AssemblyItem),
}

/// Back-reference from an attached item to its document
#[derive(Debug, Clone)]
pub(crate) struct DocumentLink {
    pub document: DocumentId,
    pub events: EventQueue,
}

/// An entity owned by a document
///
/// Items are created detached by the readers and bound to a document once,
/// when the document adopts them.
#[derive(Debug)]
pub struct DocumentItem {
    id: ItemId,
    properties: PropertyGroup,
    label: PropertyKey,
    content: ItemContent,
    link: Option<DocumentLink>,
}

impl DocumentItem {
    fn with_content(
        label: impl Into<String>,
        build: impl FnOnce(&mut PropertyGroup) -> ItemContent,
    ) -> Self {
        let mut properties = PropertyGroup::new();
        let label = properties.add(Property::new("Label", PropertyValue::String(label.into())));
        let content = build(&mut properties);
        Self {
            id: ItemId::new(),
            properties,
            label,
            content,
            link: None,
        }
    }

    /// Create a shape item
    pub fn new_shape(label: impl Into<String>, shape: Shape, color: Option<Color>) -> Self {
        Self::with_content(label, |properties| {
            let shape_type = properties.add(
                Property::enumerated("Shape type", Arc::clone(&SHAPE_TYPES), shape.shape_type.code())
                    .read_only(),
            );
            let color = color.map(|c| properties.add(Property::new("Color", c)));
            ItemContent::Shape(ShapeItem {
                shape,
                shape_type,
                color,
            })
        })
    }

    /// Create a mesh item
    pub fn new_mesh(label: impl Into<String>, mesh: TessellatedMesh) -> Self {
        Self::with_content(label, |properties| {
            let node_count =
                properties.add(Property::new("Node count", count_value(mesh.node_count())).read_only());
            let triangle_count = properties
                .add(Property::new("Triangle count", count_value(mesh.triangle_count())).read_only());
            ItemContent::Mesh(MeshItem {
                mesh,
                node_count,
                triangle_count,
            })
        })
    }

    /// Create an assembly item
    pub fn new_assembly(label: impl Into<String>, assembly: AssemblyItem) -> Self {
        Self::with_content(label, |properties| {
            let mut assembly = assembly;
            assembly.register_properties(properties);
            ItemContent::Assembly(assembly)
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        match self.content {
            ItemContent::Shape(_) => ItemKind::Shape,
            ItemContent::Mesh(_) => ItemKind::Mesh,
            ItemContent::Assembly(_) => ItemKind::Assembly,
        }
    }

    pub fn label(&self) -> &str {
        self.properties
            .value(self.label)
            .and_then(PropertyValue::as_str)
            .unwrap_or_default()
    }

    pub fn label_key(&self) -> PropertyKey {
        self.label
    }

    /// Rename the item (notifies like any other property change)
    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), PropertyError> {
        self.set_property_value(self.label, PropertyValue::String(label.into()))
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn as_shape(&self) -> Option<&ShapeItem> {
        match &self.content {
            ItemContent::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshItem> {
        match &self.content {
            ItemContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_assembly(&self) -> Option<&AssemblyItem> {
        match &self.content {
            ItemContent::Assembly(assembly) => Some(assembly),
            _ => None,
        }
    }

    /// Color of a shape item
    pub fn shape_color(&self) -> Option<Color> {
        let key = self.as_shape()?.color?;
        self.properties.value(key)?.as_color()
    }

    /// Give a shape item a color, or take it away
    ///
    /// The "Color" property is added or removed accordingly. Returns false
    /// for other item kinds.
    pub fn set_shape_color(&mut self, color: Option<Color>) -> Result<bool, PropertyError> {
        let ItemContent::Shape(shape) = &mut self.content else {
            return Ok(false);
        };

        match (shape.color, color) {
            (Some(key), Some(color)) => {
                self.set_property_value(key, PropertyValue::Color(color))?;
            }
            (Some(key), None) => {
                self.properties.remove(key);
                shape.color = None;
            }
            (None, Some(color)) => {
                shape.color = Some(self.properties.add(Property::new("Color", color)));
            }
            (None, None) => {}
        }
        Ok(true)
    }

    /// Owning document, once attached
    pub fn document(&self) -> Option<DocumentId> {
        self.link.as_ref().map(|link| link.document)
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    /// Bind the item to its document
    pub(crate) fn attach(&mut self, link: DocumentLink) {
        if let Some(existing) = &self.link {
            tracing::warn!(
                "Item {} is already attached to document {}",
                self.id,
                existing.document
            );
            return;
        }
        self.link = Some(link);
    }
}

impl PropertyOwner for DocumentItem {
    fn properties(&self) -> &PropertyGroup {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyGroup {
        &mut self.properties
    }

    fn on_property_changed(&mut self, key: PropertyKey) {
        if let Some(link) = &self.link {
            link.events.push(AppEvent::ItemPropertyChanged {
                document: link.document,
                item: self.id,
                key,
            });
        }
    }
}

/// Clamp a count into an `Int` property value
pub(crate) fn count_value(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
