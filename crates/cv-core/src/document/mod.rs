//! Documents and the items they own

mod assembly;
mod item;

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{AppEvent, EventQueue};
use crate::property::{Property, PropertyGroup, PropertyKey, PropertyOwner, PropertyValue};

pub use assembly::AssemblyItem;
pub use item::{DocumentItem, ItemContent, ItemId, ItemKind, MeshItem, ShapeItem};
pub(crate) use item::DocumentLink;

/// Unique identifier of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered collection of root items
///
/// Documents are created and destroyed by the `Application`. Dropping a
/// document drops its items.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    properties: PropertyGroup,
    label: PropertyKey,
    file_path: PropertyKey,
    items: Vec<DocumentItem>,
    events: EventQueue,
}

impl Document {
    pub(crate) fn new(label: impl Into<String>, file_path: Option<&Path>, events: EventQueue) -> Self {
        let mut properties = PropertyGroup::new();
        let label = properties.add(Property::new("Label", PropertyValue::String(label.into())));
        let path = file_path
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_path = properties.add(Property::new("File path", path).read_only());

        Self {
            id: DocumentId::new(),
            properties,
            label,
            file_path,
            items: Vec::new(),
            events,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
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

    /// Path of the file the document was opened from, empty if none
    pub fn file_path(&self) -> &str {
        self.properties
            .value(self.file_path)
            .and_then(PropertyValue::as_str)
            .unwrap_or_default()
    }

    pub fn file_path_key(&self) -> PropertyKey {
        self.file_path
    }

    /// Adopt a detached item, returns its id
    pub fn add_item(&mut self, mut item: DocumentItem) -> ItemId {
        item.attach(DocumentLink {
            document: self.id,
            events: self.events.clone(),
        });
        let id = item.id();
        self.items.push(item);
        self.events.push(AppEvent::ItemAdded {
            document: self.id,
            item: id,
        });
        id
    }

    /// Destroy an item, returns false if it is not part of this document
    pub fn erase_item(&mut self, id: ItemId) -> bool {
        let Some(index) = self.item_index(id) else {
            return false;
        };
        self.items.remove(index);
        self.events.push(AppEvent::ItemErased {
            document: self.id,
            item: id,
        });
        true
    }

    pub fn item(&self, id: ItemId) -> Option<&DocumentItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut DocumentItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Position of an item among the root items
    pub fn item_index(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Root items in insertion order
    pub fn items(&self) -> impl Iterator<Item = &DocumentItem> {
        self.items.iter()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PropertyOwner for Document {
    fn properties(&self) -> &PropertyGroup {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyGroup {
        &mut self.properties
    }

    fn on_property_changed(&mut self, key: PropertyKey) {
        self.events.push(AppEvent::DocumentPropertyChanged {
            document: self.id,
            key,
        });
    }
}
