//! Enumerations: ordered (code, display name) tables for enumerated properties

use serde::{Deserialize, Serialize};

/// A single enumeration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationItem {
    pub value: i32,
    pub name: String,
}

/// Ordered list of (code, display name) pairs
///
/// Lookups are linear and return the first match. `add_item` does not reject
/// duplicate codes; a duplicate is logged since lookups can never reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    items: Vec<EnumerationItem>,
}

/// A Rust enum usable as the source of an `Enumeration`
pub trait EnumChoice: Copy + 'static {
    /// All variants, in display order
    fn all() -> &'static [Self];

    /// Stable integer code of the variant
    fn code(self) -> i32;

    /// Display name of the variant
    fn display_name(self) -> &'static str;

    /// Variant for a code
    fn from_code(code: i32) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.code() == code)
    }
}

impl Enumeration {
    /// Create an empty enumeration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (code, name) pairs
    pub fn from_items<S: Into<String>>(items: impl IntoIterator<Item = (i32, S)>) -> Self {
        let mut enumeration = Self::new();
        for (value, name) in items {
            enumeration.add_item(value, name);
        }
        enumeration
    }

    /// Build from all variants of a Rust enum
    pub fn from_choices<E: EnumChoice>() -> Self {
        Self::from_items(E::all().iter().map(|v| (v.code(), v.display_name())))
    }

    /// Append an item
    pub fn add_item(&mut self, value: i32, name: impl Into<String>) {
        let name = name.into();
        if self.contains(value) {
            tracing::warn!(
                "Enumeration already contains value {} (adding '{}')",
                value,
                name
            );
        }
        self.items.push(EnumerationItem { value, name });
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at a position
    pub fn item_at(&self, index: usize) -> Option<&EnumerationItem> {
        self.items.get(index)
    }

    /// All items in order
    pub fn items(&self) -> &[EnumerationItem] {
        &self.items
    }

    /// Position of the first item with `value`
    pub fn find_index(&self, value: i32) -> Option<usize> {
        self.items.iter().position(|item| item.value == value)
    }

    /// Name of the first item with `value`
    pub fn find_name(&self, value: i32) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.value == value)
            .map(|item| item.name.as_str())
    }

    /// Code of the first item named `name`
    pub fn find_value(&self, name: &str) -> Option<i32> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value)
    }

    /// Whether `value` is one of the codes
    pub fn contains(&self, value: i32) -> bool {
        self.find_index(value).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Finish {
        Matte,
        Glossy,
    }

    impl EnumChoice for Finish {
        fn all() -> &'static [Self] {
            &[Finish::Matte, Finish::Glossy]
        }

        fn code(self) -> i32 {
            match self {
                Finish::Matte => 10,
                Finish::Glossy => 20,
            }
        }

        fn display_name(self) -> &'static str {
            match self {
                Finish::Matte => "Matte",
                Finish::Glossy => "Glossy",
            }
        }
    }

    #[test]
    fn test_lookups() {
        let e = Enumeration::from_items([(1, "One"), (2, "Two"), (5, "Five")]);
        assert_eq!(e.len(), 3);
        assert_eq!(e.find_index(5), Some(2));
        assert_eq!(e.find_name(2), Some("Two"));
        assert_eq!(e.find_value("One"), Some(1));
        assert_eq!(e.item_at(1).map(|i| i.value), Some(2));
    }

    #[test]
    fn test_not_found() {
        let e = Enumeration::from_items([(1, "One")]);
        assert_eq!(e.find_index(7), None);
        assert_eq!(e.find_name(7), None);
        assert_eq!(e.find_value("Seven"), None);
        assert!(e.item_at(3).is_none());
        assert!(Enumeration::new().is_empty());
    }

    #[test]
    fn test_duplicate_values_are_kept() {
        let mut e = Enumeration::new();
        e.add_item(1, "First");
        e.add_item(1, "Second");
        assert_eq!(e.len(), 2);
        assert_eq!(e.find_name(1), Some("First"));
        assert_eq!(e.find_value("Second"), Some(1));
    }

    #[test]
    fn test_from_choices() {
        let e = Enumeration::from_choices::<Finish>();
        assert_eq!(e.find_name(20), Some("Glossy"));
        assert_eq!(Finish::from_code(10), Some(Finish::Matte));
        assert_eq!(Finish::from_code(30), None);
    }
}
