//! Typed, observable properties
//!
//! Every inspectable attribute of a document or item is a `Property` stored in
//! the `PropertyGroup` of its owner. Values only change through
//! `PropertyOwner::set_property_value`, which validates the new value and then
//! notifies the owner exactly once, unless notifications are blocked with a
//! `SignalBlocker`.

mod enumeration;
mod value;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

pub use enumeration::{EnumChoice, Enumeration, EnumerationItem};
pub use value::{PropertyKind, PropertyValue, Quantity, Unit};

/// Handle of a property inside its owner's group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey(u32);

/// Range constraint for `Int`, `Double` and `Quantity` properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarConstraint {
    pub minimum: f64,
    pub maximum: f64,
    /// Increment suggested to editors, not enforced
    pub single_step: f64,
    pub enabled: bool,
}

impl ScalarConstraint {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum,
            single_step: 1.0,
            enabled: true,
        }
    }

    fn accepts(&self, value: f64) -> bool {
        !self.enabled || (self.minimum..=self.maximum).contains(&value)
    }
}

/// Property-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("Property '{0}' is read-only")]
    ReadOnly(String),
    #[error("Value {value} is out of range [{minimum}, {maximum}] for property '{label}'")]
    OutOfRange {
        label: String,
        value: f64,
        minimum: f64,
        maximum: f64,
    },
    #[error("Value {value} is not part of the enumeration of property '{label}'")]
    InvalidEnumValue { label: String, value: i32 },
    #[error("Property '{label}' holds {expected:?} values, got {actual:?}")]
    TypeMismatch {
        label: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },
    #[error("Unknown property: {0:?}")]
    UnknownProperty(PropertyKey),
}

/// A labelled, typed value
#[derive(Debug, Clone)]
pub struct Property {
    label: String,
    value: PropertyValue,
    user_read_only: bool,
    constraint: Option<ScalarConstraint>,
    enumeration: Option<Arc<Enumeration>>,
}

impl Property {
    /// Create a property holding `value`
    pub fn new(label: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            user_read_only: false,
            constraint: None,
            enumeration: None,
        }
    }

    /// Create an enumerated property
    ///
    /// A `value` outside `enumeration` is replaced by its first item.
    pub fn enumerated(label: impl Into<String>, enumeration: Arc<Enumeration>, value: i32) -> Self {
        let label = label.into();
        let value = match enumeration.item_at(0) {
            Some(first) if !enumeration.contains(value) => {
                tracing::warn!(
                    "Property '{}': {} is not an enumerated value, using {}",
                    label,
                    value,
                    first.value
                );
                first.value
            }
            _ => value,
        };
        Self {
            enumeration: Some(enumeration),
            ..Self::new(label, PropertyValue::Enumeration(value))
        }
    }

    /// Mark the property read-only for users
    pub fn read_only(mut self) -> Self {
        self.user_read_only = true;
        self
    }

    /// Restrict scalar values to `[minimum, maximum]`
    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.constraint = Some(ScalarConstraint::new(minimum, maximum));
        self
    }

    /// Set the editor step of the range constraint
    pub fn with_step(mut self, single_step: f64) -> Self {
        if let Some(constraint) = &mut self.constraint {
            constraint.single_step = single_step;
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn kind(&self) -> PropertyKind {
        self.value.kind()
    }

    pub fn is_user_read_only(&self) -> bool {
        self.user_read_only
    }

    pub fn constraint(&self) -> Option<&ScalarConstraint> {
        self.constraint.as_ref()
    }

    pub fn enumeration(&self) -> Option<&Enumeration> {
        self.enumeration.as_deref()
    }

    /// Display text of the value, enumeration codes resolved to names
    pub fn describe(&self) -> String {
        match (&self.value, self.enumeration()) {
            (PropertyValue::Enumeration(code), Some(enumeration)) => enumeration
                .find_name(*code)
                .map(str::to_string)
                .unwrap_or_else(|| code.to_string()),
            (value, _) => value.to_display_string(),
        }
    }

    /// Check `value` against type, read-only flag and constraints
    fn validate(&self, value: &PropertyValue) -> Result<(), PropertyError> {
        if self.user_read_only {
            return Err(PropertyError::ReadOnly(self.label.clone()));
        }

        if value.kind() != self.kind() {
            return Err(PropertyError::TypeMismatch {
                label: self.label.clone(),
                expected: self.kind(),
                actual: value.kind(),
            });
        }

        if let (Some(constraint), Some(scalar)) = (&self.constraint, value.as_scalar())
            && !constraint.accepts(scalar)
        {
            return Err(PropertyError::OutOfRange {
                label: self.label.clone(),
                value: scalar,
                minimum: constraint.minimum,
                maximum: constraint.maximum,
            });
        }

        if let (Some(enumeration), PropertyValue::Enumeration(code)) = (&self.enumeration, value)
            && !enumeration.contains(*code)
        {
            return Err(PropertyError::InvalidEnumValue {
                label: self.label.clone(),
                value: *code,
            });
        }

        Ok(())
    }
}

/// Scoped suppression of change notifications
///
/// Notifications of the group stay blocked until every blocker is dropped.
#[must_use = "notifications are only blocked while the blocker is alive"]
#[derive(Debug)]
pub struct SignalBlocker {
    counter: Arc<AtomicU32>,
}

impl Drop for SignalBlocker {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Insertion-ordered set of properties belonging to one owner
#[derive(Debug, Default)]
pub struct PropertyGroup {
    /// Slots indexed by key, `None` once removed (keys are never reused)
    slots: Vec<Option<Property>>,
    live: usize,
    blocked: Arc<AtomicU32>,
}

impl PropertyGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new property, returns its key
    pub fn add(&mut self, property: Property) -> PropertyKey {
        let key = PropertyKey(self.slots.len() as u32);
        self.slots.push(Some(property));
        self.live += 1;
        key
    }

    /// Stop tracking a property (no-op for unknown keys)
    pub fn remove(&mut self, key: PropertyKey) -> Option<Property> {
        let property = self.slots.get_mut(key.0 as usize)?.take()?;
        self.live -= 1;
        Some(property)
    }

    pub fn get(&self, key: PropertyKey) -> Option<&Property> {
        self.slots.get(key.0 as usize)?.as_ref()
    }

    pub fn contains(&self, key: PropertyKey) -> bool {
        self.get(key).is_some()
    }

    /// Value of a property
    pub fn value(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.get(key).map(Property::value)
    }

    /// Find a property by label
    pub fn find_by_label(&self, label: &str) -> Option<PropertyKey> {
        self.iter()
            .find(|(_, p)| p.label() == label)
            .map(|(key, _)| key)
    }

    /// Iterate over properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &Property)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|p| (PropertyKey(index as u32), p)))
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Change the user read-only flag of a property
    pub fn set_user_read_only(&mut self, key: PropertyKey, read_only: bool) {
        if let Some(Some(property)) = self.slots.get_mut(key.0 as usize) {
            property.user_read_only = read_only;
        }
    }

    /// Block change notifications until the returned blocker is dropped
    pub fn block_signals(&self) -> SignalBlocker {
        self.blocked.fetch_add(1, Ordering::AcqRel);
        SignalBlocker {
            counter: Arc::clone(&self.blocked),
        }
    }

    pub fn signals_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire) > 0
    }

    /// Validate and store a value
    ///
    /// Returns whether the owner must be notified. Nothing is stored on error.
    fn commit(&mut self, key: PropertyKey, value: PropertyValue) -> Result<bool, PropertyError> {
        let notify = !self.signals_blocked();
        let property = self
            .slots
            .get_mut(key.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(PropertyError::UnknownProperty(key))?;
        property.validate(&value)?;
        property.value = value;
        Ok(notify)
    }
}

/// An entity exposing a reflectable list of properties
pub trait PropertyOwner {
    fn properties(&self) -> &PropertyGroup;

    fn properties_mut(&mut self) -> &mut PropertyGroup;

    /// Called once after every committed change (unless signals are blocked)
    fn on_property_changed(&mut self, _key: PropertyKey) {}

    /// Set the value of a property
    ///
    /// This is the only way to change a property value.
    fn set_property_value(
        &mut self,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        if self.properties_mut().commit(key, value)? {
            self.on_property_changed(key);
        }
        Ok(())
    }

    /// Value of a property
    fn property_value(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.properties().value(key)
    }
}
