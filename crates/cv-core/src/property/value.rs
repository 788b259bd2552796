//! Property value variant, type tags and physical quantities

use chrono::{DateTime, Utc};
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use cv_cad::Color;

/// Type tag of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    Bool,
    Int,
    Double,
    String,
    Bytes,
    DateTime,
    Color,
    Point,
    Transform,
    Enumeration,
    Quantity,
}

impl PropertyKind {
    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Double => "double",
            PropertyKind::String => "string",
            PropertyKind::Bytes => "bytes",
            PropertyKind::DateTime => "datetime",
            PropertyKind::Color => "color",
            PropertyKind::Point => "point",
            PropertyKind::Transform => "transform",
            PropertyKind::Enumeration => "enumeration",
            PropertyKind::Quantity => "quantity",
        }
    }

    /// Whether min/max constraints apply to this kind
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PropertyKind::Int | PropertyKind::Double | PropertyKind::Quantity
        )
    }
}

/// Physical unit attached to a quantity (SI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    None,
    Length,
    Area,
    Volume,
    Mass,
    Time,
    Angle,
    Velocity,
    Density,
}

impl Unit {
    /// Unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Length => "m",
            Unit::Area => "m²",
            Unit::Volume => "m³",
            Unit::Mass => "kg",
            Unit::Time => "s",
            Unit::Angle => "rad",
            Unit::Velocity => "m/s",
            Unit::Density => "kg/m³",
        }
    }
}

/// A numeric value tagged with a unit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn length(value: f64) -> Self {
        Self::new(value, Unit::Length)
    }

    pub fn angle(value: f64) -> Self {
        Self::new(value, Unit::Angle)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.unit {
            Unit::None => write!(f, "{}", self.value),
            unit => write!(f, "{} {}", self.value, unit.symbol()),
        }
    }
}

/// Generic value of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Color(Color),
    Point(DVec3),
    Transform(DMat4),
    /// Code of an enumeration item
    Enumeration(i32),
    Quantity(Quantity),
}

impl PropertyValue {
    /// Type tag of this value
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Double(_) => PropertyKind::Double,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Bytes(_) => PropertyKind::Bytes,
            PropertyValue::DateTime(_) => PropertyKind::DateTime,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Point(_) => PropertyKind::Point,
            PropertyValue::Transform(_) => PropertyKind::Transform,
            PropertyValue::Enumeration(_) => PropertyKind::Enumeration,
            PropertyValue::Quantity(_) => PropertyKind::Quantity,
        }
    }

    /// Numeric view used by range constraints
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(f64::from(*v)),
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Quantity(q) => Some(q.value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enumeration(&self) -> Option<i32> {
        match self {
            PropertyValue::Enumeration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<Quantity> {
        match self {
            PropertyValue::Quantity(v) => Some(*v),
            _ => None,
        }
    }

    /// Display text (enumeration values are shown as their code)
    pub fn to_display_string(&self) -> String {
        match self {
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Double(v) => v.to_string(),
            PropertyValue::String(v) => v.clone(),
            PropertyValue::Bytes(v) => format!("<{} bytes>", v.len()),
            PropertyValue::DateTime(v) => v.to_rfc3339(),
            PropertyValue::Color(v) => v.to_hex(),
            PropertyValue::Point(p) => format!("({}, {}, {})", p.x, p.y, p.z),
            PropertyValue::Transform(m) => {
                let t = m.w_axis;
                format!("translation ({}, {}, {})", t.x, t.y, t.z)
            }
            PropertyValue::Enumeration(v) => v.to_string(),
            PropertyValue::Quantity(q) => q.to_string(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(v: Vec<u8>) -> Self {
        PropertyValue::Bytes(v)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        PropertyValue::DateTime(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        PropertyValue::Color(v)
    }
}

impl From<DVec3> for PropertyValue {
    fn from(v: DVec3) -> Self {
        PropertyValue::Point(v)
    }
}

impl From<DMat4> for PropertyValue {
    fn from(v: DMat4) -> Self {
        PropertyValue::Transform(v)
    }
}

impl From<Quantity> for PropertyValue {
    fn from(v: Quantity) -> Self {
        PropertyValue::Quantity(v)
    }
}
