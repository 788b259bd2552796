//! Export options

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use cv_cad::AssemblyWriteOptions;

use crate::config::AppConfig;
use crate::property::{
    EnumChoice, Enumeration, Property, PropertyGroup, PropertyKey, PropertyOwner, PropertyValue,
};

/// STL encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StlFormat {
    Ascii,
    #[default]
    Binary,
}

impl EnumChoice for StlFormat {
    fn all() -> &'static [Self] {
        &[StlFormat::Ascii, StlFormat::Binary]
    }

    fn code(self) -> i32 {
        self as i32
    }

    fn display_name(self) -> &'static str {
        match self {
            StlFormat::Ascii => "ASCII",
            StlFormat::Binary => "Binary",
        }
    }
}

/// Notation of coordinates in ASCII STL files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FloatFormat {
    /// Fixed number of decimals
    Fixed,
    /// Mantissa and exponent
    Scientific,
    /// Shortest text that reads back to the same value (precision ignored)
    #[default]
    Shortest,
}

impl EnumChoice for FloatFormat {
    fn all() -> &'static [Self] {
        &[FloatFormat::Fixed, FloatFormat::Scientific, FloatFormat::Shortest]
    }

    fn code(self) -> i32 {
        self as i32
    }

    fn display_name(self) -> &'static str {
        match self {
            FloatFormat::Fixed => "Fixed",
            FloatFormat::Scientific => "Scientific",
            FloatFormat::Shortest => "Shortest",
        }
    }
}

/// STL writer implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StlWriterBackend {
    /// Any number of solids, configurable float formatting
    #[default]
    General,
    /// A single shape or mesh per file
    Restricted,
}

impl EnumChoice for StlWriterBackend {
    fn all() -> &'static [Self] {
        &[StlWriterBackend::General, StlWriterBackend::Restricted]
    }

    fn code(self) -> i32 {
        self as i32
    }

    fn display_name(self) -> &'static str {
        match self {
            StlWriterBackend::General => "General",
            StlWriterBackend::Restricted => "Single solid",
        }
    }
}

pub const MIN_FLOAT_PRECISION: u8 = 1;
pub const MAX_FLOAT_PRECISION: u8 = 9;

/// Options of the STL writers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StlExportOptions {
    pub backend: StlWriterBackend,
    pub format: StlFormat,
    /// ASCII only
    pub float_format: FloatFormat,
    /// ASCII only, digits after the decimal point
    pub float_precision: u8,
}

impl Default for StlExportOptions {
    fn default() -> Self {
        Self {
            backend: StlWriterBackend::General,
            format: StlFormat::Binary,
            float_format: FloatFormat::Shortest,
            float_precision: 6,
        }
    }
}

/// Options of one export call
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub stl: StlExportOptions,
    pub assembly: AssemblyWriteOptions,
    /// Tessellation tolerance for shapes written as meshes
    pub tessellation_tolerance: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ExportOptions {
    /// Options with the defaults of `config`
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            stl: config.stl_export.clone(),
            assembly: config.assembly_export.clone(),
            tessellation_tolerance: config.tessellation_tolerance,
        }
    }
}

static STL_FORMATS: LazyLock<Arc<Enumeration>> =
    LazyLock::new(|| Arc::new(Enumeration::from_choices::<StlFormat>()));
static FLOAT_FORMATS: LazyLock<Arc<Enumeration>> =
    LazyLock::new(|| Arc::new(Enumeration::from_choices::<FloatFormat>()));
static STL_BACKENDS: LazyLock<Arc<Enumeration>> =
    LazyLock::new(|| Arc::new(Enumeration::from_choices::<StlWriterBackend>()));

/// STL export options as editable properties
///
/// The ASCII-only properties become read-only while the binary format is
/// selected.
#[derive(Debug)]
pub struct StlExportParameters {
    properties: PropertyGroup,
    backend: PropertyKey,
    format: PropertyKey,
    float_format: PropertyKey,
    float_precision: PropertyKey,
}

impl StlExportParameters {
    /// Create a new parameter set initialized from `options`
    pub fn new(options: &StlExportOptions) -> Self {
        let mut properties = PropertyGroup::new();
        let backend = properties.add(Property::enumerated(
            "Writer",
            Arc::clone(&STL_BACKENDS),
            options.backend.code(),
        ));
        let format = properties.add(Property::enumerated(
            "Format",
            Arc::clone(&STL_FORMATS),
            options.format.code(),
        ));
        let float_format = properties.add(Property::enumerated(
            "Float format",
            Arc::clone(&FLOAT_FORMATS),
            options.float_format.code(),
        ));
        let float_precision = properties.add(
            Property::new("Float precision", i32::from(options.float_precision))
                .with_range(f64::from(MIN_FLOAT_PRECISION), f64::from(MAX_FLOAT_PRECISION)),
        );

        let mut parameters = Self {
            properties,
            backend,
            format,
            float_format,
            float_precision,
        };
        parameters.update_ascii_only_flags();
        parameters
    }

    pub fn backend_key(&self) -> PropertyKey {
        self.backend
    }

    pub fn format_key(&self) -> PropertyKey {
        self.format
    }

    pub fn float_format_key(&self) -> PropertyKey {
        self.float_format
    }

    pub fn float_precision_key(&self) -> PropertyKey {
        self.float_precision
    }

    /// Current options
    pub fn options(&self) -> StlExportOptions {
        let code = |key| {
            self.properties
                .value(key)
                .and_then(PropertyValue::as_enumeration)
                .unwrap_or_default()
        };
        let precision = self
            .properties
            .value(self.float_precision)
            .and_then(PropertyValue::as_int)
            .and_then(|p| u8::try_from(p).ok())
            .unwrap_or(StlExportOptions::default().float_precision);

        StlExportOptions {
            backend: StlWriterBackend::from_code(code(self.backend)).unwrap_or_default(),
            format: StlFormat::from_code(code(self.format)).unwrap_or_default(),
            float_format: FloatFormat::from_code(code(self.float_format)).unwrap_or_default(),
            float_precision: precision,
        }
    }

    fn update_ascii_only_flags(&mut self) {
        let binary = self.options().format == StlFormat::Binary;
        self.properties.set_user_read_only(self.float_format, binary);
        self.properties.set_user_read_only(self.float_precision, binary);
    }
}

impl PropertyOwner for StlExportParameters {
    fn properties(&self) -> &PropertyGroup {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut PropertyGroup {
        &mut self.properties
    }

    fn on_property_changed(&mut self, key: PropertyKey) {
        if key == self.format {
            self.update_ascii_only_flags();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyError;

    #[test]
    fn test_parameters_round_trip_options() {
        let options = StlExportOptions {
            backend: StlWriterBackend::Restricted,
            format: StlFormat::Ascii,
            float_format: FloatFormat::Fixed,
            float_precision: 3,
        };
        let parameters = StlExportParameters::new(&options);
        assert_eq!(parameters.options(), options);

        let format = parameters.properties().get(parameters.format_key()).unwrap();
        assert_eq!(format.describe(), "ASCII");
    }

    #[test]
    fn test_ascii_only_properties_follow_format() {
        let mut parameters = StlExportParameters::new(&StlExportOptions::default());
        let precision = parameters.float_precision_key();
        assert!(matches!(
            parameters.set_property_value(precision, 3.into()),
            Err(PropertyError::ReadOnly(_))
        ));

        parameters
            .set_property_value(parameters.format_key(), PropertyValue::Enumeration(StlFormat::Ascii.code()))
            .unwrap();
        parameters.set_property_value(precision, 3.into()).unwrap();
        assert_eq!(parameters.options().float_precision, 3);

        assert!(matches!(
            parameters.set_property_value(precision, 12.into()),
            Err(PropertyError::OutOfRange { .. })
        ));
        assert!(matches!(
            parameters.set_property_value(parameters.float_format_key(), PropertyValue::Enumeration(9)),
            Err(PropertyError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_export_options_from_config() {
        let mut config = AppConfig::default();
        config.tessellation_tolerance = 0.5;
        config.stl_export.backend = StlWriterBackend::Restricted;
        let options = ExportOptions::from_config(&config);
        assert_eq!(options.tessellation_tolerance, 0.5);
        assert_eq!(options.stl.backend, StlWriterBackend::Restricted);
    }
}
