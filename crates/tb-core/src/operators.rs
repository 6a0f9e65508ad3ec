//! Operator presets for the commands the geometry server understands
//!
//! Each operator knows its command identifier, its defaults and allowed
//! ranges, and how to render itself as a property bag with the keys the
//! server reads.

use std::fmt;
use std::str::FromStr;

use tb_protocol::PropertyBag;

use crate::adapter::{format_float, unit_properties};
use crate::error::ToxicblendError;
use crate::types::{ParseEnumError, UnitSettings};

/// Grid resolution the server computes on: sqrt(i32::MAX) - 2
pub const CALCULATION_RESOLUTION: u32 = 46_338;

/// A command the geometry server can run
pub trait Operator {
    /// Stable command identifier
    fn command(&self) -> &'static str;

    /// Human-readable name
    fn label(&self) -> &'static str;

    /// Whether the command needs the active object
    fn requires_object(&self) -> bool {
        true
    }

    /// Check every parameter against its documented range
    fn validate(&self) -> Result<(), ToxicblendError>;

    /// Parameters as sent on the wire
    fn properties(&self) -> PropertyBag;
}

fn check_range(property: &'static str, value: f64, min: f64, max: f64) -> Result<(), ToxicblendError> {
    if value.is_nan() || value < min || value > max {
        return Err(ToxicblendError::InvalidProperty {
            property,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Plane a 2D operation projects onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionPlane {
    YzPlane,
    XzPlane,
    #[default]
    XyPlane,
}

impl fmt::Display for ProjectionPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionPlane::YzPlane => write!(f, "YZ_PLANE"),
            ProjectionPlane::XzPlane => write!(f, "XZ_PLANE"),
            ProjectionPlane::XyPlane => write!(f, "XY_PLANE"),
        }
    }
}

impl FromStr for ProjectionPlane {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YZ" | "YZ_PLANE" => Ok(ProjectionPlane::YzPlane),
            "XZ" | "XZ_PLANE" => Ok(ProjectionPlane::XzPlane),
            "XY" | "XY_PLANE" => Ok(ProjectionPlane::XyPlane),
            _ => Err(ParseEnumError {
                kind: "projection plane",
                value: s.to_string(),
                expected: "XY, XZ, YZ".to_string(),
            }),
        }
    }
}

/// Shape of the voxel brush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushType {
    #[default]
    Sphere,
    Box,
}

impl fmt::Display for BrushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrushType::Sphere => write!(f, "SPHERE"),
            BrushType::Box => write!(f, "BOX"),
        }
    }
}

impl FromStr for BrushType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SPHERE" => Ok(BrushType::Sphere),
            "BOX" => Ok(BrushType::Box),
            _ => Err(ParseEnumError {
                kind: "brush type",
                value: s.to_string(),
                expected: "SPHERE, BOX".to_string(),
            }),
        }
    }
}

/// How brush strokes combine with existing voxel density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    Additive,
    Multiply,
    Replace,
    /// Lower densities never overwrite higher ones
    #[default]
    Peak,
}

impl fmt::Display for BrushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrushMode::Additive => write!(f, "MODE_ADDITIVE"),
            BrushMode::Multiply => write!(f, "MODE_MULTIPLY"),
            BrushMode::Replace => write!(f, "MODE_REPLACE"),
            BrushMode::Peak => write!(f, "MODE_PEAK"),
        }
    }
}

impl FromStr for BrushMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.strip_prefix("MODE_").unwrap_or(&upper) {
            "ADDITIVE" => Ok(BrushMode::Additive),
            "MULTIPLY" => Ok(BrushMode::Multiply),
            "REPLACE" => Ok(BrushMode::Replace),
            "PEAK" => Ok(BrushMode::Peak),
            _ => Err(ParseEnumError {
                kind: "brush mode",
                value: s.to_string(),
                expected: "ADDITIVE, MULTIPLY, REPLACE, PEAK".to_string(),
            }),
        }
    }
}

/// Median axis of a flat outline
#[derive(Debug, Clone, PartialEq)]
pub struct MedianAxis {
    pub projection_plane: ProjectionPlane,
    /// Process each ring segment on its own server thread
    pub use_multithreading: bool,
    /// Z values below this count as zero
    pub z_epsilon: f64,
    /// Filter for internal edges relative to the outer ring
    pub dot_product_limit: f64,
    pub units: UnitSettings,
}

impl MedianAxis {
    pub const COMMAND: &'static str = "object.toxicblend_medianaxis";
}

impl Default for MedianAxis {
    fn default() -> Self {
        Self {
            projection_plane: ProjectionPlane::default(),
            use_multithreading: false,
            z_epsilon: 1.5,
            dot_product_limit: 0.5,
            units: UnitSettings::default(),
        }
    }
}

impl Operator for MedianAxis {
    fn command(&self) -> &'static str {
        Self::COMMAND
    }

    fn label(&self) -> &'static str {
        "Toxicblend:Median axis"
    }

    fn validate(&self) -> Result<(), ToxicblendError> {
        check_range("zEpsilon", self.z_epsilon, 0.00001, 10.0)?;
        check_range("dotProductLimit", self.dot_product_limit, 0.0001, 1.0)
    }

    fn properties(&self) -> PropertyBag {
        let mut properties = PropertyBag::new()
            .with("projectionPlane", self.projection_plane.to_string())
            .with("useMultiThreading", flag(self.use_multithreading))
            .with("zEpsilon", format_float(self.z_epsilon))
            .with("dotProductLimit", format_float(self.dot_product_limit))
            .with("calculationResolution", CALCULATION_RESOLUTION.to_string());
        unit_properties(&self.units, &mut properties);
        properties
    }
}

/// Server-generated circle; needs no input object
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricCircle {
    pub projection_plane: ProjectionPlane,
    pub use_multithreading: bool,
    /// Maximum deviation from a straight line before it is segmented
    pub simplify_limit: f64,
    pub z_epsilon: f64,
    pub dot_product_limit: f64,
    pub units: UnitSettings,
}

impl ParametricCircle {
    pub const COMMAND: &'static str = "object.toxicblend_parametriccircleoperation";
}

impl Default for ParametricCircle {
    fn default() -> Self {
        Self {
            projection_plane: ProjectionPlane::default(),
            use_multithreading: false,
            simplify_limit: 0.5,
            z_epsilon: 1.5,
            dot_product_limit: 0.95,
            units: UnitSettings::default(),
        }
    }
}

impl Operator for ParametricCircle {
    fn command(&self) -> &'static str {
        Self::COMMAND
    }

    fn label(&self) -> &'static str {
        "Toxicblend:Custom draw circle"
    }

    fn requires_object(&self) -> bool {
        false
    }

    fn validate(&self) -> Result<(), ToxicblendError> {
        check_range("simplifyLimit", self.simplify_limit, 0.0001, 100.0)?;
        check_range("zEpsilon", self.z_epsilon, 0.00001, 10.0)?;
        check_range("dotProductLimit", self.dot_product_limit, 0.0001, 1.0)
    }

    fn properties(&self) -> PropertyBag {
        let mut properties = PropertyBag::new()
            .with("projectionPlane", self.projection_plane.to_string())
            .with("useMultiThreading", flag(self.use_multithreading))
            .with("simplifyLimit", format_float(self.simplify_limit))
            .with("zEpsilon", format_float(self.z_epsilon))
            .with("dotProductLimit", format_float(self.dot_product_limit))
            .with("calculationResolution", CALCULATION_RESOLUTION.to_string());
        unit_properties(&self.units, &mut properties);
        properties
    }
}

/// Voxel volume brushed along the edges of a lattice
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub brush_type: BrushType,
    pub brush_mode: BrushMode,
    pub brush_size: f64,
    pub resolution: f64,
    pub iso_value: f64,
    pub draw_step: f64,
}

impl Volume {
    pub const COMMAND: &'static str = "object.toxicblend_volume";
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            brush_type: BrushType::default(),
            brush_mode: BrushMode::default(),
            brush_size: 1.0,
            resolution: 32.0,
            iso_value: 0.66,
            draw_step: 1.0,
        }
    }
}

impl Operator for Volume {
    fn command(&self) -> &'static str {
        Self::COMMAND
    }

    fn label(&self) -> &'static str {
        "Toxiclibs volume"
    }

    fn validate(&self) -> Result<(), ToxicblendError> {
        check_range("voxelBrushSize", self.brush_size, 0.001, 25.0)?;
        check_range("voxelResolution", self.resolution, 1.0, 512.0)?;
        check_range("voxelIsoValue", self.iso_value, 0.01, 1.0)?;
        check_range("voxelBrushDrawStep", self.draw_step, 0.001, 256.0)
    }

    fn properties(&self) -> PropertyBag {
        PropertyBag::new()
            .with("voxelBrushSize", format_float(self.brush_size))
            .with("voxelResolution", format_float(self.resolution))
            .with("voxelIsoValue", format_float(self.iso_value))
            .with("voxelBrushDrawStep", format_float(self.draw_step))
            .with("voxelBrushType", self.brush_type.to_string())
            .with("voxelBrushMode", self.brush_mode.to_string())
    }
}
