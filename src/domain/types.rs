//! Shared types for the parking lot

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of vehicle classes (array-backed per-class storage uses this)
pub const CLASS_COUNT: usize = 3;

/// Vehicle class, ordered by increasing physical size
///
/// Determines both which spots a vehicle may take (exact match only)
/// and the fee multiplier applied on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Bike,
    Car,
    Truck,
}

impl VehicleClass {
    /// All classes, smallest first
    pub const ALL: [VehicleClass; CLASS_COUNT] =
        [VehicleClass::Bike, VehicleClass::Car, VehicleClass::Truck];

    /// Stable index into per-class arrays
    #[inline]
    pub fn index(self) -> usize {
        match self {
            VehicleClass::Bike => 0,
            VehicleClass::Car => 1,
            VehicleClass::Truck => 2,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Bike => "bike",
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
        }
    }

    /// Spot size label used in configuration
    #[inline]
    pub fn spot_size(&self) -> &'static str {
        match self {
            VehicleClass::Bike => "small",
            VehicleClass::Car => "medium",
            VehicleClass::Truck => "large",
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text does not name a vehicle class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVehicleClass(pub String);

impl std::fmt::Display for UnknownVehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown vehicle class '{}' (expected bike, car or truck)", self.0)
    }
}

impl std::error::Error for UnknownVehicleClass {}

impl std::str::FromStr for VehicleClass {
    type Err = UnknownVehicleClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bike" | "small" => Ok(VehicleClass::Bike),
            "car" | "medium" => Ok(VehicleClass::Car),
            "truck" | "large" => Ok(VehicleClass::Truck),
            _ => Err(UnknownVehicleClass(s.to_string())),
        }
    }
}

/// Newtype wrapper for spot identities (UUIDv7, time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
pub struct SpotId(Uuid);

impl SpotId {
    /// Generate a fresh identity
    #[inline]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for SpotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One allocatable unit of a fixed vehicle class
///
/// Two spots of the same class are distinct; identity is the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Spot {
    id: SpotId,
    class: VehicleClass,
}

impl Spot {
    /// Create a spot with a freshly generated identity
    pub fn new(class: VehicleClass) -> Self {
        Self { id: SpotId::generate(), class }
    }

    #[inline]
    pub fn id(&self) -> SpotId {
        self.id
    }

    #[inline]
    pub fn class(&self) -> VehicleClass {
        self.class
    }
}
