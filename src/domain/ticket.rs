//! Tickets and receipts exchanged with callers of the lot

use crate::domain::types::{Spot, VehicleClass};
use serde::Serialize;

/// Proof of an allocation
///
/// The lot keeps no reference to issued tickets: validity is re-derived
/// from the referenced spot's current pool membership on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket {
    sequence: u64,
    spot: Spot,
    class: VehicleClass,
}

impl Ticket {
    pub fn new(sequence: u64, spot: Spot, class: VehicleClass) -> Self {
        Self { sequence, spot, class }
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn spot(&self) -> Spot {
        self.spot
    }

    #[inline]
    pub fn class(&self) -> VehicleClass {
        self.class
    }
}

/// Fee result produced when a ticket is released
///
/// Carries only the charge and the class it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receipt {
    charge: u64,
    class: VehicleClass,
}

impl Receipt {
    pub fn new(charge: u64, class: VehicleClass) -> Self {
        Self { charge, class }
    }

    #[inline]
    pub fn charge(&self) -> u64 {
        self.charge
    }

    #[inline]
    pub fn class(&self) -> VehicleClass {
        self.class
    }
}
