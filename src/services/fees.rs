//! Flat-rate fee schedule
//!
//! The charge for a class is `base_rate * multiplier(class)`. Default ratios
//! are 1:2:3 (bike:car:truck); both the base rate and each multiplier can be
//! overridden from configuration.

use crate::domain::types::{VehicleClass, CLASS_COUNT};

/// Default base charge for the smallest class
pub const DEFAULT_BASE_RATE: u64 = 100;

/// Default multipliers indexed by `VehicleClass::index()`
pub const DEFAULT_MULTIPLIERS: [u64; CLASS_COUNT] = [1, 2, 3];

/// Pure mapping from vehicle class to a flat charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    base_rate: u64,
    multipliers: [u64; CLASS_COUNT],
}

impl FeeSchedule {
    /// Schedule with the given base rate and default ratios
    pub fn new(base_rate: u64) -> Self {
        Self { base_rate, multipliers: DEFAULT_MULTIPLIERS }
    }

    /// Override the multiplier for one class
    pub fn with_multiplier(mut self, class: VehicleClass, multiplier: u64) -> Self {
        self.multipliers[class.index()] = multiplier;
        self
    }

    /// Charge for a vehicle of the given class (saturates instead of overflowing)
    #[inline]
    pub fn fee(&self, class: VehicleClass) -> u64 {
        self.base_rate.saturating_mul(self.multipliers[class.index()])
    }

    #[inline]
    pub fn base_rate(&self) -> u64 {
        self.base_rate
    }

    #[inline]
    pub fn multiplier(&self, class: VehicleClass) -> u64 {
        self.multipliers[class.index()]
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fees() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.fee(VehicleClass::Bike), 100);
        assert_eq!(fees.fee(VehicleClass::Car), 200);
        assert_eq!(fees.fee(VehicleClass::Truck), 300);
    }

    #[test]
    fn test_ratios_hold_for_any_base_rate() {
        for base in [0, 1, 7, 100, 2500, 1_000_000] {
            let fees = FeeSchedule::new(base);
            let smallest = fees.fee(VehicleClass::Bike);
            assert_eq!(fees.fee(VehicleClass::Car), smallest * 2);
            assert_eq!(fees.fee(VehicleClass::Truck), smallest * 3);
        }
    }

    #[test]
    fn test_multiplier_override() {
        let fees = FeeSchedule::new(50).with_multiplier(VehicleClass::Truck, 5);
        assert_eq!(fees.fee(VehicleClass::Truck), 250);
        assert_eq!(fees.fee(VehicleClass::Car), 100);
        assert_eq!(fees.multiplier(VehicleClass::Truck), 5);
    }

    #[test]
    fn test_fee_saturates() {
        let fees = FeeSchedule::new(u64::MAX);
        assert_eq!(fees.fee(VehicleClass::Truck), u64::MAX);
    }
}
