//! Services - allocation logic and state management
//!
//! This module contains the core business logic services:
//! - `lot` - Spot allocator (park / release / conservation queries)
//! - `fees` - Flat-rate fee schedule
//! - `attendant` - Desk that remembers issued tickets for console callers

pub mod attendant;
pub mod fees;
pub mod lot;

// Re-export commonly used types
pub use attendant::{Attendant, Command, Reply};
pub use fees::FeeSchedule;
pub use lot::{LotCapacity, Occupancy, ParkingLot};
