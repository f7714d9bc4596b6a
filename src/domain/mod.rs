//! Domain models - core parking types
//!
//! This module contains the canonical data types used throughout the system:
//! - `VehicleClass` - closed set of vehicle sizes
//! - `Spot` / `SpotId` - identity-bearing allocation units
//! - `Ticket` / `Receipt` - records handed to callers
//! - `LotError` - failures of park and release

pub mod error;
pub mod ticket;
pub mod types;

// Re-export commonly used types at module level
pub use error::LotError;
pub use ticket::{Receipt, Ticket};
pub use types::{Spot, SpotId, VehicleClass, CLASS_COUNT};
