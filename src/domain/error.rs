//! Errors surfaced by lot operations

use crate::domain::types::{SpotId, VehicleClass};
use std::fmt::Display;

/// Failure of a `park` or `release` call. Lot state is untouched in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotError {
    /// No available spot of the requested class
    LotFull { class: VehicleClass, occupied: usize },
    /// The ticket references a spot this lot never created
    InvalidTicket { sequence: u64, spot: SpotId },
}

impl LotError {
    /// Whether retrying the same call later can succeed
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LotError::LotFull { .. })
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            LotError::LotFull { .. } => "lot_full",
            LotError::InvalidTicket { .. } => "invalid_ticket",
        }
    }
}

impl Display for LotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LotError::LotFull { class, occupied } => {
                write!(f, "all {} {} spots are full", occupied, class.spot_size())
            }
            LotError::InvalidTicket { sequence, spot } => {
                write!(f, "invalid ticket #{} (spot {} is not part of this lot)", sequence, spot)
            }
        }
    }
}

impl std::error::Error for LotError {}
