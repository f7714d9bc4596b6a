//! Spot allocator for a fixed-capacity lot
//!
//! Every spot lives in exactly one of two pools per class: available or
//! occupied. Spots are created once at construction and only move between
//! pools afterwards, so the total count never changes.
//!
//! Key behaviors:
//! - `park` takes any available spot of the exact class, or fails with LotFull
//! - `release` is idempotent for legitimate tickets: a spot that is already
//!   available is left alone and a receipt is still issued
//! - a ticket whose spot is in neither pool is rejected as InvalidTicket
//!
//! Both pools and the sequence counter sit behind a single mutex, which makes
//! each park and release linearizable with respect to the others.

use crate::domain::error::LotError;
use crate::domain::ticket::{Receipt, Ticket};
use crate::domain::types::{Spot, VehicleClass, CLASS_COUNT};
use crate::infra::metrics::LotMetrics;
use crate::services::fees::FeeSchedule;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Number of spots to create per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LotCapacity {
    counts: [usize; CLASS_COUNT],
}

impl LotCapacity {
    /// Capacity from small (bike), medium (car) and large (truck) counts
    pub fn new(small: usize, medium: usize, large: usize) -> Self {
        Self { counts: [small, medium, large] }
    }

    #[inline]
    pub fn for_class(&self, class: VehicleClass) -> usize {
        self.counts[class.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Per-class pool sizes at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassOccupancy {
    pub class: VehicleClass,
    pub available: usize,
    pub occupied: usize,
}

/// Consistent view of every pool, taken under one lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub classes: [ClassOccupancy; CLASS_COUNT],
}

impl Occupancy {
    #[inline]
    pub fn get(&self, class: VehicleClass) -> &ClassOccupancy {
        &self.classes[class.index()]
    }

    pub fn total(&self) -> usize {
        self.classes.iter().map(|c| c.available + c.occupied).sum()
    }
}

/// Which branch a release took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseKind {
    /// Spot moved from occupied back to available
    Freed,
    /// Spot was already available; nothing moved
    Repeated,
}

struct Pools {
    available: [FxHashSet<Spot>; CLASS_COUNT],
    occupied: [FxHashSet<Spot>; CLASS_COUNT],
    /// Next ticket sequence number (post-incremented on park)
    next_sequence: u64,
}

impl Pools {
    fn snapshot(&self) -> Occupancy {
        Occupancy {
            classes: VehicleClass::ALL.map(|class| ClassOccupancy {
                class,
                available: self.available[class.index()].len(),
                occupied: self.occupied[class.index()].len(),
            }),
        }
    }
}

/// The allocator: owns all spots of one lot and their pool state
pub struct ParkingLot {
    pools: Mutex<Pools>,
    capacity: LotCapacity,
    fees: FeeSchedule,
    metrics: Option<Arc<LotMetrics>>,
}

impl ParkingLot {
    /// Materialize `capacity` distinct spots, all initially available
    pub fn new(capacity: LotCapacity, fees: FeeSchedule) -> Self {
        let available = VehicleClass::ALL.map(|class| {
            (0..capacity.for_class(class)).map(|_| Spot::new(class)).collect::<FxHashSet<_>>()
        });

        info!(
            small = %capacity.for_class(VehicleClass::Bike),
            medium = %capacity.for_class(VehicleClass::Car),
            large = %capacity.for_class(VehicleClass::Truck),
            base_rate = %fees.base_rate(),
            "lot_initialized"
        );

        Self {
            pools: Mutex::new(Pools {
                available,
                occupied: std::array::from_fn(|_| FxHashSet::default()),
                next_sequence: 0,
            }),
            capacity,
            fees,
            metrics: None,
        }
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<LotMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Allocate an available spot of exactly `class` and issue a ticket
    ///
    /// Fails with `LotError::LotFull` when the class has no free spot; the
    /// lot is unchanged in that case.
    pub fn park(&self, class: VehicleClass) -> Result<Ticket, LotError> {
        let start = Instant::now();
        let idx = class.index();

        let mut pools = self.pools.lock();
        let Some(spot) = pools.available[idx].iter().next().copied() else {
            let occupied = pools.occupied[idx].len();
            drop(pools);

            if let Some(ref metrics) = self.metrics {
                metrics.record_lot_full();
            }
            warn!(class = %class, occupied = %occupied, "lot_full");
            return Err(LotError::LotFull { class, occupied });
        };

        pools.available[idx].remove(&spot);
        pools.occupied[idx].insert(spot);
        let sequence = pools.next_sequence;
        pools.next_sequence += 1;
        if let Some(ref metrics) = self.metrics {
            metrics.set_occupied(class, pools.occupied[idx].len());
        }
        drop(pools);

        let latency_us = start.elapsed().as_micros() as u64;
        if let Some(ref metrics) = self.metrics {
            metrics.record_park(latency_us);
        }
        debug!(
            sequence = %sequence,
            class = %class,
            spot_id = %spot.id(),
            latency_us = %latency_us,
            "spot_allocated"
        );

        Ok(Ticket::new(sequence, spot, class))
    }

    /// Release the spot named by `ticket` and issue a receipt
    ///
    /// The spot's current pool membership decides the outcome:
    /// occupied spots are freed, already-available spots are left alone
    /// (the receipt is still issued), and unknown spots are rejected with
    /// `LotError::InvalidTicket`.
    pub fn release(&self, ticket: &Ticket) -> Result<Receipt, LotError> {
        let spot = ticket.spot();
        let idx = spot.class().index();

        let kind = {
            let mut pools = self.pools.lock();
            if pools.occupied[idx].remove(&spot) {
                pools.available[idx].insert(spot);
                if let Some(ref metrics) = self.metrics {
                    metrics.set_occupied(spot.class(), pools.occupied[idx].len());
                }
                Some(ReleaseKind::Freed)
            } else if pools.available[idx].contains(&spot) {
                Some(ReleaseKind::Repeated)
            } else {
                None
            }
        };

        let Some(kind) = kind else {
            if let Some(ref metrics) = self.metrics {
                metrics.record_invalid_ticket();
            }
            warn!(sequence = %ticket.sequence(), spot_id = %spot.id(), "invalid_ticket");
            return Err(LotError::InvalidTicket { sequence: ticket.sequence(), spot: spot.id() });
        };

        let receipt = Receipt::new(self.fees.fee(ticket.class()), ticket.class());
        if let Some(ref metrics) = self.metrics {
            metrics.record_release(receipt.charge(), kind == ReleaseKind::Freed);
        }

        match kind {
            ReleaseKind::Freed => debug!(
                sequence = %ticket.sequence(),
                class = %ticket.class(),
                spot_id = %spot.id(),
                charge = %receipt.charge(),
                "spot_released"
            ),
            ReleaseKind::Repeated => info!(
                sequence = %ticket.sequence(),
                class = %ticket.class(),
                spot_id = %spot.id(),
                "release_repeated"
            ),
        }

        Ok(receipt)
    }

    /// Size of the available pools plus the occupied pools
    pub fn total_spot_count(&self) -> usize {
        let pools = self.pools.lock();
        pools.available.iter().map(|s| s.len()).sum::<usize>()
            + pools.occupied.iter().map(|s| s.len()).sum::<usize>()
    }

    pub fn available_count(&self, class: VehicleClass) -> usize {
        self.pools.lock().available[class.index()].len()
    }

    pub fn occupied_count(&self, class: VehicleClass) -> usize {
        self.pools.lock().occupied[class.index()].len()
    }

    /// Configured number of spots for a class
    #[inline]
    pub fn capacity(&self, class: VehicleClass) -> usize {
        self.capacity.for_class(class)
    }

    /// Snapshot of every pool
    pub fn occupancy(&self) -> Occupancy {
        self.pools.lock().snapshot()
    }

    #[inline]
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }
}
