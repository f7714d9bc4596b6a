//! Lock-free lot metrics and periodic reporting
//!
//! Counters are plain atomics updated on the park/release paths. `report()`
//! swaps the periodic counters to get a snapshot while callers keep going.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only; allocation decisions never read them.

use crate::domain::types::{VehicleClass, CLASS_COUNT};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Park latency buckets (microseconds), powers of two
/// Buckets: ≤1, ≤2, ≤4, ≤8, ≤16, ≤32, ≤64, ≤128, ≤256, ≤512, >512
const NUM_BUCKETS: usize = 11;

/// Upper bound of bucket `i`; the overflow bucket reports 1024
#[inline]
fn bucket_upper_bound(i: usize) -> u64 {
    1 << i
}

#[inline]
fn bucket_index(latency_us: u64) -> usize {
    (0..NUM_BUCKETS - 1).find(|&i| latency_us <= bucket_upper_bound(i)).unwrap_or(NUM_BUCKETS - 1)
}

/// Upper bound of the bucket holding the given percentile (0 when empty)
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile).ceil() as u64;
    buckets
        .iter()
        .scan(0u64, |seen, &count| {
            *seen += count;
            Some(*seen)
        })
        .position(|seen| seen >= target)
        .map_or(bucket_upper_bound(NUM_BUCKETS - 1), bucket_upper_bound)
}

/// Lock-free metrics collector for one lot
pub struct LotMetrics {
    /// Successful parks (monotonic)
    parks_total: AtomicU64,
    /// Releases that freed a spot (monotonic)
    releases_total: AtomicU64,
    /// Releases of an already-free spot (monotonic)
    releases_repeated_total: AtomicU64,
    /// Park calls rejected with LotFull (monotonic)
    lot_full_total: AtomicU64,
    /// Release calls rejected with InvalidTicket (monotonic)
    invalid_tickets_total: AtomicU64,
    /// Sum of all receipt charges (monotonic)
    charges_total: AtomicU64,
    /// Occupied spots per class (gauge, written under the lot lock)
    occupied: [AtomicU64; CLASS_COUNT],
    /// Parks since last report (reset on report)
    parks_since_report: AtomicU64,
    /// Park latency histogram (reset on report)
    park_latency_buckets: [AtomicU64; NUM_BUCKETS],
    park_latency_sum_us: AtomicU64,
    park_latency_max_us: AtomicU64,
    /// Last report time (only touched by the reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl LotMetrics {
    pub fn new() -> Self {
        Self {
            parks_total: AtomicU64::new(0),
            releases_total: AtomicU64::new(0),
            releases_repeated_total: AtomicU64::new(0),
            lot_full_total: AtomicU64::new(0),
            invalid_tickets_total: AtomicU64::new(0),
            charges_total: AtomicU64::new(0),
            occupied: std::array::from_fn(|_| AtomicU64::new(0)),
            parks_since_report: AtomicU64::new(0),
            park_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            park_latency_sum_us: AtomicU64::new(0),
            park_latency_max_us: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a successful park and how long it took
    #[inline]
    pub fn record_park(&self, latency_us: u64) {
        self.parks_total.fetch_add(1, Ordering::Relaxed);
        self.parks_since_report.fetch_add(1, Ordering::Relaxed);
        self.park_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.park_latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        self.park_latency_max_us.fetch_max(latency_us, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lot_full(&self) {
        self.lot_full_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an issued receipt; `freed` is false for repeated releases
    #[inline]
    pub fn record_release(&self, charge: u64, freed: bool) {
        if freed {
            self.releases_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.releases_repeated_total.fetch_add(1, Ordering::Relaxed);
        }
        self.charges_total.fetch_add(charge, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalid_ticket(&self) {
        self.invalid_tickets_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the occupied gauge for a class
    #[inline]
    pub fn set_occupied(&self, class: VehicleClass, count: usize) {
        self.occupied[class.index()].store(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn occupied(&self, class: VehicleClass) -> u64 {
        self.occupied[class.index()].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn parks_total(&self) -> u64 {
        self.parks_total.load(Ordering::Relaxed)
    }

    /// Calculate and return a summary, then reset periodic counters
    pub fn report(&self) -> LotMetricsSummary {
        let parks_count = self.parks_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.park_latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.park_latency_max_us.swap(0, Ordering::Relaxed);
        let buckets: [u64; NUM_BUCKETS] =
            std::array::from_fn(|i| self.park_latency_buckets[i].swap(0, Ordering::Relaxed));

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let parks_per_sec = if elapsed.as_secs_f64() > 0.0 {
            parks_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if parks_count > 0 { latency_sum / parks_count } else { 0 };

        LotMetricsSummary {
            parks_total: self.parks_total.load(Ordering::Relaxed),
            releases_total: self.releases_total.load(Ordering::Relaxed),
            releases_repeated_total: self.releases_repeated_total.load(Ordering::Relaxed),
            lot_full_total: self.lot_full_total.load(Ordering::Relaxed),
            invalid_tickets_total: self.invalid_tickets_total.load(Ordering::Relaxed),
            charges_total: self.charges_total.load(Ordering::Relaxed),
            occupied: std::array::from_fn(|i| self.occupied[i].load(Ordering::Relaxed)),
            parks_per_sec,
            park_lat_avg_us: avg_latency,
            park_lat_max_us: max_latency,
            park_lat_p99_us: percentile_from_buckets(&buckets, 0.99),
        }
    }
}

impl Default for LotMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct LotMetricsSummary {
    pub parks_total: u64,
    pub releases_total: u64,
    pub releases_repeated_total: u64,
    pub lot_full_total: u64,
    pub invalid_tickets_total: u64,
    pub charges_total: u64,
    /// Occupied spots per class, indexed by `VehicleClass::index()`
    pub occupied: [u64; CLASS_COUNT],
    pub parks_per_sec: f64,
    pub park_lat_avg_us: u64,
    pub park_lat_max_us: u64,
    pub park_lat_p99_us: u64,
}

impl LotMetricsSummary {
    pub fn log(&self) {
        info!(
            parks_total = %self.parks_total,
            parks_per_sec = format!("{:.1}", self.parks_per_sec),
            releases_total = %self.releases_total,
            releases_repeated = %self.releases_repeated_total,
            lot_full = %self.lot_full_total,
            invalid_tickets = %self.invalid_tickets_total,
            charges_total = %self.charges_total,
            occupied_bike = %self.occupied[VehicleClass::Bike.index()],
            occupied_car = %self.occupied[VehicleClass::Car.index()],
            occupied_truck = %self.occupied[VehicleClass::Truck.index()],
            park_avg_us = %self.park_lat_avg_us,
            park_p99_us = %self.park_lat_p99_us,
            "metrics"
        );
    }
}
