//! Lot load simulator - hammers one shared lot from many tasks
//!
//! Each worker parks random classes and releases what it holds (sometimes
//! twice, sometimes with a forged ticket). Afterwards the lot is drained and
//! checked: every ticket number unique, numbers increasing per worker, spot
//! count unchanged, every spot back in its available pool.
//!
//! Usage:
//!   cargo run --bin lot-sim -- --workers 16 --ops 50000

use anyhow::bail;
use clap::Parser;
use parkinglot_gateway::domain::{LotError, Spot, Ticket, VehicleClass};
use parkinglot_gateway::infra::{Config, LotMetrics};
use parkinglot_gateway::services::ParkingLot;
use rustc_hash::FxHashSet;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lot-sim")]
#[command(about = "Concurrent park/release load against one in-memory lot")]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of concurrent workers
    #[arg(long, default_value = "8")]
    workers: usize,

    /// Operations per worker
    #[arg(long, default_value = "10000")]
    ops: usize,

    /// Seed for the per-worker generators
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// xorshift64 - good enough to pick classes and actions
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64, worker: usize) -> Self {
        Self(seed.wrapping_add((worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)) | 1)
    }

    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

#[derive(Debug, Default)]
struct WorkerReport {
    sequences: Vec<u64>,
    lot_full: u64,
    repeated: u64,
    forged_rejected: u64,
    held: Vec<Ticket>,
}

fn run_worker(lot: &ParkingLot, worker: usize, ops: usize, seed: u64) -> WorkerReport {
    let mut rng = XorShift::new(seed, worker);
    let mut report = WorkerReport::default();

    for _ in 0..ops {
        match rng.below(100) {
            0..=54 => {
                let class = VehicleClass::ALL[rng.below(VehicleClass::ALL.len())];
                match lot.park(class) {
                    Ok(ticket) => {
                        report.sequences.push(ticket.sequence());
                        report.held.push(ticket);
                    }
                    Err(LotError::LotFull { .. }) => report.lot_full += 1,
                    Err(e) => warn!(worker = %worker, error = %e, "sim_unexpected_error"),
                }
            }
            55..=94 if !report.held.is_empty() => {
                let idx = rng.below(report.held.len());
                let ticket = report.held.swap_remove(idx);
                if lot.release(&ticket).is_ok() && rng.below(4) == 0 && lot.release(&ticket).is_ok() {
                    report.repeated += 1;
                }
            }
            95..=99 => {
                let class = VehicleClass::ALL[rng.below(VehicleClass::ALL.len())];
                let forged = Ticket::new(rng.next(), Spot::new(class), class);
                if matches!(lot.release(&forged), Err(LotError::InvalidTicket { .. })) {
                    report.forged_rejected += 1;
                }
            }
            _ => {}
        }
    }

    report
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());
    let capacity = config.capacity();

    let metrics = Arc::new(LotMetrics::new());
    let lot = Arc::new(ParkingLot::new(capacity, config.fees()).with_metrics(metrics.clone()));

    info!(workers = %args.workers, ops = %args.ops, total_spots = %capacity.total(), "sim_started");
    let start = Instant::now();

    let mut handles = Vec::with_capacity(args.workers);
    for worker in 0..args.workers {
        let lot = lot.clone();
        let (ops, seed) = (args.ops, args.seed);
        handles.push(tokio::task::spawn_blocking(move || run_worker(&lot, worker, ops, seed)));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await?);
    }
    let elapsed = start.elapsed();

    let mut seen = FxHashSet::default();
    let mut violations = Vec::new();
    for (worker, report) in reports.iter().enumerate() {
        if report.sequences.windows(2).any(|w| w[0] >= w[1]) {
            violations.push(format!("worker {} saw non-increasing ticket numbers", worker));
        }
        for &sequence in &report.sequences {
            if !seen.insert(sequence) {
                violations.push(format!("ticket number {} issued twice", sequence));
            }
        }
    }

    if lot.total_spot_count() != capacity.total() {
        violations.push(format!(
            "spot count drifted: {} != {}",
            lot.total_spot_count(),
            capacity.total()
        ));
    }

    // Drain what the workers still hold
    for ticket in reports.iter().flat_map(|r| r.held.iter()) {
        lot.release(ticket)?;
    }
    for class in VehicleClass::ALL {
        if lot.available_count(class) != capacity.for_class(class) {
            violations.push(format!(
                "{} pool not fully available after drain: {} of {}",
                class,
                lot.available_count(class),
                capacity.for_class(class)
            ));
        }
    }

    let summary = metrics.report();
    summary.log();
    println!(
        "{}",
        json!({
            "workers": args.workers,
            "ops_per_worker": args.ops,
            "elapsed_ms": elapsed.as_millis() as u64,
            "tickets": seen.len(),
            "lot_full": reports.iter().map(|r| r.lot_full).sum::<u64>(),
            "repeated_releases": reports.iter().map(|r| r.repeated).sum::<u64>(),
            "forged_rejected": reports.iter().map(|r| r.forged_rejected).sum::<u64>(),
            "charges_total": summary.charges_total,
            "violations": violations,
        })
    );

    if !violations.is_empty() {
        bail!("{} invariant violation(s)", violations.len());
    }
    Ok(())
}
