//! Parking lot gateway - console front end for a single in-memory lot
//!
//! Reads commands from stdin and answers on stdout, one JSON object per line.
//! Logs go to stderr.
//!
//! Module structure:
//! - `domain/` - Core types (VehicleClass, Spot, Ticket, Receipt, LotError)
//! - `services/` - Allocation logic (ParkingLot, FeeSchedule, Attendant)
//! - `io/` - Console
//! - `infra/` - Config, Metrics

use clap::Parser;
use parkinglot_gateway::domain::VehicleClass;
use parkinglot_gateway::infra::{Config, LotMetrics};
use parkinglot_gateway::io::run_console;
use parkinglot_gateway::services::{Attendant, ParkingLot};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Parking lot gateway - allocate spots and issue receipts
#[derive(Parser, Debug)]
#[command(name = "parkinglot-gateway", version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"), about)]
struct Args {
    /// Path to TOML configuration file (default: $CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug to see every allocation
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(LotMetrics::new());
    let lot = Arc::new(ParkingLot::new(config.capacity(), config.fees()).with_metrics(metrics.clone()));

    info!(
        git_hash = env!("GIT_HASH"),
        config_file = %config.config_file(),
        site_id = %config.site_id(),
        total_spots = %lot.total_spot_count(),
        bike_fee = %lot.fees().fee(VehicleClass::Bike),
        car_fee = %lot.fees().fee(VehicleClass::Car),
        truck_fee = %lot.fees().fee(VehicleClass::Truck),
        "config_loaded"
    );

    // Periodic metrics reporter
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let reporter_metrics = metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            // First tick fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                reporter_metrics.report().log();
            }
        });
    }

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    let mut attendant = Attendant::new(lot.clone());
    info!("console_started");
    let answered =
        run_console(&mut attendant, BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown_rx)
            .await?;

    metrics.report().log();
    info!(
        answered = %answered,
        tickets_issued = %attendant.issued(),
        total_spots = %lot.total_spot_count(),
        "parkinglot-gateway shutdown complete"
    );
    Ok(())
}
