//! Attendant desk - caller-side ticket bookkeeping for the console
//!
//! The lot itself never remembers tickets. A human at a console only has the
//! sequence number printed on their ticket, so the desk keeps every ticket it
//! issued and looks it up by number. Tickets are kept after release so that
//! a second release of the same number stays idempotent.

use crate::domain::error::LotError;
use crate::domain::ticket::{Receipt, Ticket};
use crate::domain::types::{UnknownVehicleClass, VehicleClass};
use crate::services::lot::{Occupancy, ParkingLot};
use rustc_hash::FxHashMap;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// A single console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Park(VehicleClass),
    Release(u64),
    Status,
    Help,
}

/// Why a command line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    BadClass(UnknownVehicleClass),
    BadSequence(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::UnknownCommand(cmd) => write!(f, "unknown command '{}'", cmd),
            CommandError::MissingArgument(what) => write!(f, "missing argument: {}", what),
            CommandError::BadClass(e) => write!(f, "{}", e),
            CommandError::BadSequence(s) => write!(f, "'{}' is not a ticket number", s),
        }
    }
}

impl std::error::Error for CommandError {}

impl std::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err(CommandError::Empty);
        };

        match verb.to_ascii_lowercase().as_str() {
            "park" => {
                let class = parts.next().ok_or(CommandError::MissingArgument("vehicle class"))?;
                class.parse().map(Command::Park).map_err(CommandError::BadClass)
            }
            "release" | "unpark" => {
                let seq = parts.next().ok_or(CommandError::MissingArgument("ticket number"))?;
                let seq = seq.trim_start_matches('#');
                seq.parse().map(Command::Release).map_err(|_| CommandError::BadSequence(seq.to_string()))
            }
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Parked(Ticket),
    Released { sequence: u64, receipt: Receipt },
    Rejected(LotError),
    /// The desk never issued this number; the lot is not consulted
    UnknownTicket(u64),
    Status { occupancy: Occupancy, total_spots: usize },
    Help,
}

impl Reply {
    /// Render as a single-line JSON object
    pub fn to_json(&self) -> String {
        let value = match self {
            Reply::Parked(ticket) => json!({
                "result": "parked",
                "ticket": ticket.sequence(),
                "class": ticket.class(),
                "spot": ticket.spot().id(),
            }),
            Reply::Released { sequence, receipt } => json!({
                "result": "released",
                "ticket": sequence,
                "class": receipt.class(),
                "charge": receipt.charge(),
            }),
            Reply::Rejected(err) => json!({
                "result": "error",
                "error": err.as_str(),
                "message": err.to_string(),
            }),
            Reply::UnknownTicket(sequence) => json!({
                "result": "error",
                "error": "unknown_ticket",
                "ticket": sequence,
            }),
            Reply::Status { occupancy, total_spots } => json!({
                "result": "status",
                "total_spots": total_spots,
                "classes": occupancy.classes,
            }),
            Reply::Help => json!({
                "result": "help",
                "commands": ["park <bike|car|truck>", "release <ticket>", "status", "help"],
            }),
        };
        value.to_string()
    }
}

/// Issues and redeems tickets against a shared lot
///
/// One desk serves one console session, so its ticket book lives and dies
/// with that session.
pub struct Attendant {
    lot: Arc<ParkingLot>,
    /// Every ticket issued by this desk. Never evicted: a released number
    /// must still resolve so a repeat release returns the same receipt.
    tickets: FxHashMap<u64, Ticket>,
}

impl Attendant {
    pub fn new(lot: Arc<ParkingLot>) -> Self {
        Self { lot, tickets: FxHashMap::default() }
    }

    pub fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::Park(class) => match self.lot.park(class) {
                Ok(ticket) => {
                    self.tickets.insert(ticket.sequence(), ticket);
                    Reply::Parked(ticket)
                }
                Err(e) => Reply::Rejected(e),
            },
            Command::Release(sequence) => {
                let Some(ticket) = self.tickets.get(&sequence) else {
                    debug!(sequence = %sequence, "desk_unknown_ticket");
                    return Reply::UnknownTicket(sequence);
                };
                match self.lot.release(ticket) {
                    Ok(receipt) => Reply::Released { sequence, receipt },
                    Err(e) => Reply::Rejected(e),
                }
            }
            Command::Status => Reply::Status {
                occupancy: self.lot.occupancy(),
                total_spots: self.lot.total_spot_count(),
            },
            Command::Help => Reply::Help,
        }
    }

    /// Number of tickets issued through this desk
    pub fn issued(&self) -> usize {
        self.tickets.len()
    }
}
