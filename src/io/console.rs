//! Line-oriented command console
//!
//! Reads one command per line (`park car`, `release 3`, `status`, `help`),
//! hands it to the attendant desk, and writes one JSON object per line.
//! Blank lines and lines starting with `#` are skipped so scripted input
//! can carry comments.

use crate::services::attendant::{Attendant, Command};
use anyhow::Context;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Run the console until input ends or shutdown is signalled
///
/// Returns the number of commands answered.
pub async fn run_console<R, W>(
    attendant: &mut Attendant,
    reader: R,
    mut writer: W,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0usize;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!(answered = %answered, "console_shutdown");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read console input")? else {
                    debug!(answered = %answered, "console_input_closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                let output = match line.parse::<Command>() {
                    Ok(command) => attendant.handle(command).to_json(),
                    Err(e) => {
                        warn!(input = %line, error = %e, "console_bad_command");
                        json!({ "result": "error", "error": "bad_command", "message": e.to_string() })
                            .to_string()
                    }
                };

                writer.write_all(output.as_bytes()).await.context("Failed to write reply")?;
                writer.write_all(b"\n").await.context("Failed to write reply")?;
                writer.flush().await.context("Failed to flush reply")?;
                answered += 1;
            }
        }
    }

    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fees::FeeSchedule;
    use crate::services::lot::{LotCapacity, ParkingLot};
    use std::sync::Arc;

    fn create_attendant() -> Attendant {
        let lot = ParkingLot::new(LotCapacity::new(0, 1, 0), FeeSchedule::default());
        Attendant::new(Arc::new(lot))
    }

    async fn run_script(script: &str) -> (usize, Vec<serde_json::Value>) {
        let mut desk = create_attendant();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut out: Vec<u8> = Vec::new();
        let answered = run_console(&mut desk, script.as_bytes(), &mut out, shutdown_rx).await.unwrap();
        let replies = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (answered, replies)
    }

    #[tokio::test]
    async fn test_script_round() {
        let script = "# morning\npark car\npark car\n\nrelease 0\nrelease 0\nstatus\n";
        let (answered, replies) = run_script(script).await;

        assert_eq!(answered, 5);
        assert_eq!(replies[0]["result"], "parked");
        assert_eq!(replies[1]["error"], "lot_full");
        assert_eq!(replies[2]["charge"], 200);
        assert_eq!(replies[3]["charge"], 200);
        assert_eq!(replies[4]["total_spots"], 1);
    }

    #[tokio::test]
    async fn test_bad_command_answered() {
        let (answered, replies) = run_script("park boat\nrelease 9\n").await;
        assert_eq!(answered, 2);
        assert_eq!(replies[0]["error"], "bad_command");
        assert_eq!(replies[1]["error"], "unknown_ticket");
    }

    #[tokio::test]
    async fn test_shutdown_stops_console() {
        let mut desk = create_attendant();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        // Reader that never yields a line
        let (reader, _keep_open) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(reader);
        shutdown_tx.send(true).unwrap();

        let answered = run_console(&mut desk, reader, tokio::io::sink(), shutdown_rx).await.unwrap();
        assert_eq!(answered, 0);
    }
}
