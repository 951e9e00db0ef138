//! Headless tile-match runner (default binary).
//!
//! Runs one level driven by a simple auto-player and prints every outbound
//! message as a JSON line on stdout. Logs go to stderr.
//!
//! Environment:
//! - `TILE_MATCH_CONFIG`: path to a JSON engine config (defaults otherwise)
//! - `TILE_MATCH_SEED` / `TILE_MATCH_MODE` / `TILE_MATCH_ROWS` / `TILE_MATCH_COLS`: overrides
//! - `TILE_MATCH_STEPS`: auto-player moves before shutdown (default 120)
//! - `TILE_MATCH_THINK_MS`: pause between moves (default 150)
//! - `RUST_LOG`: log filter (default `warn`)

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tile_match::adapter::{DriverHandle, InboundCommand, OutboundMessage, SessionDriver, DEFAULT_MAX_PENDING};
use tile_match::core::{BoardSnapshot, CellPhase, EngineConfig, GameSession, SimpleRng};
use tile_match::types::ItemKind;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn load_config() -> Result<EngineConfig> {
    let mut config = match std::env::var("TILE_MATCH_CONFIG") {
        Ok(path) => EngineConfig::from_path(&path)
            .with_context(|| format!("failed to load engine config from {path}"))?,
        Err(_) => EngineConfig::default(),
    };
    config.apply_env();
    config.validate().context("invalid engine config")?;
    Ok(config)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn print_line(msg: &OutboundMessage) -> Result<()> {
    println!("{}", msg.to_line()?);
    Ok(())
}

/// Pick the next placement: complete a pair, else grow a single-kind cell,
/// else seed an empty cell.
fn choose_move(
    snapshot: &BoardSnapshot,
    regular_kinds: u8,
    rng: &mut SimpleRng,
    seq: u64,
) -> Option<InboundCommand> {
    let open = |row: usize, col: usize| {
        snapshot
            .cell(row, col)
            .filter(|c| c.phase != CellPhase::Eliminating && c.slots.iter().any(Option::is_none))
    };

    let mut grow = None;
    let mut empty = None;
    for row in 0..snapshot.rows {
        for col in 0..snapshot.cols {
            let Some(cell) = open(row, col) else { continue };
            let kinds: Vec<ItemKind> = cell.slots.iter().flatten().copied().collect();
            match kinds.as_slice() {
                [a, b] if a == b && a.is_regular() => {
                    return Some(InboundCommand::Place {
                        seq,
                        kind: *a,
                        row,
                        col,
                        slot: None,
                    });
                }
                [a] if a.is_regular() => {
                    grow.get_or_insert((*a, row, col));
                }
                [] => {
                    empty.get_or_insert((row, col));
                }
                _ => {}
            }
        }
    }

    if let Some((kind, row, col)) = grow {
        return Some(InboundCommand::Place {
            seq,
            kind,
            row,
            col,
            slot: None,
        });
    }
    let (row, col) = empty?;
    let kind = ItemKind::Regular(rng.next_range(regular_kinds as u32) as u8);
    Some(InboundCommand::Place {
        seq,
        kind,
        row,
        col,
        slot: None,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config()?;
    let steps = env_u64("TILE_MATCH_STEPS", 120);
    let think = Duration::from_millis(env_u64("TILE_MATCH_THINK_MS", 150));
    let regular_kinds = config.regular_kinds;
    let mut rng = SimpleRng::new(config.seed.wrapping_add(0x9E37_79B9));

    let session = GameSession::new(config)?;
    let (driver, handle) = SessionDriver::channel(session, DEFAULT_MAX_PENDING);
    let DriverHandle { cmd_tx, mut out_rx } = handle;
    let driver_task = tokio::spawn(driver.run());

    let mut seq = 0u64;
    for _ in 0..steps {
        seq += 1;
        cmd_tx.send(InboundCommand::Snapshot { seq }).await?;
        let snapshot = loop {
            let Some(msg) = out_rx.recv().await else {
                bail!("session driver stopped unexpectedly");
            };
            match msg {
                OutboundMessage::Snapshot {
                    seq: reply,
                    snapshot,
                    ..
                } if reply == seq => break snapshot,
                other => print_line(&other)?,
            }
        };
        if !snapshot.playable() {
            break;
        }

        seq += 1;
        match choose_move(&snapshot, regular_kinds, &mut rng, seq) {
            Some(cmd) => cmd_tx.send(cmd).await?,
            None => {
                cmd_tx
                    .send(InboundCommand::DropNear { seq, row: 0, col: 0 })
                    .await?
            }
        }
        tokio::time::sleep(think).await;
    }

    cmd_tx.send(InboundCommand::Shutdown).await?;
    while let Some(msg) = out_rx.recv().await {
        print_line(&msg)?;
        if matches!(msg, OutboundMessage::Closed { .. }) {
            break;
        }
    }

    let session = driver_task.await?;
    info!(
        score = session.score(),
        outcome = ?session.outcome(),
        moves = session.moves_used(),
        "autoplay finished"
    );
    Ok(())
}
