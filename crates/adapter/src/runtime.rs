//! Adapter runtime integration.
//!
//! Bridges the synchronous, tick-driven [`GameSession`] with a tokio event
//! loop. Commands arrive on a bounded channel; everything the session has to
//! say goes out on an unbounded one.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::GameSession;
use crate::engine::{apply_drop_near, apply_move, apply_place};
use crate::protocol::{create_ack, create_error, InboundCommand, OutboundMessage};

/// Default driver tick period (approximately 60 FPS).
pub const DEFAULT_TICK_MS: u64 = 16;

/// Default inbound queue depth.
pub const DEFAULT_MAX_PENDING: usize = 64;

/// Owns one session and pumps it from a tokio task.
pub struct SessionDriver {
    session: GameSession,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    tick: Duration,
}

/// Caller-side ends of a driver's channels.
pub struct DriverHandle {
    pub cmd_tx: mpsc::Sender<InboundCommand>,
    pub out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl SessionDriver {
    pub fn new(
        session: GameSession,
        cmd_rx: mpsc::Receiver<InboundCommand>,
        out_tx: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        Self {
            session,
            cmd_rx,
            out_tx,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }

    /// Build a driver together with its channel handle.
    pub fn channel(session: GameSession, max_pending: usize) -> (Self, DriverHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(max_pending.max(1));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (Self::new(session, cmd_rx, out_tx), DriverHandle { cmd_tx, out_rx })
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Run until `Shutdown` or until every command sender is dropped.
    ///
    /// The session is started if needed and torn down on exit; it is returned
    /// for inspection.
    pub async fn run(mut self) -> GameSession {
        self.session.start();
        self.flush_events();

        let started = Instant::now();
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed = started.elapsed().as_millis() as u64;
                    let delta = elapsed.saturating_sub(self.session.now_ms());
                    self.session.tick(delta);
                    self.flush_events();
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(InboundCommand::Shutdown) | None => break,
                    Some(cmd) => {
                        self.handle(cmd);
                        self.flush_events();
                    }
                },
            }
        }

        self.session.teardown();
        self.flush_events();
        let closed = OutboundMessage::Closed {
            ts: self.session.now_ms(),
            score: self.session.score(),
        };
        let _ = self.out_tx.send(closed);
        info!(score = self.session.score(), "session driver stopped");
        self.session
    }

    fn handle(&mut self, cmd: InboundCommand) {
        debug!(?cmd, "inbound command");
        let ts = self.session.now_ms();
        let reply = match cmd {
            InboundCommand::Place {
                seq,
                kind,
                row,
                col,
                slot,
            } => match apply_place(&mut self.session, kind, row, col, slot) {
                Ok(out) => OutboundMessage::Ack {
                    seq,
                    ts,
                    item: Some(out.item),
                    slot: Some(out.slot),
                },
                Err(err) => create_error(seq, ts, err),
            },
            InboundCommand::Move {
                seq,
                item,
                row,
                col,
                slot,
            } => match apply_move(&mut self.session, item, row, col, slot) {
                Ok(landed) => OutboundMessage::Ack {
                    seq,
                    ts,
                    item: Some(item),
                    slot: Some(landed),
                },
                Err(err) => create_error(seq, ts, err),
            },
            InboundCommand::DropNear { seq, row, col } => {
                match apply_drop_near(&mut self.session, row, col) {
                    Ok(()) => create_ack(seq, ts),
                    Err(err) => create_error(seq, ts, err),
                }
            }
            InboundCommand::Stats { seq } => OutboundMessage::Stats {
                seq,
                ts,
                stats: self.session.stats_snapshot(),
            },
            InboundCommand::Snapshot { seq } => OutboundMessage::Snapshot {
                seq,
                ts,
                snapshot: self.session.snapshot(),
            },
            InboundCommand::Shutdown => return,
        };
        let _ = self.out_tx.send(reply);
    }

    fn flush_events(&mut self) {
        let ts = self.session.now_ms();
        for event in self.session.take_events() {
            let _ = self.out_tx.send(OutboundMessage::Event { ts, event });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::types::{EngineEvent, ItemKind, Position};

    fn quiet_session() -> GameSession {
        let mut config = EngineConfig {
            rows: 2,
            cols: 2,
            ..EngineConfig::default()
        };
        config.spawn.initial_fill_ratio = 0.0;
        config.rules.starvation_check = false;
        let mut session = GameSession::new(config).unwrap();
        session.start();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn place_is_acked_and_elimination_streamed() {
        let mut session = quiet_session();
        let a = ItemKind::Regular(0);
        session.seed_cell(Position::new(0, 0), [Some(a), Some(a), None]);

        let (driver, mut handle) = SessionDriver::channel(session, 8);
        let task = tokio::spawn(driver.run());

        handle
            .cmd_tx
            .send(InboundCommand::Place {
                seq: 1,
                kind: a,
                row: 0,
                col: 0,
                slot: Some(2),
            })
            .await
            .unwrap();

        time::sleep(Duration::from_millis(250)).await;
        handle.cmd_tx.send(InboundCommand::Shutdown).await.unwrap();
        let session = task.await.unwrap();

        let mut acked = false;
        let mut eliminated = false;
        let mut closed = false;
        while let Ok(msg) = handle.out_rx.try_recv() {
            match msg {
                OutboundMessage::Ack { seq: 1, slot, .. } => {
                    assert_eq!(slot, Some(2));
                    acked = true;
                }
                OutboundMessage::Event {
                    event: EngineEvent::Eliminated(ev),
                    ..
                } => {
                    assert_eq!((ev.row, ev.col, ev.combo, ev.score_delta), (0, 0, 1, 100));
                    eliminated = true;
                }
                OutboundMessage::Closed { .. } => closed = true,
                _ => {}
            }
        }
        assert!(acked && eliminated && closed);
        assert!(session.torn_down());
        assert_eq!(session.pending_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_place_reports_error_code() {
        let mut session = quiet_session();
        let b = ItemKind::Regular(1);
        session.seed_cell(Position::new(1, 1), [Some(b), Some(b), Some(b)]);
        session.eliminate(Position::new(1, 1));

        let (driver, mut handle) = SessionDriver::channel(session, 8);
        let task = tokio::spawn(driver.run());

        handle
            .cmd_tx
            .send(InboundCommand::Place {
                seq: 7,
                kind: b,
                row: 1,
                col: 1,
                slot: None,
            })
            .await
            .unwrap();
        drop(handle.cmd_tx);
        task.await.unwrap();

        let mut saw_error = false;
        while let Ok(msg) = handle.out_rx.try_recv() {
            if let OutboundMessage::Error { seq, code, .. } = msg {
                assert_eq!(seq, 7);
                assert_eq!(code, "placement_rejected");
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_request_returns_targets() {
        let (driver, mut handle) = SessionDriver::channel(quiet_session(), 8);
        let task = tokio::spawn(driver.run());

        handle.cmd_tx.send(InboundCommand::Stats { seq: 3 }).await.unwrap();
        handle.cmd_tx.send(InboundCommand::Shutdown).await.unwrap();
        task.await.unwrap();

        let mut stats = None;
        while let Ok(msg) = handle.out_rx.try_recv() {
            if let OutboundMessage::Stats { seq: 3, stats: s, .. } = msg {
                stats = Some(s);
            }
        }
        let stats = stats.unwrap();
        assert_eq!(stats.level_targets.len(), 3);
        assert_eq!(stats.eliminated_counts.total(), 0);
    }
}
