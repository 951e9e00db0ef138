//! Game session module - per-level context driving the elimination pipeline
//!
//! A [`GameSession`] owns everything that lives for one level: the board,
//! combo tracker, elimination counts, targets, RNG, item ids and the task
//! queue. Nothing is global, so several sessions can run side by side.
//!
//! Every delayed step is a [`Task`] in the session scheduler. Calling
//! [`GameSession::tick`] advances virtual time and runs each task at its own
//! due time:
//!
//! ```text
//! place ─▶ CheckMatch ─▶ eliminate ─▶ EndGrace ─▶ Refill ─▶ CheckMatch ...
//!                                                   └──▶ Cascade (cascade mode)
//! ```
//!
//! Periodic work (consistency scan, starvation check, time limit) re-arms
//! itself in the same queue. [`GameSession::teardown`] clears the queue.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::board::Board;
use crate::cascade;
use crate::cell::CellPhase;
use crate::combo::ComboTracker;
use crate::config::{ConfigError, EngineConfig};
use crate::consistency;
use crate::deadlock::{self, DeadlockVerdict};
use crate::item::{Item, ItemIdAlloc};
use crate::matching::detect;
use crate::obstacle::unlock_adjacent;
use crate::refill::{random_regular, RefillPolicy};
use crate::rng::SimpleRng;
use crate::scheduler::Scheduler;
use crate::scoring::calculate_score;
use crate::snapshot::{BoardSnapshot, CellSnapshot, StatsSnapshot};
use crate::targets::{choose_targets, EliminatedCounts};
use crate::types::*;

/// Deferred engine work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Run match detection on one cell.
    CheckMatch(Position),
    /// Scanner-driven elimination (re-detects before clearing).
    Eliminate(Position),
    /// Grace window after a clear has passed. Carries the cell's clear generation.
    EndGrace(Position, u32),
    Refill(Position, u32),
    /// Apply cascade gravity to the whole board.
    Cascade,
    ConsistencyScan,
    StarvationCheck,
    /// Last move spent; decide defeat once the board settles.
    OutOfMoves,
    TimeUp,
}

impl Task {
    /// Work that can still change the board or the counts.
    pub fn is_settling(&self) -> bool {
        matches!(
            self,
            Task::CheckMatch(_)
                | Task::Eliminate(_)
                | Task::EndGrace(..)
                | Task::Refill(..)
                | Task::Cascade
        )
    }
}

/// Per-level engine context.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: EngineConfig,
    board: Board,
    rng: SimpleRng,
    ids: ItemIdAlloc,
    combo: ComboTracker,
    counts: EliminatedCounts,
    targets: [LevelTarget; 3],
    refill: RefillPolicy,
    scheduler: Scheduler<Task>,
    /// Per-cell clear counter; grace and refill tasks from an older clear are stale.
    clears: Vec<u32>,
    events: Vec<EngineEvent>,
    now_ms: u64,
    score: u64,
    /// Moves spent against the budget (placements and moves).
    moves_used: u32,
    /// Successful placements and moves, drives the deadlock cadence.
    placements: u32,
    outcome: Option<Outcome>,
    started: bool,
    torn_down: bool,
}

impl GameSession {
    /// Create a session for one level. The board stays empty until [`start`](Self::start).
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = SimpleRng::new(config.seed);
        let targets = config.targets.unwrap_or_else(|| {
            choose_targets(
                &mut rng,
                config.regular_kinds,
                config.target_min_required,
                config.target_max_required,
            )
        });
        let refill = RefillPolicy::new(
            config.regular_kinds,
            config.spawn.refill_target_probability,
            config.spawn.obstacle_probability,
        );

        Ok(Self {
            board: Board::new(config.rows, config.cols),
            rng,
            ids: ItemIdAlloc::new(),
            combo: ComboTracker::new(config.timing.combo_window_ms),
            counts: EliminatedCounts::new(),
            targets,
            refill,
            scheduler: Scheduler::new(),
            clears: vec![0; config.rows * config.cols],
            events: Vec::new(),
            now_ms: 0,
            score: 0,
            moves_used: 0,
            placements: 0,
            outcome: None,
            started: false,
            torn_down: false,
            config,
        })
    }

    /// Populate the board and arm the periodic tasks.
    pub fn start(&mut self) {
        if self.started || self.torn_down {
            return;
        }
        self.started = true;
        self.populate();

        let timing = self.config.timing;
        self.schedule(timing.initial_scan_delay_ms, Task::ConsistencyScan);
        if self.config.rules.starvation_check {
            self.schedule(timing.starvation_interval_ms, Task::StarvationCheck);
        }
        if self.config.mode == GameMode::TimeAttack {
            self.schedule(self.config.time_limit_ms, Task::TimeUp);
        }

        info!(
            mode = self.config.mode.as_str(),
            rows = self.config.rows,
            cols = self.config.cols,
            seed = self.config.seed,
            items = self.board.item_count(),
            "session started"
        );
    }

    /// Initial population. Cells never start out matched.
    fn populate(&mut self) {
        let policy = RefillPolicy::new(
            self.config.regular_kinds,
            self.config.spawn.initial_target_probability,
            self.config.spawn.obstacle_probability,
        );
        let incomplete = self.counts.incomplete_kinds(&self.targets);
        let fill_ratio = self.config.spawn.initial_fill_ratio;
        let regular_kinds = self.config.regular_kinds;
        let obstacles_match = self.config.rules.obstacles_self_match;

        let positions: Vec<Position> = self.board.positions().collect();
        for pos in positions {
            let Some(cell) = self.board.get_mut(pos) else {
                continue;
            };
            for slot in 0..SLOTS_PER_CELL as u8 {
                if self.rng.chance(fill_ratio) {
                    let kind = policy.pick_kind(&mut self.rng, &incomplete);
                    cell.put(slot, Item::new(self.ids.next_id(), kind, slot));
                }
            }

            if let Some(kind) = detect(cell, obstacles_match) {
                let replacement = match kind {
                    ItemKind::Regular(n) => ItemKind::Regular((n + 1) % regular_kinds),
                    ItemKind::Obstacle(_) => random_regular(&mut self.rng, regular_kinds),
                };
                if let Some(mut item) = cell.take(SLOTS_PER_CELL as u8 - 1) {
                    item.kind = replacement;
                    cell.put(item.slot, item);
                }
            }
        }
    }

    /// Advance virtual time by `elapsed_ms`, running every task due on the way.
    pub fn tick(&mut self, elapsed_ms: u64) {
        if !self.started || self.torn_down {
            return;
        }
        let until = self.now_ms.saturating_add(elapsed_ms);
        while let Some((due, task)) = self.scheduler.pop_due(until) {
            self.now_ms = self.now_ms.max(due);
            self.combo.expire(self.now_ms);
            self.run(task);
            if self.torn_down {
                return;
            }
        }
        self.now_ms = until;
        self.combo.expire(self.now_ms);
    }

    /// Cancel every pending task. The session rejects all further work.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.scheduler.len();
        self.scheduler.clear();
        self.combo.cancel();
        self.torn_down = true;
        info!(cancelled, score = self.score, "session torn down");
    }

    fn schedule(&mut self, delay_ms: u64, task: Task) {
        self.scheduler.schedule(self.now_ms, delay_ms, task);
    }

    fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    fn run(&mut self, task: Task) {
        debug!(?task, now_ms = self.now_ms, "running task");
        match task {
            Task::CheckMatch(pos) => self.check_match(pos),
            Task::Eliminate(pos) => {
                self.eliminate(pos);
            }
            Task::EndGrace(pos, clear) => self.end_grace(pos, clear),
            Task::Refill(pos, clear) => self.refill_cell(pos, clear),
            Task::Cascade => self.cascade(),
            Task::ConsistencyScan => self.consistency_scan(),
            Task::StarvationCheck => self.starvation_check(),
            Task::OutOfMoves => self.out_of_moves(),
            Task::TimeUp => self.time_up(),
        }
    }

    fn check_match(&mut self, pos: Position) {
        let obstacles_match = self.config.rules.obstacles_self_match;
        let Some(cell) = self.board.get_mut(pos) else {
            return;
        };
        if cell.is_eliminating() {
            debug!(row = pos.row, col = pos.col, "match check skipped, cell mid-elimination");
            return;
        }
        if detect(cell, obstacles_match).is_some() {
            self.eliminate(pos);
        } else if cell.phase().settles_on_check() {
            cell.set_phase(CellPhase::Idle);
        }
    }

    /// Clear a matched cell: combo, score, counts, obstacle unlocks, refill.
    ///
    /// Ignored when the cell is already mid-elimination or holds no match.
    pub fn eliminate(&mut self, pos: Position) -> Option<EliminationEvent> {
        if !self.started || self.torn_down {
            return None;
        }
        let obstacles_match = self.config.rules.obstacles_self_match;
        let cell = self.board.get_mut(pos)?;
        if cell.is_eliminating() {
            debug!(row = pos.row, col = pos.col, "re-entrant elimination ignored");
            return None;
        }
        let kind = detect(cell, obstacles_match)?;

        cell.set_phase(CellPhase::Eliminating);
        let cleared = cell.clear();

        self.combo.expire(self.now_ms);
        let combo = self.combo.on_elimination(self.now_ms);
        let delta = calculate_score(self.config.mode, combo).total;
        self.score = self.score.saturating_add(delta as u64);
        self.counts.add(kind, cleared.len() as u32);

        let event = EliminationEvent {
            row: pos.row,
            col: pos.col,
            kind,
            score_delta: delta,
            combo,
        };
        info!(
            row = pos.row,
            col = pos.col,
            %kind,
            combo,
            score_delta = delta,
            score = self.score,
            "cell eliminated"
        );
        self.emit(EngineEvent::Eliminated(event));

        let unlocks = unlock_adjacent(&mut self.board, pos, &mut self.rng, self.config.regular_kinds);
        let mut unlocked_cells = BTreeSet::new();
        for unlock in unlocks {
            debug!(row = unlock.pos.row, col = unlock.pos.col, slot = unlock.slot, "obstacle unlocked");
            unlocked_cells.insert(unlock.pos);
            self.emit(EngineEvent::ObstacleUnlocked {
                row: unlock.pos.row,
                col: unlock.pos.col,
                slot: unlock.slot,
                from: unlock.from,
                to: unlock.to,
            });
        }
        let check_delay = self.config.timing.match_check_delay_ms;
        for cell_pos in unlocked_cells {
            self.schedule(check_delay, Task::CheckMatch(cell_pos));
        }

        let clear = self.bump_clear(pos);
        self.schedule(self.config.timing.elimination_grace_ms, Task::EndGrace(pos, clear));
        self.check_victory();
        Some(event)
    }

    fn bump_clear(&mut self, pos: Position) -> u32 {
        let Some(clear) = self.board.index(pos).and_then(|i| self.clears.get_mut(i)) else {
            return 0;
        };
        *clear = clear.wrapping_add(1);
        *clear
    }

    fn is_current_clear(&self, pos: Position, clear: u32) -> bool {
        self.board
            .index(pos)
            .and_then(|i| self.clears.get(i))
            .is_some_and(|&current| current == clear)
    }

    fn end_grace(&mut self, pos: Position, clear: u32) {
        if !self.is_current_clear(pos, clear) {
            debug!(row = pos.row, col = pos.col, clear, "stale grace task dropped");
            return;
        }
        let Some(cell) = self.board.get_mut(pos) else {
            return;
        };
        if cell.phase() != CellPhase::Eliminating {
            return;
        }
        cell.set_phase(CellPhase::Refilling);
        let timing = self.config.timing;
        let delay = timing
            .refill_delay_ms
            .saturating_sub(timing.elimination_grace_ms)
            .max(1);
        self.schedule(delay, Task::Refill(pos, clear));
    }

    fn refill_cell(&mut self, pos: Position, clear: u32) {
        if !self.is_current_clear(pos, clear) {
            debug!(row = pos.row, col = pos.col, clear, "stale refill task dropped");
            return;
        }
        let incomplete = self.counts.incomplete_kinds(&self.targets);
        let Some(cell) = self.board.get_mut(pos) else {
            return;
        };
        if cell.phase() != CellPhase::Refilling {
            return;
        }
        let added = self
            .refill
            .fill_cell(cell, &mut self.rng, &mut self.ids, &incomplete);
        cell.set_phase(CellPhase::CheckingMatch);

        debug!(row = pos.row, col = pos.col, added = added.len(), "cell refilled");
        self.emit(EngineEvent::Refilled {
            row: pos.row,
            col: pos.col,
            kinds: added.to_vec(),
        });

        self.schedule(self.config.timing.match_check_delay_ms, Task::CheckMatch(pos));
        if self.config.mode.has_gravity() {
            self.schedule(self.config.timing.cascade_fall_ms, Task::Cascade);
        }
    }

    fn cascade(&mut self) {
        let falls = cascade::resolve(&mut self.board);
        if falls.is_empty() {
            // Nothing fell: re-scan for matches created by the refill alone.
            let delay = self.config.timing.match_check_delay_ms;
            for (pos, _) in consistency::matched_cells(&self.board, self.config.rules.obstacles_self_match) {
                self.schedule(delay, Task::CheckMatch(pos));
            }
            return;
        }

        debug!(falls = falls.len(), "cascade resolved");
        let mut landed = BTreeSet::new();
        for fall in falls {
            landed.insert(fall.to);
            self.emit(EngineEvent::ItemFell {
                item: fall.item,
                from: fall.from,
                to: fall.to,
                slot: fall.to_slot,
            });
        }

        let delay = self.config.timing.cascade_fall_ms;
        for pos in landed {
            if let Some(cell) = self.board.get_mut(pos) {
                cell.set_phase(CellPhase::Falling);
            }
            self.schedule(delay, Task::CheckMatch(pos));
        }
    }

    fn consistency_scan(&mut self) {
        let report = consistency::repair(&mut self.board);
        if !report.is_clean() {
            warn!(
                resynced = report.resynced.len(),
                duplicates = report.duplicates.len(),
                "board desync repaired"
            );
        }
        for pos in report.touched() {
            warn!(row = pos.row, col = pos.col, "cell resynchronized");
            self.emit(EngineEvent::Desynced {
                row: pos.row,
                col: pos.col,
            });
        }

        let stagger = self.config.timing.scan_stagger_ms;
        let missed = consistency::matched_cells(&self.board, self.config.rules.obstacles_self_match);
        for (i, (pos, _)) in missed.into_iter().enumerate() {
            debug!(row = pos.row, col = pos.col, "scanner found unprocessed match");
            self.schedule(stagger.saturating_mul(i as u64 + 1), Task::Eliminate(pos));
        }

        if self.outcome.is_none() {
            self.schedule(self.config.timing.consistency_interval_ms, Task::ConsistencyScan);
        }
    }

    fn starvation_check(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.schedule(self.config.timing.starvation_interval_ms, Task::StarvationCheck);
        if !deadlock::is_starving(&self.board) {
            return;
        }

        let incomplete = self.counts.incomplete_kinds(&self.targets);
        let target_kinds = self.targets.map(|t| t.kind);
        let pool = if incomplete.is_empty() {
            &target_kinds[..]
        } else {
            &incomplete[..]
        };
        let Some(kind) = self.rng.choose(pool).copied() else {
            return;
        };

        let positions = deadlock::helper_drop(&mut self.board, kind, &mut self.rng, &mut self.ids);
        if positions.is_empty() {
            debug!("starving board has no room for a helper drop");
            return;
        }

        info!(%kind, "helper drop");
        let cells: BTreeSet<Position> = positions.iter().copied().collect();
        let delay = self.config.timing.match_check_delay_ms;
        for pos in cells {
            if let Some(cell) = self.board.get_mut(pos) {
                if cell.phase() == CellPhase::Idle {
                    cell.set_phase(CellPhase::Filling);
                }
            }
            self.schedule(delay, Task::CheckMatch(pos));
        }
        self.emit(EngineEvent::HelperDrop { kind, positions });
    }

    /// Run the true-deadlock check now, reshuffling if the board is stuck.
    pub fn check_deadlock(&mut self) -> DeadlockVerdict {
        let rules = self.config.rules;
        let verdict = deadlock::evaluate(
            &self.board,
            rules.deadlock_skip_empty_ratio,
            rules.deadlock_reshuffle_empty_ratio,
        );
        if verdict != DeadlockVerdict::Stuck {
            debug!(?verdict, "deadlock check");
            return verdict;
        }

        let moved = deadlock::reshuffle(&mut self.board, &mut self.rng);
        info!(items = moved, "no possible matches, board reshuffled");
        self.emit(EngineEvent::Reshuffled {
            items: moved as u32,
        });

        let delay = self.config.timing.match_check_delay_ms;
        let full: Vec<Position> = self
            .board
            .iter()
            .filter(|(_, cell)| cell.is_full() && !cell.is_eliminating())
            .map(|(pos, _)| pos)
            .collect();
        for pos in full {
            self.schedule(delay, Task::CheckMatch(pos));
        }
        verdict
    }

    fn out_of_moves(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        if self.scheduler.any(Task::is_settling) {
            self.schedule(self.config.timing.match_check_delay_ms, Task::OutOfMoves);
            return;
        }
        if !self.counts.all_met(&self.targets) {
            self.finish(Outcome::Defeat(DefeatReason::OutOfMoves));
        }
    }

    fn time_up(&mut self) {
        if self.outcome.is_none() && !self.counts.all_met(&self.targets) {
            self.finish(Outcome::Defeat(DefeatReason::TimeUp));
        }
    }

    fn check_victory(&mut self) {
        if self.config.mode.is_terminal()
            && self.outcome.is_none()
            && self.counts.all_met(&self.targets)
        {
            self.finish(Outcome::Victory);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        info!(?outcome, score = self.score, now_ms = self.now_ms, "session finished");
        let event = match outcome {
            Outcome::Victory => EngineEvent::Victory { score: self.score },
            Outcome::Defeat(reason) => EngineEvent::Defeat { reason },
        };
        self.emit(event);
    }

    // Request primitives. Validation lives in the request layer; these only
    // refuse what would corrupt the board.

    /// Seat a new item and arm a match check. Counts as one move.
    pub fn place_item(&mut self, pos: Position, slot: u8, kind: ItemKind) -> Option<ItemId> {
        if !self.is_playable() {
            return None;
        }
        let id = self.ids.next_id();
        let cell = self.board.get_mut(pos)?;
        if cell.is_eliminating() || !cell.put(slot, Item::new(id, kind, slot)) {
            return None;
        }
        if cell.phase() == CellPhase::Idle {
            cell.set_phase(CellPhase::Filling);
        }
        self.schedule(self.config.timing.match_check_delay_ms, Task::CheckMatch(pos));
        self.record_placement();
        Some(id)
    }

    /// Transfer a live item to `to`, at `preferred_slot` if free. Counts as one move.
    ///
    /// Returns the slot the item landed in, or `None` with the board untouched.
    pub fn move_item(&mut self, id: ItemId, to: Position, preferred_slot: Option<u8>) -> Option<u8> {
        if !self.is_playable() {
            return None;
        }
        let (from, item) = self.board.find_item(id)?;
        if !item.is_draggable() {
            return None;
        }
        if self.board.get(from)?.is_eliminating() || self.board.get(to)?.is_eliminating() {
            return None;
        }

        let taken = self.board.get_mut(from)?.take_by_id(id)?;
        let landed = self.board.get_mut(to).and_then(|dst| {
            let slot = dst.resolve_slot(preferred_slot)?;
            dst.put(slot, taken).then_some(slot)
        });
        let Some(slot) = landed else {
            if let Some(src) = self.board.get_mut(from) {
                src.put(taken.slot, taken);
            }
            return None;
        };

        if let Some(dst) = self.board.get_mut(to) {
            if dst.phase() == CellPhase::Idle {
                dst.set_phase(CellPhase::Filling);
            }
        }
        self.schedule(self.config.timing.match_check_delay_ms, Task::CheckMatch(to));
        self.record_placement();
        Some(slot)
    }

    /// A drop landed near `pos`: re-check it and its eight neighbours.
    pub fn check_near(&mut self, pos: Position) {
        if !self.is_playable() || !self.board.in_bounds(pos) {
            return;
        }
        let delay = self.config.timing.match_check_delay_ms;
        self.schedule(delay, Task::CheckMatch(pos));
        for n in self.board.neighbors(pos) {
            self.schedule(delay, Task::CheckMatch(n));
        }
    }

    fn record_placement(&mut self) {
        self.moves_used = self.moves_used.saturating_add(1);
        self.placements = self.placements.saturating_add(1);

        let every = self.config.rules.deadlock_check_every;
        if every > 0 && self.placements % every == 0 {
            self.check_deadlock();
        }

        if self.moves_left() == Some(0) && !self.scheduler.any(|t| *t == Task::OutOfMoves) {
            let timing = self.config.timing;
            self.schedule(
                timing.refill_delay_ms + timing.match_check_delay_ms,
                Task::OutOfMoves,
            );
        }
    }

    /// Replace a cell's contents with fresh items, bypassing spawn odds.
    ///
    /// For scripted levels and tests. No match check is armed.
    pub fn seed_cell(&mut self, pos: Position, kinds: [Option<ItemKind>; SLOTS_PER_CELL]) -> bool {
        let Some(cell) = self.board.get_mut(pos) else {
            return false;
        };
        cell.clear();
        cell.set_phase(CellPhase::Idle);
        for (slot, kind) in kinds.iter().enumerate() {
            if let Some(kind) = kind {
                cell.put(slot as u8, Item::new(self.ids.next_id(), *kind, slot as u8));
            }
        }
        true
    }

    /// Drain pending outbound events.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            eliminated_counts: self.counts.clone(),
            level_targets: self.targets,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            rows: self.board.rows(),
            cols: self.board.cols(),
            cells: self
                .board
                .iter()
                .map(|(_, cell)| CellSnapshot {
                    slots: cell.kinds(),
                    phase: cell.phase(),
                })
                .collect(),
            mode: self.config.mode,
            now_ms: self.now_ms,
            score: self.score,
            combo: self.combo.combo(),
            moves_used: self.moves_used,
            moves_left: self.moves_left(),
            outcome: self.outcome,
        }
    }

    /// Started, not torn down and no outcome yet.
    pub fn is_playable(&self) -> bool {
        self.started && !self.torn_down && self.outcome.is_none()
    }

    /// Remaining move budget; `None` when moves are unlimited.
    pub fn moves_left(&self) -> Option<u32> {
        if self.config.mode != GameMode::Classic || self.config.max_moves == 0 {
            return None;
        }
        Some(self.config.max_moves.saturating_sub(self.moves_used))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo.combo()
    }

    pub fn eliminated_counts(&self) -> &EliminatedCounts {
        &self.counts
    }

    pub fn targets(&self) -> &[LevelTarget; 3] {
        &self.targets
    }

    pub fn moves_used(&self) -> u32 {
        self.moves_used
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn has_pending(&self, task: Task) -> bool {
        self.scheduler.any(|t| *t == task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ItemKind = ItemKind::Regular(0);
    const B: ItemKind = ItemKind::Regular(1);

    fn quiet_config(rows: usize, cols: usize) -> EngineConfig {
        let mut config = EngineConfig {
            rows,
            cols,
            ..EngineConfig::default()
        };
        config.spawn.initial_fill_ratio = 0.0;
        config.spawn.obstacle_probability = 0.0;
        config.rules.starvation_check = false;
        config.rules.deadlock_check_every = 0;
        config.targets = Some([
            LevelTarget::new(ItemKind::Regular(5), 30),
            LevelTarget::new(ItemKind::Regular(6), 30),
            LevelTarget::new(ItemKind::Regular(7), 30),
        ]);
        config
    }

    fn started(config: EngineConfig) -> GameSession {
        let mut session = GameSession::new(config).unwrap();
        session.start();
        session
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = EngineConfig {
            rows: 0,
            ..EngineConfig::default()
        };
        assert!(GameSession::new(config).is_err());
    }

    #[test]
    fn start_populates_without_matches() {
        let mut config = EngineConfig::default();
        config.spawn.initial_fill_ratio = 1.0;
        let session = started(config);

        assert_eq!(session.board().item_count(), session.board().total_slots());
        for (_, cell) in session.board().iter() {
            assert!(detect(cell, true).is_none());
            assert!(cell.is_consistent());
        }
    }

    #[test]
    fn same_seed_same_board() {
        let a = started(EngineConfig::default());
        let b = started(EngineConfig::default());
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.targets(), b.targets());
    }

    #[test]
    fn eliminate_twice_clears_once() {
        let mut session = started(quiet_config(1, 1));
        let pos = Position::new(0, 0);
        session.seed_cell(pos, [Some(A), Some(A), Some(A)]);

        assert!(session.eliminate(pos).is_some());
        assert!(session.eliminate(pos).is_none());
        assert_eq!(session.eliminated_counts().get(A), 3);
        assert_eq!(session.score(), 100);
        assert_eq!(session.board().get(pos).unwrap().phase(), CellPhase::Eliminating);
    }

    #[test]
    fn non_matching_cell_is_not_eliminated() {
        let mut session = started(quiet_config(1, 1));
        let pos = Position::new(0, 0);
        session.seed_cell(pos, [Some(A), Some(B), Some(A)]);
        assert!(session.eliminate(pos).is_none());
        assert_eq!(session.board().item_count(), 3);
    }

    #[test]
    fn grace_then_refill_then_check() {
        let mut session = started(quiet_config(1, 1));
        let pos = Position::new(0, 0);
        session.seed_cell(pos, [Some(A), Some(A), Some(A)]);
        session.eliminate(pos);

        session.tick(300);
        assert_eq!(session.board().get(pos).unwrap().phase(), CellPhase::Refilling);
        assert!(session.board().get(pos).unwrap().is_empty());

        session.tick(500);
        let cell = session.board().get(pos).unwrap();
        assert!(cell.is_full());
        assert!(session.has_pending(Task::CheckMatch(pos)));
    }

    #[test]
    fn consistency_scan_repairs_and_eliminates_missed_match() {
        let mut session = started(quiet_config(1, 2));
        let left = Position::new(0, 0);
        let right = Position::new(0, 1);
        session.seed_cell(right, [Some(B), Some(B), Some(B)]);

        // Item recorded at slot 2 but seated at slot 0.
        let cell = session.board.get_mut(left).unwrap();
        cell.slots_mut()[0] = Some(Item::new(ItemId(900), A, 2));

        session.tick(500);
        let events = session.take_events();
        assert!(events.contains(&EngineEvent::Desynced { row: 0, col: 0 }));
        assert!(session.board().get(left).unwrap().is_consistent());
        assert_eq!(session.board().get(left).unwrap().kind_at(2), Some(A));

        session.tick(100);
        assert_eq!(session.eliminated_counts().get(B), 3);
    }

    #[test]
    fn teardown_cancels_pending_work() {
        let mut session = started(quiet_config(1, 1));
        let pos = Position::new(0, 0);
        session.seed_cell(pos, [Some(A), Some(A), Some(A)]);
        session.eliminate(pos);
        assert!(session.pending_tasks() > 0);

        session.teardown();
        assert_eq!(session.pending_tasks(), 0);
        session.tick(10_000);
        assert!(session.board().get(pos).unwrap().is_empty());
        assert!(session.place_item(pos, 0, A).is_none());
    }

    #[test]
    fn move_item_rolls_back_when_destination_full() {
        let mut session = started(quiet_config(1, 2));
        session.seed_cell(Position::new(0, 0), [Some(A), None, None]);
        session.seed_cell(Position::new(0, 1), [Some(B), Some(B), Some(A)]);
        let item = *session.board().get(Position::new(0, 0)).unwrap().item_at(0).unwrap();

        assert_eq!(session.move_item(item.id, Position::new(0, 1), None), None);
        assert_eq!(
            session.board().find_item(item.id).map(|(p, i)| (p, i.slot)),
            Some((Position::new(0, 0), 0))
        );
        assert_eq!(session.moves_used(), 0);
    }
}
