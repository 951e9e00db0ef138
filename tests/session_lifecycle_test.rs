//! Level lifecycle: outcomes, teardown, background helpers and long-run invariants.

use tile_match::core::{matching, EngineConfig, GameSession, SimpleRng, Task};
use tile_match::engine::{apply_place, PlaceError};
use tile_match::types::{
    DefeatReason, EngineEvent, GameMode, ItemKind, LevelTarget, Outcome, Position,
};

const A: ItemKind = ItemKind::Regular(0);
const B: ItemKind = ItemKind::Regular(1);
const C: ItemKind = ItemKind::Regular(2);

fn quiet(rows: usize, cols: usize, mode: GameMode) -> EngineConfig {
    let mut config = EngineConfig {
        rows,
        cols,
        mode,
        ..EngineConfig::default()
    };
    config.spawn.initial_fill_ratio = 0.0;
    config.spawn.obstacle_probability = 0.0;
    config.rules.starvation_check = false;
    config.rules.deadlock_check_every = 0;
    config.targets = Some([
        LevelTarget::new(A, 3),
        LevelTarget::new(B, 3),
        LevelTarget::new(C, 3),
    ]);
    config
}

fn start(config: EngineConfig) -> GameSession {
    let mut session = GameSession::new(config).unwrap();
    session.start();
    session
}

#[test]
fn meeting_all_targets_wins_classic() {
    let mut gs = start(quiet(1, 3, GameMode::Classic));
    for (col, kind) in [A, B, C].into_iter().enumerate() {
        gs.seed_cell(Position::new(0, col), [Some(kind), Some(kind), None]);
    }

    apply_place(&mut gs, A, 0, 0, None).unwrap();
    apply_place(&mut gs, B, 0, 1, None).unwrap();
    gs.tick(100);
    assert_eq!(gs.outcome(), None);

    apply_place(&mut gs, C, 0, 2, None).unwrap();
    gs.tick(100);
    assert_eq!(gs.outcome(), Some(Outcome::Victory));
    assert!(gs
        .take_events()
        .iter()
        .any(|e| matches!(e, EngineEvent::Victory { score } if *score == gs.score())));
    assert!(gs.stats_snapshot().targets_met());

    assert_eq!(apply_place(&mut gs, A, 0, 0, None), Err(PlaceError::NotPlayable));
}

#[test]
fn spending_last_move_without_targets_loses() {
    let mut config = quiet(2, 2, GameMode::Classic);
    config.max_moves = 1;
    let mut gs = start(config);

    apply_place(&mut gs, A, 0, 0, None).unwrap();
    assert_eq!(gs.moves_left(), Some(0));
    gs.tick(800);
    assert_eq!(gs.outcome(), None);

    gs.tick(200);
    assert_eq!(gs.outcome(), Some(Outcome::Defeat(DefeatReason::OutOfMoves)));
    assert!(gs.take_events().contains(&EngineEvent::Defeat {
        reason: DefeatReason::OutOfMoves
    }));
}

#[test]
fn last_move_can_still_win() {
    let mut config = quiet(1, 3, GameMode::Classic);
    config.max_moves = 1;
    let mut gs = start(config);
    gs.seed_cell(Position::new(0, 0), [Some(A), Some(A), Some(A)]);
    gs.seed_cell(Position::new(0, 1), [Some(B), Some(B), Some(B)]);
    gs.seed_cell(Position::new(0, 2), [Some(C), Some(C), None]);

    apply_place(&mut gs, C, 0, 2, None).unwrap();
    // The scanner clears the two seeded triples, the placement the third.
    gs.tick(5000);
    assert_eq!(gs.outcome(), Some(Outcome::Victory));
}

#[test]
fn time_attack_runs_out() {
    let mut config = quiet(2, 2, GameMode::TimeAttack);
    config.time_limit_ms = 5_000;
    let mut gs = start(config);

    gs.tick(4_999);
    assert_eq!(gs.outcome(), None);
    gs.tick(1);
    assert_eq!(gs.outcome(), Some(Outcome::Defeat(DefeatReason::TimeUp)));
    assert_eq!(gs.moves_left(), None);
}

#[test]
fn endless_modes_never_finish() {
    for mode in [GameMode::Endless, GameMode::Zen, GameMode::Cascade] {
        let mut config = quiet(1, 3, mode);
        config.max_moves = 1;
        let mut gs = start(config);
        for (col, kind) in [A, B, C].into_iter().enumerate() {
            gs.seed_cell(Position::new(0, col), [Some(kind), Some(kind), Some(kind)]);
        }
        apply_place(&mut gs, A, 0, 0, None).ok();
        gs.tick(60_000);

        assert_eq!(gs.outcome(), None, "{mode:?}");
        assert!(gs.stats_snapshot().targets_met());
        assert!(gs.is_playable());
    }
}

#[test]
fn teardown_stops_everything() {
    let mut gs = start(quiet(1, 1, GameMode::Classic));
    gs.seed_cell(Position::new(0, 0), [Some(A), Some(A), None]);
    apply_place(&mut gs, A, 0, 0, None).unwrap();
    gs.teardown();

    gs.tick(60_000);
    assert_eq!(gs.pending_tasks(), 0);
    assert_eq!(gs.eliminated_counts().total(), 0);
    assert!(gs.board().get(Position::new(0, 0)).unwrap().is_full());
    assert_eq!(apply_place(&mut gs, A, 0, 0, None), Err(PlaceError::NotPlayable));
}

#[test]
fn sessions_are_independent() {
    let mut one = start(quiet(1, 1, GameMode::Classic));
    let mut two = start(quiet(1, 1, GameMode::Classic));
    one.seed_cell(Position::new(0, 0), [Some(A), Some(A), None]);
    two.seed_cell(Position::new(0, 0), [Some(A), Some(A), None]);

    apply_place(&mut one, A, 0, 0, None).unwrap();
    one.tick(100);

    assert_eq!(one.eliminated_counts().get(A), 3);
    assert_eq!(two.eliminated_counts().get(A), 0);
    assert_eq!(two.combo(), 0);
}

#[test]
fn starving_board_gets_a_helper_drop() {
    let mut config = quiet(3, 3, GameMode::Endless);
    config.rules.starvation_check = true;
    let mut gs = start(config);
    gs.seed_cell(Position::new(0, 0), [Some(A), Some(B), None]);

    gs.tick(5_000);
    let drops: Vec<(ItemKind, usize)> = gs
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::HelperDrop { kind, positions } => Some((kind, positions.len())),
            _ => None,
        })
        .collect();
    assert_eq!(drops.len(), 1);
    let (kind, placed) = drops[0];
    assert_eq!(placed, 3);
    assert!([A, B, C].contains(&kind));
    assert!(gs.board().kind_counts().get(&kind).copied().unwrap_or(0) >= 3);
}

#[test]
fn stats_snapshot_serializes_for_mirroring() {
    let mut gs = start(quiet(1, 1, GameMode::Classic));
    gs.seed_cell(Position::new(0, 0), [Some(B), Some(B), Some(B)]);
    gs.eliminate(Position::new(0, 0)).unwrap();

    let v = serde_json::to_value(gs.stats_snapshot()).unwrap();
    assert_eq!(v["eliminated_counts"]["r1"], 3);
    assert_eq!(v["level_targets"][0]["kind"], "r0");
    assert_eq!(v["level_targets"][0]["required"], 3);
}

/// Random play on a populated board: quiet-time invariants hold throughout.
#[test]
fn random_play_keeps_board_invariants() {
    for mode in [GameMode::Endless, GameMode::Cascade] {
        let config = EngineConfig {
            mode,
            seed: 77,
            ..EngineConfig::default()
        };
        let regular_kinds = config.regular_kinds;
        let mut gs = start(config);
        let obstacles_match = gs.config().rules.obstacles_self_match;
        let mut rng = SimpleRng::new(9);

        for _ in 0..400 {
            let row = rng.next_index(gs.board().rows());
            let col = rng.next_index(gs.board().cols());
            let kind = ItemKind::Regular(rng.next_range(regular_kinds as u32) as u8);
            let _ = apply_place(&mut gs, kind, row, col, None);
            gs.tick(rng.next_range(400) as u64);

            for (_, cell) in gs.board().iter() {
                assert!(cell.is_consistent());
                if cell.is_eliminating() {
                    assert!(cell.is_empty());
                }
            }
        }

        // Every matched cell still on the board has its check queued.
        gs.tick(10_000);
        for (pos, cell) in gs.board().iter() {
            if !cell.is_eliminating() && matching::detect(cell, obstacles_match).is_some() {
                assert!(
                    gs.has_pending(Task::CheckMatch(pos)) || gs.has_pending(Task::Eliminate(pos)),
                    "{pos:?} matched without a pending check"
                );
            }
        }
        assert!(gs.eliminated_counts().total() > 0);
        assert_eq!(gs.eliminated_counts().total() % 3, 0);
    }
}

#[test]
fn identical_seeds_replay_identically() {
    let run = || {
        let config = EngineConfig {
            seed: 4242,
            mode: GameMode::Endless,
            ..EngineConfig::default()
        };
        let mut gs = start(config);
        let mut rng = SimpleRng::new(1);
        let mut events = Vec::new();
        for _ in 0..100 {
            let row = rng.next_index(gs.board().rows());
            let col = rng.next_index(gs.board().cols());
            let _ = apply_place(&mut gs, ItemKind::Regular(rng.next_range(8) as u8), row, col, None);
            gs.tick(250);
            events.extend(gs.take_events());
        }
        (gs.snapshot(), events)
    };
    assert_eq!(run(), run());
}
