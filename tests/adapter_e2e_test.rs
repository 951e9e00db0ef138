//! Line-protocol round trips through a running session driver.

use std::time::Duration;

use tokio_test::{assert_ok, block_on};

use tile_match::adapter::{InboundCommand, OutboundMessage, SessionDriver};
use tile_match::core::{EngineConfig, GameSession};
use tile_match::types::{ItemKind, LevelTarget, Position};

fn session(rows: usize, cols: usize) -> GameSession {
    let mut config = EngineConfig {
        rows,
        cols,
        ..EngineConfig::default()
    };
    config.spawn.initial_fill_ratio = 0.0;
    config.spawn.obstacle_probability = 0.0;
    config.rules.starvation_check = false;
    config.targets = Some([
        LevelTarget::new(ItemKind::Regular(0), 3),
        LevelTarget::new(ItemKind::Regular(1), 3),
        LevelTarget::new(ItemKind::Regular(2), 3),
    ]);
    assert_ok!(GameSession::new(config))
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        lines.push(assert_ok!(msg.to_line()));
    }
    lines
}

#[tokio::test(start_paused = true)]
async fn json_lines_drive_a_level_to_victory() {
    let mut gs = session(1, 3);
    gs.start();
    for (col, n) in [0u8, 1, 2].into_iter().enumerate() {
        let kind = ItemKind::Regular(n);
        gs.seed_cell(Position::new(0, col), [Some(kind), Some(kind), None]);
    }

    let (driver, mut handle) = SessionDriver::channel(gs, 8);
    let task = tokio::spawn(driver.run());

    let requests = [
        r#"{"type":"place","seq":1,"kind":"r0","row":0,"col":0}"#,
        r#"{"type":"place","seq":2,"kind":"r1","row":0,"col":1,"slot":2}"#,
        r#"{"type":"place","seq":3,"kind":"r2","row":0,"col":2}"#,
    ];
    for line in requests {
        let cmd = assert_ok!(InboundCommand::from_line(line));
        assert_ok!(handle.cmd_tx.send(cmd).await);
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let cmd = assert_ok!(InboundCommand::from_line(r#"{"type":"stats","seq":4}"#));
    assert_ok!(handle.cmd_tx.send(cmd).await);
    assert_ok!(handle.cmd_tx.send(InboundCommand::Shutdown).await);
    let finished = assert_ok!(task.await);

    let lines = drain(&mut handle.out_rx);
    for seq in 1..=3 {
        let prefix = format!(r#"{{"type":"ack","seq":{seq},"#);
        assert!(lines.iter().any(|l| l.starts_with(&prefix)), "no ack for {seq}");
    }
    assert_eq!(
        lines.iter().filter(|l| l.contains(r#""event":"eliminated""#)).count(),
        3
    );
    assert!(lines.iter().any(|l| l.contains(r#""event":"victory""#)));
    assert!(lines
        .iter()
        .any(|l| l.starts_with(r#"{"type":"stats","seq":4"#) && l.contains(r#""r2":3"#)));
    assert!(lines
        .last()
        .is_some_and(|l| l.starts_with(r#"{"type":"closed""#)));
    assert_eq!(finished.score(), 100 + 200 + 300);
}

#[tokio::test(start_paused = true)]
async fn malformed_and_rejected_requests() {
    assert!(InboundCommand::from_line(r#"{"type":"place","seq":1}"#).is_err());
    assert!(InboundCommand::from_line(r#"{"type":"warp","seq":1}"#).is_err());

    let mut gs = session(2, 2);
    gs.start();
    let (driver, mut handle) = SessionDriver::channel(gs, 8);
    let task = tokio::spawn(driver.run());

    let requests = [
        r#"{"type":"place","seq":1,"kind":"r0","row":5,"col":0}"#,
        r#"{"type":"place","seq":2,"kind":"stone","row":0,"col":0}"#,
        r#"{"type":"move","seq":3,"item":999,"row":0,"col":0}"#,
    ];
    for line in requests {
        assert_ok!(handle.cmd_tx.send(assert_ok!(InboundCommand::from_line(line))).await);
    }
    drop(handle.cmd_tx);
    assert_ok!(task.await);

    let lines = drain(&mut handle.out_rx);
    let errors: Vec<&String> = lines
        .iter()
        .filter(|l| l.starts_with(r#"{"type":"error""#))
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(errors[0].contains(r#""code":"out_of_bounds""#));
    assert!(errors[1].contains(r#""code":"invalid_item""#));
    assert!(errors[2].contains(r#""code":"invalid_item""#));
}

#[test]
fn immediate_shutdown_closes_cleanly() {
    let (driver, mut handle) = SessionDriver::channel(session(2, 2), 1);
    let finished = block_on(async move {
        let task = tokio::spawn(driver.run());
        assert_ok!(handle.cmd_tx.send(InboundCommand::Shutdown).await);
        let finished = assert_ok!(task.await);
        let lines = drain(&mut handle.out_rx);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(r#"{"type":"closed","ts":"#));
        finished
    });
    assert!(finished.started());
    assert!(finished.torn_down());
}
