//! Protocol module - JSON message types for the session driver
//!
//! One JSON object per line. Every message carries a `type` tag; requests
//! carry a client `seq` that the matching `ack` / `error` echoes back.

use serde::{Deserialize, Serialize};

use crate::core::{BoardSnapshot, StatsSnapshot};
use crate::engine::PlaceError;
use crate::types::{EngineEvent, ItemId, ItemKind};

// ============== Collaborator -> Engine ==============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundCommand {
    /// Place a new item; `slot` is a preference, not a requirement.
    Place {
        seq: u64,
        kind: ItemKind,
        row: usize,
        col: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<u8>,
    },
    /// Drag a live item into another cell.
    Move {
        seq: u64,
        item: ItemId,
        row: usize,
        col: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<u8>,
    },
    /// A drop landed near a cell.
    DropNear { seq: u64, row: usize, col: usize },
    /// Request the multiplayer stats snapshot.
    Stats { seq: u64 },
    /// Request a full board snapshot.
    Snapshot { seq: u64 },
    /// Tear the level down and stop the driver.
    Shutdown,
}

impl InboundCommand {
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    pub fn seq(&self) -> Option<u64> {
        match self {
            InboundCommand::Place { seq, .. }
            | InboundCommand::Move { seq, .. }
            | InboundCommand::DropNear { seq, .. }
            | InboundCommand::Stats { seq }
            | InboundCommand::Snapshot { seq } => Some(*seq),
            InboundCommand::Shutdown => None,
        }
    }
}

// ============== Engine -> Collaborator ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Something happened on the board (elimination, refill, outcome ...).
    Event { ts: u64, event: EngineEvent },
    Ack {
        seq: u64,
        ts: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<ItemId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<u8>,
    },
    Error {
        seq: u64,
        ts: u64,
        code: String,
        message: String,
    },
    Stats {
        seq: u64,
        ts: u64,
        stats: StatsSnapshot,
    },
    Snapshot {
        seq: u64,
        ts: u64,
        snapshot: BoardSnapshot,
    },
    /// The session was torn down; no more messages follow.
    Closed { ts: u64, score: u64 },
}

impl OutboundMessage {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn event(&self) -> Option<&EngineEvent> {
        match self {
            OutboundMessage::Event { event, .. } => Some(event),
            _ => None,
        }
    }
}

pub fn create_ack(seq: u64, ts: u64) -> OutboundMessage {
    OutboundMessage::Ack {
        seq,
        ts,
        item: None,
        slot: None,
    }
}

pub fn create_error(seq: u64, ts: u64, err: PlaceError) -> OutboundMessage {
    OutboundMessage::Error {
        seq,
        ts,
        code: err.code().to_string(),
        message: err.message().to_string(),
    }
}
