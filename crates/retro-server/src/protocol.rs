//! JSON frames exchanged over the retro WebSocket.
//!
//! Both directions are tagged by an `event` field, e.g.
//! `{"event":"save_note","column":"c1","value":"more pairing"}`.

use retro_core::note::StickyNote;
use retro_core::report::RetroReport;
use serde::{Deserialize, Serialize};

/// Frames sent by a participant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Register this connection. `user_id` defaults to the token subject;
    /// `team_id` defaults to the token's team, then the member record.
    Join {
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        team_id: Option<String>,
    },
    StartRetro,
    CompleteRetro,
    ListNotes,
    SaveNote {
        column: String,
        value: String,
    },
    RateNote {
        column: String,
        vote: String,
        value: String,
    },
    DeleteNote {
        content: String,
    },
}

/// Frames sent by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    Joined {
        team_id: String,
        participants: Vec<String>,
        started: bool,
    },
    Notes {
        team_id: String,
        notes: Vec<StickyNote>,
    },
    RetroStarted {
        team_id: String,
    },
    RetroCompleted {
        report: RetroReport,
    },
    Error {
        message: String,
    },
}

/// A server frame addressed to every connection joined to `team_id`.
#[derive(Debug, Clone, Serialize)]
pub struct RetroEvent {
    pub team_id: String,
    pub event: ServerEvent,
}
