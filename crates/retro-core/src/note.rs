use crate::error::RetroError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// VoteKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    ThumbUp,
    ThumbDown,
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteKind::ThumbUp => "thumb_up",
            VoteKind::ThumbDown => "thumb_down",
        };
        f.write_str(s)
    }
}

impl FromStr for VoteKind {
    type Err = RetroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumb_up" => Ok(VoteKind::ThumbUp),
            "thumb_down" => Ok(VoteKind::ThumbDown),
            other => Err(RetroError::InvalidVote(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Vote / StickyNote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: String,
    pub value: VoteKind,
}

/// A single retrospective comment posted under a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyNote {
    pub user_id: String,
    pub team_id: String,
    pub column: String,
    pub value: String,
    pub thumb_up: u32,
    pub thumb_down: u32,
    pub votes: Vec<Vote>,
}

impl StickyNote {
    pub fn new(
        user_id: impl Into<String>,
        team_id: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            team_id: team_id.into(),
            column: column.into(),
            value: value.into(),
            thumb_up: 0,
            thumb_down: 0,
            votes: Vec::new(),
        }
    }

    /// Record `kind` as `user_id`'s vote, replacing any earlier vote by the
    /// same user. Counters never go below zero.
    pub fn cast_vote(&mut self, user_id: &str, kind: VoteKind) {
        if let Some(pos) = self.votes.iter().position(|v| v.user_id == user_id) {
            let stale = self.votes.remove(pos);
            match stale.value {
                VoteKind::ThumbUp => self.thumb_up = self.thumb_up.saturating_sub(1),
                VoteKind::ThumbDown => self.thumb_down = self.thumb_down.saturating_sub(1),
            }
        }

        self.votes.push(Vote {
            user_id: user_id.to_string(),
            value: kind,
        });
        match kind {
            VoteKind::ThumbUp => self.thumb_up += 1,
            VoteKind::ThumbDown => self.thumb_down += 1,
        }
    }
}
