//! Sprint reports produced when a retrospective is finalized.

use crate::error::Result;
use crate::note::StickyNote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Columns included in a report when none are configured.
pub const DEFAULT_COLUMNS: [&str; 4] = ["c1", "c2", "c3", "c4"];

// ---------------------------------------------------------------------------
// SprintLedger
// ---------------------------------------------------------------------------

/// Durable per-team sprint counter.
pub trait SprintLedger {
    /// Increment the team's sprint counter and return the new value.
    fn increment_sprint(&self, team_id: &str) -> Result<u32>;
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub value: String,
    pub thumb_up: u32,
    pub thumb_down: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportColumn {
    pub name: String,
    pub notes: Vec<NoteSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetroReport {
    pub team_id: String,
    /// Sprint number after the increment; `None` when the counter could not
    /// be updated.
    pub sprint: Option<u32>,
    pub completed_at: DateTime<Utc>,
    pub columns: Vec<ReportColumn>,
}

impl RetroReport {
    /// Summarize `notes` (column → notes) for each of `columns`, in order.
    /// Columns with no notes are present and empty; notes under columns not
    /// listed are left out.
    pub fn build(
        team_id: &str,
        sprint: Option<u32>,
        notes: Option<&BTreeMap<String, Vec<StickyNote>>>,
        columns: &[String],
    ) -> Self {
        let columns = columns
            .iter()
            .map(|name| ReportColumn {
                name: name.clone(),
                notes: notes
                    .and_then(|by_column| by_column.get(name))
                    .map(|list| {
                        list.iter()
                            .map(|n| NoteSummary {
                                value: n.value.clone(),
                                thumb_up: n.thumb_up,
                                thumb_down: n.thumb_down,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            team_id: team_id.to_string(),
            sprint,
            completed_at: Utc::now(),
            columns,
        }
    }

    pub fn note_count(&self) -> usize {
        self.columns.iter().map(|c| c.notes.len()).sum()
    }

    /// Render the report as markdown for downstream delivery.
    pub fn to_markdown(&self) -> String {
        let sprint = self
            .sprint
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut out = format!(
            "# Retro: team {}, sprint {}\n\n_{}_\n\n",
            self.team_id,
            sprint,
            self.completed_at.format("%Y-%m-%d %H:%M UTC")
        );
        for column in &self.columns {
            out.push_str(&format!("## {}\n\n", column.name));
            if column.notes.is_empty() {
                out.push_str("_no notes_\n\n");
                continue;
            }
            for note in &column.notes {
                out.push_str(&format!(
                    "- {} (+{} / -{})\n",
                    note.value, note.thumb_up, note.thumb_down
                ));
            }
            out.push('\n');
        }
        out
    }
}

/// Default report columns as owned strings.
pub fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
}
