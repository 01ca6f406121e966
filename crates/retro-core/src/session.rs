//! In-memory retrospective session state.
//!
//! A [`RetroStore`] tracks, for one server process:
//!   - connected clients (connection id → user id, joined team)
//!   - teams whose retro has been started
//!   - sticky notes per team, grouped by column
//!
//! Nothing here is persisted. Completing a team's retro drops all of that
//! team's state; a restart drops everything.

use crate::error::Result;
use crate::ids;
use crate::note::{StickyNote, VoteKind};
use crate::report::{self, RetroReport, SprintLedger};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Client {
    user_id: String,
    team_id: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    clients: HashMap<String, Client>,
    started: HashSet<String>,
    notes: HashMap<String, BTreeMap<String, Vec<StickyNote>>>,
}

/// Process-local store for live retrospectives.
///
/// Every method takes the lock once, so each operation is atomic on its own;
/// concurrent events for the same team interleave at operation granularity.
#[derive(Debug)]
pub struct RetroStore {
    state: Mutex<SessionState>,
    columns: Vec<String>,
}

impl Default for RetroStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RetroStore {
    /// Store whose reports use the default columns (`c1`..`c4`).
    pub fn new() -> Self {
        Self::with_columns(report::default_columns())
    }

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            columns,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Record that `connection_id` belongs to `user_id`. Re-registering a
    /// connection replaces its user and clears its team.
    pub fn register_client(&self, connection_id: &str, user_id: &str) {
        self.state().clients.insert(
            connection_id.to_string(),
            Client {
                user_id: user_id.to_string(),
                team_id: None,
            },
        );
    }

    /// Associate a registered connection with a team. Returns `false` when the
    /// connection is unknown.
    pub fn join_team(&self, connection_id: &str, team_id: &str) -> bool {
        match self.state().clients.get_mut(connection_id) {
            Some(client) => {
                client.team_id = Some(team_id.to_string());
                true
            }
            None => false,
        }
    }

    pub fn remove_client(&self, connection_id: &str) {
        self.state().clients.remove(connection_id);
    }

    pub fn is_client_registered(&self, connection_id: &str) -> bool {
        self.state().clients.contains_key(connection_id)
    }

    pub fn client_user_id(&self, connection_id: &str) -> Option<String> {
        self.state()
            .clients
            .get(connection_id)
            .map(|c| c.user_id.clone())
    }

    pub fn client_team_id(&self, connection_id: &str) -> Option<String> {
        self.state()
            .clients
            .get(connection_id)
            .and_then(|c| c.team_id.clone())
    }

    /// Number of connected clients across all teams.
    pub fn connected_clients(&self) -> usize {
        self.state().clients.len()
    }

    /// Distinct user ids currently joined to `team_id`, sorted.
    pub fn team_participants(&self, team_id: &str) -> Vec<String> {
        let state = self.state();
        let mut users: Vec<String> = state
            .clients
            .values()
            .filter(|c| c.team_id.as_deref() == Some(team_id))
            .map(|c| c.user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn start_retro(&self, team_id: &str) {
        if self.state().started.insert(team_id.to_string()) {
            tracing::info!(team_id, "retro started");
        }
    }

    pub fn is_retro_started(&self, team_id: &str) -> bool {
        self.state().started.contains(team_id)
    }

    /// Discard every note, joined connection and the started flag for
    /// `team_id`. Safe to call for a team with no state.
    pub fn complete_retro(&self, team_id: &str) {
        let mut state = self.state();
        let notes = state
            .notes
            .remove(team_id)
            .map(|by_column| by_column.values().map(Vec::len).sum::<usize>())
            .unwrap_or(0);
        state.started.remove(team_id);
        state
            .clients
            .retain(|_, c| c.team_id.as_deref() != Some(team_id));
        tracing::info!(team_id, notes, "retro completed, session state discarded");
    }

    // -----------------------------------------------------------------------
    // Sticky notes
    // -----------------------------------------------------------------------

    /// Append a new note. Identical content is not deduplicated.
    pub fn save_sticky_note(&self, user_id: &str, team_id: &str, column: &str, value: &str) {
        let note = StickyNote::new(user_id, team_id, column, value);
        self.state()
            .notes
            .entry(team_id.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default()
            .push(note);
    }

    /// Cast `vote` on the note with `value` in `column`, creating the note
    /// (authored by the voter) when it does not exist yet. Any earlier vote
    /// by the same user on that note is replaced.
    pub fn rate_sticky_note(
        &self,
        user_id: &str,
        team_id: &str,
        column: &str,
        vote: VoteKind,
        value: &str,
    ) -> StickyNote {
        let mut state = self.state();
        let column_notes = state
            .notes
            .entry(team_id.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default();

        let pos = match column_notes.iter().position(|n| n.value == value) {
            Some(pos) => pos,
            None => {
                column_notes.push(StickyNote::new(user_id, team_id, column, value));
                column_notes.len() - 1
            }
        };

        let note = &mut column_notes[pos];
        note.cast_vote(user_id, vote);
        note.clone()
    }

    /// The note in `column` with this author and value, if any.
    pub fn sticky_note(
        &self,
        user_id: &str,
        team_id: &str,
        column: &str,
        value: &str,
    ) -> Option<StickyNote> {
        self.state()
            .notes
            .get(team_id)?
            .get(column)?
            .iter()
            .find(|n| n.user_id == user_id && n.value == value)
            .cloned()
    }

    /// Every note for the team, column by column.
    pub fn all_sticky_notes(&self, team_id: &str) -> Vec<StickyNote> {
        self.state()
            .notes
            .get(team_id)
            .map(|by_column| by_column.values().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// In each column, remove the first note by `user_id` whose value is
    /// `content`. Returns how many notes were removed.
    ///
    /// Fails without touching any state when `team_id` is malformed.
    pub fn delete_sticky_note_by_content(
        &self,
        user_id: &str,
        team_id: &str,
        content: &str,
    ) -> Result<usize> {
        ids::validate_id("team id", team_id)?;

        let mut state = self.state();
        let Some(by_column) = state.notes.get_mut(team_id) else {
            return Ok(0);
        };

        let mut removed = 0;
        for notes in by_column.values_mut() {
            if let Some(pos) = notes
                .iter()
                .position(|n| n.value == content && n.user_id == user_id)
            {
                notes.remove(pos);
                removed += 1;
            }
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------------

    /// Bump the team's sprint counter and summarize the accumulated notes.
    ///
    /// A ledger failure is logged and the report carries no sprint number.
    /// Session state is left in place; call [`RetroStore::complete_retro`] to
    /// discard it.
    pub fn complete_retro_and_send_sticky_notes(
        &self,
        team_id: &str,
        ledger: &dyn SprintLedger,
    ) -> RetroReport {
        let sprint = match ledger.increment_sprint(team_id) {
            Ok(sprint) => Some(sprint),
            Err(e) => {
                tracing::warn!(team_id, error = %e, "failed to increment sprint counter");
                None
            }
        };

        let state = self.state();
        RetroReport::build(team_id, sprint, state.notes.get(team_id), &self.columns)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
