use std::path::Path;
use std::sync::Arc;

use retro_core::config::Config;
use retro_core::db::RetroDb;
use retro_core::session::RetroStore;
use retro_core::token::TokenSigner;
use tokio::sync::broadcast;

use crate::protocol::{RetroEvent, ServerEvent};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<RetroStore>,
    pub db: Arc<RetroDb>,
    pub signer: Arc<TokenSigner>,
    pub event_tx: broadcast::Sender<RetroEvent>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, db: RetroDb) -> retro_core::Result<Self> {
        let signer = config.signer()?;
        let store = RetroStore::with_columns(config.retro.columns.clone());
        let (event_tx, _) = broadcast::channel(256);
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            db: Arc::new(db),
            signer: Arc::new(signer),
            event_tx,
            http: reqwest::Client::new(),
        })
    }

    /// Open the configured database and build the state.
    pub fn open(config: Config, config_path: &Path) -> retro_core::Result<Self> {
        let db_path = config.database_path(config_path);
        tracing::info!(path = %db_path.display(), "opening database");
        let db = RetroDb::open(&db_path)?;
        Self::new(config, db)
    }

    /// Send `event` to every connection joined to `team_id`. Having no
    /// listeners is not an error.
    pub fn broadcast(&self, team_id: &str, event: ServerEvent) {
        let _ = self.event_tx.send(RetroEvent {
            team_id: team_id.to_string(),
            event,
        });
    }

    /// Broadcast the team's current notes.
    pub fn broadcast_notes(&self, team_id: &str) {
        let notes = self.store.all_sticky_notes(team_id);
        self.broadcast(
            team_id,
            ServerEvent::Notes {
                team_id: team_id.to_string(),
                notes,
            },
        );
    }
}
