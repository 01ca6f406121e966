use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use retro_core::note::VoteKind;
use retro_core::token::Claims;
use tokio::sync::broadcast::error::RecvError;

use super::retro::finalize;
use crate::error::AppError;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::state::AppState;

/// Per-connection bookkeeping. `team_id` is set once the client joins.
#[derive(Debug)]
pub(crate) struct Session {
    connection_id: String,
    claims: Claims,
    team_id: Option<String>,
}

impl Session {
    pub(crate) fn new(claims: Claims) -> Self {
        Self {
            connection_id: uuid::Uuid::new_v4().to_string(),
            claims,
            team_id: None,
        }
    }

    /// Team and user of a joined connection. The store is authoritative:
    /// completing a retro drops its clients, which ends the membership here
    /// too even if the `retro_completed` frame never reached this socket.
    fn joined(&mut self, app: &AppState) -> Result<(String, String), AppError> {
        self.team_id = app.store.client_team_id(&self.connection_id);
        let team_id = self
            .team_id
            .clone()
            .ok_or_else(|| AppError::bad_request("join first"))?;
        Ok((team_id, self.claims.sub.clone()))
    }
}

/// GET /api/retro/ws: upgrade to the retro board channel.
pub async fn retro_ws(
    ws: WebSocketUpgrade,
    State(app): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, app, claims))
}

async fn run_socket(mut socket: WebSocket, app: AppState, claims: Claims) {
    let mut session = Session::new(claims);
    let mut rx = app.event_tx.subscribe();
    tracing::debug!(connection_id = %session.connection_id, sub = %session.claims.sub, "ws connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws receive failed");
                        break;
                    }
                };
                if let Some(reply) = dispatch(&app, &mut session, text.as_str()).await {
                    if send(&mut socket, &reply).await.is_err() {
                        break;
                    }
                }
            }
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "ws subscriber lagged, events dropped");
                        session.team_id = app.store.client_team_id(&session.connection_id);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if session.team_id.as_deref() != Some(event.team_id.as_str()) {
                    continue;
                }
                if send(&mut socket, &event.event).await.is_err() {
                    break;
                }
                if matches!(event.event, ServerEvent::RetroCompleted { .. }) {
                    session.team_id = None;
                }
            }
        }
    }

    app.store.remove_client(&session.connection_id);
    tracing::debug!(connection_id = %session.connection_id, "ws disconnected");
}

async fn send(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_else(|e| {
        serde_json::json!({ "event": "error", "message": e.to_string() }).to_string()
    });
    socket.send(Message::Text(text.into())).await
}

/// Parse one text frame and run it. Errors become an `error` frame for the
/// sender only.
pub(crate) async fn dispatch(
    app: &AppState,
    session: &mut Session,
    text: &str,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            return Some(ServerEvent::Error {
                message: format!("invalid frame: {e}"),
            })
        }
    };
    match handle_event(app, session, event).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::debug!(connection_id = %session.connection_id, error = %e.0, "ws event rejected");
            Some(ServerEvent::Error {
                message: e.0.to_string(),
            })
        }
    }
}

pub(crate) async fn handle_event(
    app: &AppState,
    session: &mut Session,
    event: ClientEvent,
) -> Result<Option<ServerEvent>, AppError> {
    match event {
        ClientEvent::Join { user_id, team_id } => {
            let user_id = user_id.unwrap_or_else(|| session.claims.sub.clone());
            if user_id != session.claims.sub {
                return Err(AppError::forbidden("user_id does not match token"));
            }
            // Member tokens join their own team only; access tokens may pick.
            let admin = session.claims.is_admin();
            let known = if admin {
                team_id.clone().or_else(|| session.claims.team_id.clone())
            } else {
                session.claims.team_id.clone()
            };
            let own_team = match known {
                Some(team_id) => team_id,
                None => {
                    let db = app.db.clone();
                    let member = user_id.clone();
                    super::blocking(move || db.member_team(&member)).await?
                }
            };
            if !admin && team_id.is_some_and(|asked| asked != own_team) {
                return Err(AppError::forbidden("token does not belong to this team"));
            }
            let team_id = own_team;
            let db = app.db.clone();
            let id = team_id.clone();
            super::blocking(move || db.get_team(&id)).await?;

            app.store.register_client(&session.connection_id, &user_id);
            app.store.join_team(&session.connection_id, &team_id);
            session.team_id = Some(team_id.clone());
            tracing::info!(team_id = %team_id, user_id = %user_id, "participant joined");

            app.broadcast(
                &team_id,
                ServerEvent::Joined {
                    team_id: team_id.clone(),
                    participants: app.store.team_participants(&team_id),
                    started: app.store.is_retro_started(&team_id),
                },
            );
            Ok(None)
        }
        ClientEvent::StartRetro => {
            let (team_id, _) = session.joined(app)?;
            app.store.start_retro(&team_id);
            app.broadcast(
                &team_id,
                ServerEvent::RetroStarted {
                    team_id: team_id.to_string(),
                },
            );
            Ok(None)
        }
        ClientEvent::CompleteRetro => {
            let (team_id, _) = session.joined(app)?;
            finalize(app, &team_id).await?;
            Ok(None)
        }
        ClientEvent::ListNotes => {
            let (team_id, _) = session.joined(app)?;
            let notes = app.store.all_sticky_notes(&team_id);
            Ok(Some(ServerEvent::Notes { team_id, notes }))
        }
        ClientEvent::SaveNote { column, value } => {
            let (team_id, user_id) = session.joined(app)?;
            check_column(app, &column)?;
            if value.trim().is_empty() {
                return Err(AppError::bad_request("note must not be empty"));
            }
            app.store.save_sticky_note(&user_id, &team_id, &column, &value);
            app.broadcast_notes(&team_id);
            Ok(None)
        }
        ClientEvent::RateNote {
            column,
            vote,
            value,
        } => {
            let (team_id, user_id) = session.joined(app)?;
            check_column(app, &column)?;
            let vote: VoteKind = vote.parse()?;
            app.store
                .rate_sticky_note(&user_id, &team_id, &column, vote, &value);
            app.broadcast_notes(&team_id);
            Ok(None)
        }
        ClientEvent::DeleteNote { content } => {
            let (team_id, user_id) = session.joined(app)?;
            let removed = app
                .store
                .delete_sticky_note_by_content(&user_id, &team_id, &content)?;
            if removed > 0 {
                app.broadcast_notes(&team_id);
            }
            Ok(None)
        }
    }
}

fn check_column(app: &AppState, column: &str) -> Result<(), AppError> {
    if app.store.columns().iter().any(|c| c == column) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("unknown column '{column}'")))
    }
}
