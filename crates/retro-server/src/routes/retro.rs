use axum::extract::{Path, State};
use axum::Json;
use retro_core::ids;
use retro_core::invitation::{self, Invitation, InvitationKind};
use retro_core::report::RetroReport;
use retro_core::token::TokenPurpose;

use super::blocking;
use crate::error::AppError;
use crate::protocol::ServerEvent;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Start / status
// ---------------------------------------------------------------------------

/// POST /api/retro/:team_id/start: mark the retro started and return the
/// board link for the scrum master.
pub async fn start_retro(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let id = team_id.clone();
    let team = blocking(move || db.get_team(&id)).await?;

    app.store.start_retro(&team_id);
    let token = app
        .signer
        .issue(&team.scrum_id, Some(&team_id), TokenPurpose::Retro)?;
    let url = invitation::retro_link(&app.config.retro.public_url, &token, &team_id, &team.scrum_id);

    app.broadcast(
        &team_id,
        ServerEvent::RetroStarted {
            team_id: team_id.clone(),
        },
    );
    Ok(Json(serde_json::json!({ "team_id": team_id, "url": url })))
}

/// GET /api/retro/:team_id: live state of the team's retro.
pub async fn get_retro(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    ids::validate_id("team id", &team_id)?;
    Ok(Json(serde_json::json!({
        "team_id": team_id,
        "started": app.store.is_retro_started(&team_id),
        "participants": app.store.team_participants(&team_id),
        "notes": app.store.all_sticky_notes(&team_id),
    })))
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// POST /api/retro/:team_id/invitations: one retro link per member.
pub async fn retro_invitations(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, AppError> {
    let invites = team_invitations(&app, team_id, InvitationKind::Retro).await?;
    Ok(Json(invites))
}

/// Build invitations of `kind` for every member of the team.
pub(crate) async fn team_invitations(
    app: &AppState,
    team_id: String,
    kind: InvitationKind,
) -> Result<Vec<Invitation>, AppError> {
    let db = app.db.clone();
    let signer = app.signer.clone();
    let public_url = app.config.retro.public_url.clone();
    let invites = blocking(move || {
        db.get_team(&team_id)?;
        let members = db.list_members(&team_id)?;
        invitation::build_invitations(&members, &team_id, kind, &public_url, &signer)
    })
    .await?;

    for invite in &invites {
        tracing::info!(%kind, member_id = %invite.member_id, email = %invite.email, "invitation prepared");
    }
    Ok(invites)
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// POST /api/retro/:team_id/complete: finalize the retro and return its report.
pub async fn complete_retro(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<RetroReport>, AppError> {
    ids::validate_id("team id", &team_id)?;
    let report = finalize(&app, &team_id).await?;
    Ok(Json(report))
}

/// Bump the sprint, store the report, discard the session and tell the team.
///
/// Sprint and report persistence failures are logged, not returned; the
/// session is discarded either way.
pub(crate) async fn finalize(app: &AppState, team_id: &str) -> Result<RetroReport, AppError> {
    let store = app.store.clone();
    let db = app.db.clone();
    let id = team_id.to_string();
    let report = tokio::task::spawn_blocking(move || {
        let report = store.complete_retro_and_send_sticky_notes(&id, db.as_ref());
        if report.sprint.is_some() {
            if let Err(e) = db.save_report(&report) {
                tracing::warn!(team_id = %id, error = %e, "failed to store sprint report");
            }
        }
        report
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    app.store.complete_retro(team_id);
    tracing::info!(
        team_id,
        sprint = ?report.sprint,
        notes = report.note_count(),
        "retro finalized"
    );
    tracing::debug!("{}", report.to_markdown());

    app.broadcast(
        team_id,
        ServerEvent::RetroCompleted {
            report: report.clone(),
        },
    );
    Ok(report)
}
