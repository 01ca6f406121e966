use axum::extract::{Path, State};
use axum::Json;
use retro_core::report::RetroReport;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/sprint-reports/:team_id: stored retro reports, by sprint.
pub async fn list_reports(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<RetroReport>>, AppError> {
    let db = app.db.clone();
    let reports = blocking(move || {
        db.get_team(&team_id)?;
        db.list_reports(&team_id)
    })
    .await?;
    Ok(Json(reports))
}
