use axum::extract::{Path, State};
use axum::Json;
use retro_core::team::{Member, Team};

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct CreateTeamBody {
    pub name: String,
    pub scrum_id: String,
}

/// POST /api/teams: create a team.
pub async fn create_team(
    State(app): State<AppState>,
    Json(body): Json<CreateTeamBody>,
) -> Result<Json<Team>, AppError> {
    let db = app.db.clone();
    let team = blocking(move || {
        let team = Team::new(body.name, body.scrum_id)?;
        db.insert_team(&team)?;
        Ok(team)
    })
    .await?;
    tracing::info!(team_id = %team.id, name = %team.name, "team created");
    Ok(Json(team))
}

/// GET /api/teams: list all teams.
pub async fn list_teams(State(app): State<AppState>) -> Result<Json<Vec<Team>>, AppError> {
    let db = app.db.clone();
    let teams = blocking(move || db.list_teams()).await?;
    Ok(Json(teams))
}

/// GET /api/teams/:team_id: team record plus headcount.
pub async fn get_team(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = app.db.clone();
    let (team, size) = blocking(move || {
        let team = db.get_team(&team_id)?;
        let size = db.team_size(&team_id)?;
        Ok((team, size))
    })
    .await?;
    Ok(Json(serde_json::json!({
        "id": team.id,
        "name": team.name,
        "scrum_id": team.scrum_id,
        "sprint": team.sprint,
        "size": size,
        "created_at": team.created_at,
    })))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct AddMemberBody {
    pub name: String,
    pub email: String,
}

/// GET /api/teams/:team_id/members
pub async fn list_members(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Member>>, AppError> {
    let db = app.db.clone();
    let members = blocking(move || {
        db.get_team(&team_id)?;
        db.list_members(&team_id)
    })
    .await?;
    Ok(Json(members))
}

/// POST /api/teams/:team_id/members: add a member.
pub async fn add_member(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
    Json(body): Json<AddMemberBody>,
) -> Result<Json<Member>, AppError> {
    let db = app.db.clone();
    let member = blocking(move || {
        let member = Member::new(team_id, body.name, body.email)?;
        db.add_member(&member)?;
        Ok(member)
    })
    .await?;
    tracing::info!(team_id = %member.team_id, member_id = %member.id, "member added");
    Ok(Json(member))
}
