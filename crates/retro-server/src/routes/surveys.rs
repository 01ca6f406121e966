use axum::extract::{Path, State};
use axum::{Extension, Json};
use retro_core::invitation::{Invitation, InvitationKind};
use retro_core::survey::{NewSurvey, SurveySubmission};
use retro_core::token::Claims;

use super::blocking;
use super::retro::team_invitations;
use crate::error::AppError;
use crate::state::AppState;

/// POST /api/surveys/:team_id/invitations: one survey link per member.
pub async fn survey_invitations(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<Invitation>>, AppError> {
    let invites = team_invitations(&app, team_id, InvitationKind::Survey).await?;
    Ok(Json(invites))
}

/// POST /api/surveys: record a submission for an existing team.
///
/// Member tokens may only submit for their own user and team; access tokens
/// may submit for anyone.
pub async fn submit_survey(
    State(app): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<NewSurvey>,
) -> Result<Json<SurveySubmission>, AppError> {
    if !claims.is_admin() {
        if claims.sub != body.user_id {
            return Err(AppError::forbidden("token does not belong to this user"));
        }
        if !claims.can_access_team(&body.team_id) {
            return Err(AppError::forbidden("token does not belong to this team"));
        }
    }

    let db = app.db.clone();
    let submission = blocking(move || {
        let submission = body.into_submission()?;
        db.insert_survey(&submission)?;
        Ok(submission)
    })
    .await?;
    tracing::info!(
        team_id = %submission.team_id,
        survey_id = %submission.id,
        answers = submission.answers.len(),
        "survey recorded"
    );

    if let Some(url) = app.config.survey.forward_url.as_deref() {
        forward(&app.http, url, &submission).await;
    }
    Ok(Json(submission))
}

/// GET /api/surveys/:team_id: submissions for a team, oldest first.
pub async fn list_surveys(
    State(app): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<SurveySubmission>>, AppError> {
    let db = app.db.clone();
    let surveys = blocking(move || {
        db.get_team(&team_id)?;
        db.list_surveys(&team_id)
    })
    .await?;
    Ok(Json(surveys))
}

/// POST the submission to the downstream collector. The submission is
/// already stored, so failures are only logged.
async fn forward(http: &reqwest::Client, url: &str, submission: &SurveySubmission) {
    match http.post(url).json(submission).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(survey_id = %submission.id, "survey forwarded");
        }
        Ok(resp) => {
            tracing::warn!(survey_id = %submission.id, status = %resp.status(), "survey forward rejected");
        }
        Err(e) => {
            tracing::warn!(survey_id = %submission.id, error = %e, "survey forward failed");
        }
    }
}
