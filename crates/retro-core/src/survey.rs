//! Survey submissions.

use crate::error::{Result, RetroError};
use crate::ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Survey answers as posted by a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurvey {
    pub team_id: String,
    pub user_id: String,
    /// Question key → answer (score, text, ...).
    pub answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A recorded survey submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

impl NewSurvey {
    /// Validate the submission and stamp it with an id and the current date.
    pub fn into_submission(self) -> Result<SurveySubmission> {
        ids::validate_id("team id", &self.team_id)?;
        ids::validate_id("user id", &self.user_id)?;
        if self.answers.is_empty() {
            return Err(RetroError::InvalidInput(
                "survey must contain at least one answer".into(),
            ));
        }
        Ok(SurveySubmission {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: self.team_id,
            user_id: self.user_id,
            answers: self.answers,
            comment: self.comment.filter(|c| !c.trim().is_empty()),
            date: Utc::now(),
        })
    }
}
