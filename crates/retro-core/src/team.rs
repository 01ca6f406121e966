use crate::error::{Result, RetroError};
use crate::ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    /// User id of the team's scrum master.
    pub scrum_id: String,
    /// Number of retros finalized so far.
    #[serde(default)]
    pub sprint: u32,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(name: impl Into<String>, scrum_id: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let scrum_id = scrum_id.into();
        if name.trim().is_empty() {
            return Err(RetroError::InvalidInput("team name must not be empty".into()));
        }
        ids::validate_id("scrum master id", &scrum_id)?;
        Ok(Self {
            id: ids::new_id(),
            name,
            scrum_id,
            sprint: 0,
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        team_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self> {
        let team_id = team_id.into();
        let name = name.into();
        let email = email.into();
        ids::validate_id("team id", &team_id)?;
        if name.trim().is_empty() {
            return Err(RetroError::InvalidInput("member name must not be empty".into()));
        }
        if !looks_like_email(&email) {
            return Err(RetroError::InvalidInput(format!("invalid email '{email}'")));
        }
        Ok(Self {
            id: ids::new_id(),
            team_id,
            name,
            email,
            created_at: Utc::now(),
        })
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
