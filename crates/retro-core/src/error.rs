use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetroError {
    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid {kind} '{value}': must be 24 hexadecimal characters")]
    InvalidId { kind: &'static str, value: String },

    #[error("invalid vote '{0}': expected thumb_up or thumb_down")]
    InvalidVote(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("member already exists: {0}")]
    MemberExists(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("database error: {0}")]
    Db(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RetroError>;
