use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use retro_core::error::RetroError;

// ---------------------------------------------------------------------------
// Internal sentinels for explicit status codes
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 404 through the `anyhow::Error` chain.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// Carries an explicit HTTP 403 through the `anyhow::Error` chain.
#[derive(Debug)]
struct ForbiddenError(String);

impl std::fmt::Display for ForbiddenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ForbiddenError {}

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses and WebSocket error frames.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(RetroError::InvalidInput(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    /// Construct a 403 Forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(ForbiddenError(msg.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<NotFoundError>().is_some() {
            return StatusCode::NOT_FOUND;
        }
        if self.0.downcast_ref::<ForbiddenError>().is_some() {
            return StatusCode::FORBIDDEN;
        }

        match self.0.downcast_ref::<RetroError>() {
            Some(e) => match e {
                RetroError::InvalidId { .. }
                | RetroError::InvalidVote(_)
                | RetroError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RetroError::TeamNotFound(_) | RetroError::MemberNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                RetroError::MemberExists(_) => StatusCode::CONFLICT,
                RetroError::InvalidToken(_) | RetroError::TokenExpired => {
                    StatusCode::UNAUTHORIZED
                }
                RetroError::ConfigNotFound(_)
                | RetroError::Db(_)
                | RetroError::Io(_)
                | RetroError::Yaml(_)
                | RetroError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: RetroError) -> StatusCode {
        AppError(err.into()).into_response().status()
    }

    #[test]
    fn invalid_id_maps_to_400() {
        assert_eq!(
            status_of(RetroError::InvalidId {
                kind: "team id",
                value: "x".into()
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_vote_maps_to_400() {
        assert_eq!(
            status_of(RetroError::InvalidVote("meh".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn team_not_found_maps_to_404() {
        assert_eq!(
            status_of(RetroError::TeamNotFound("t".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn member_exists_maps_to_409() {
        assert_eq!(
            status_of(RetroError::MemberExists("a@b.co".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn token_errors_map_to_401() {
        assert_eq!(status_of(RetroError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(RetroError::InvalidToken("bad".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn db_error_maps_to_500() {
        assert_eq!(
            status_of(RetroError::Db("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_retro_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sentinel_constructors() {
        assert_eq!(
            AppError::not_found("gone").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::forbidden("no").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::bad_request("bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError(RetroError::TeamNotFound("t".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
