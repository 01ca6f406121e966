use axum::http::StatusCode;
use http_body_util::BodyExt;
use retro_core::config::Config;
use retro_core::db::RetroDb;
use retro_core::ids;
use retro_core::token::{TokenPurpose, TokenSigner};
use retro_server::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SECRET: &str = "integration-secret";

/// Build a router over a fresh database inside the given temp directory.
fn app(dir: &TempDir) -> axum::Router {
    let mut config = Config::default();
    config.auth.secret = SECRET.into();
    let db = RetroDb::open(&dir.path().join("retro.db")).unwrap();
    retro_server::build_router(AppState::new(config, db).unwrap())
}

fn token(sub: &str, team_id: Option<&str>, purpose: TokenPurpose) -> String {
    TokenSigner::new(SECRET, 1)
        .unwrap()
        .issue(sub, team_id, purpose)
        .unwrap()
}

fn admin() -> String {
    token("admin", None, TokenPurpose::Access)
}

async fn send(app: axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send an authenticated GET via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

/// Send an authenticated POST with a JSON body and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, req).await
}

async fn create_team(app: &axum::Router) -> serde_json::Value {
    let (status, team) = post_json(
        app.clone(),
        "/api/teams",
        &admin(),
        serde_json::json!({ "name": "Platform", "scrum_id": ids::new_id() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    team
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_needs_no_token() {
    let dir = TempDir::new().unwrap();
    let req = axum::http::Request::builder()
        .uri("/api/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(app(&dir), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connected_clients"], 0);
}

#[tokio::test]
async fn api_without_token_is_401() {
    let dir = TempDir::new().unwrap();
    let req = axum::http::Request::builder()
        .uri("/api/teams")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(app(&dir), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("unauthorized"));
}

#[tokio::test]
async fn expired_token_is_401() {
    let dir = TempDir::new().unwrap();
    let signer = TokenSigner::new(SECRET, 1).unwrap();
    let expired = signer
        .sign(&retro_core::token::Claims {
            sub: "admin".into(),
            team_id: None,
            purpose: TokenPurpose::Access,
            exp: 1,
        })
        .unwrap();
    let (status, _) = get(app(&dir), "/api/teams", &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn member_token_is_confined_to_its_team() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let own = create_team(&app).await;
    let other = create_team(&app).await;
    let own_id = own["id"].as_str().unwrap();
    let other_id = other["id"].as_str().unwrap();
    let member = token(&ids::new_id(), Some(own_id), TokenPurpose::Retro);

    let (status, _) = get(app.clone(), &format!("/api/retro/{own_id}"), &member).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(app.clone(), &format!("/api/teams/{own_id}"), &member).await;
    assert_eq!(status, StatusCode::OK);

    for uri in [
        format!("/api/retro/{other_id}"),
        format!("/api/teams/{other_id}/members"),
        format!("/api/sprint-reports/{other_id}"),
    ] {
        let (status, _) = get(app.clone(), &uri, &member).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (status, body) = post_json(
        app.clone(),
        &format!("/api/retro/{other_id}/complete"),
        &member,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
    let (_, fetched) = get(app, &format!("/api/teams/{other_id}"), &admin()).await;
    assert_eq!(fetched["sprint"], 0);
}

#[tokio::test]
async fn member_token_cannot_use_admin_routes() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let id = team["id"].as_str().unwrap();
    let member = token(&ids::new_id(), Some(id), TokenPurpose::Survey);

    let (status, _) = post_json(
        app.clone(),
        "/api/teams",
        &member,
        serde_json::json!({ "name": "Rogue", "scrum_id": ids::new_id() }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/retro/{id}/complete"),
        &member,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/teams/{id}/members"),
        &member,
        serde_json::json!({ "name": "Eve", "email": "eve@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for uri in ["/api/teams".to_string(), format!("/api/surveys/{id}"), "/api/events".to_string()] {
        let (status, _) = get(app.clone(), &uri, &member).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (_, teams) = get(app, "/api/teams", &admin()).await;
    assert_eq!(teams.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Teams and members
// ---------------------------------------------------------------------------

#[tokio::test]
async fn team_lifecycle() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let id = team["id"].as_str().unwrap();

    let (status, member) = post_json(
        app.clone(),
        &format!("/api/teams/{id}/members"),
        &admin(),
        serde_json::json!({ "name": "Ana", "email": "ana@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["team_id"], id);

    let (status, fetched) = get(app.clone(), &format!("/api/teams/{id}"), &admin()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["size"], 2);

    let (_, teams) = get(app, "/api/teams", &admin()).await;
    assert_eq!(teams.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_team_id_is_400() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(&dir), "/api/teams/not-an-id", &admin()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("team id"));
}

// ---------------------------------------------------------------------------
// Retro
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retro_start_complete_and_report() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let id = team["id"].as_str().unwrap();

    let (status, started) =
        post_json(app.clone(), &format!("/api/retro/{id}/start"), &admin(), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(started["url"].as_str().unwrap().contains("token="));

    let (_, live) = get(app.clone(), &format!("/api/retro/{id}"), &admin()).await;
    assert_eq!(live["started"], true);
    assert_eq!(live["notes"], serde_json::json!([]));

    let (status, report) = post_json(
        app.clone(),
        &format!("/api/retro/{id}/complete"),
        &admin(),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["sprint"], 1);
    assert_eq!(report["columns"].as_array().unwrap().len(), 4);

    let (_, live) = get(app.clone(), &format!("/api/retro/{id}"), &admin()).await;
    assert_eq!(live["started"], false);

    let (status, reports) = get(app, &format!("/api/sprint-reports/{id}"), &admin()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn retro_invitations_carry_member_tokens() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let id = team["id"].as_str().unwrap();
    post_json(
        app.clone(),
        &format!("/api/teams/{id}/members"),
        &admin(),
        serde_json::json!({ "name": "Bo", "email": "bo@example.com" }),
    )
    .await;

    let (status, invites) = post_json(
        app,
        &format!("/api/retro/{id}/invitations"),
        &admin(),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let invites = invites.as_array().unwrap();
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0]["kind"], "retro");
    assert!(invites[0]["link"].as_str().unwrap().contains(&format!("team_id={id}")));
}

// ---------------------------------------------------------------------------
// Surveys
// ---------------------------------------------------------------------------

#[tokio::test]
async fn member_submits_survey_with_invitation_token() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let id = team["id"].as_str().unwrap();
    let user = ids::new_id();
    let member_token = token(&user, Some(id), TokenPurpose::Survey);

    let (status, stored) = post_json(
        app.clone(),
        "/api/surveys",
        &member_token,
        serde_json::json!({
            "team_id": id,
            "user_id": user,
            "answers": { "happiness": 5, "workload": "ok" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{stored}");

    let (status, listed) = get(app, &format!("/api/surveys/{id}"), &admin()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["answers"]["happiness"], 5);
}

#[tokio::test]
async fn empty_survey_is_400() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let team = create_team(&app).await;
    let (status, _) = post_json(
        app,
        "/api/surveys",
        &admin(),
        serde_json::json!({
            "team_id": team["id"],
            "user_id": ids::new_id(),
            "answers": {},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
