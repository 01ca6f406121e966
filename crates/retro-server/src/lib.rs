pub mod auth;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Access tokens reach everything. Member invitation tokens reach the
    // retro socket, survey submission and the read routes of their own team.
    Router::new()
        .route("/api/health", get(routes::health::health))
        // Events (SSE)
        .route(
            "/api/events",
            get(routes::events::sse_events).route_layer(middleware::from_fn(auth::require_admin)),
        )
        // Teams
        .route(
            "/api/teams",
            get(routes::teams::list_teams)
                .post(routes::teams::create_team)
                .route_layer(middleware::from_fn(auth::require_admin)),
        )
        .route(
            "/api/teams/{team_id}",
            get(routes::teams::get_team)
                .route_layer(middleware::from_fn(auth::require_team_scope)),
        )
        .route(
            "/api/teams/{team_id}/members",
            post(routes::teams::add_member)
                .route_layer(middleware::from_fn(auth::require_admin))
                .get(routes::teams::list_members)
                .route_layer(middleware::from_fn(auth::require_team_scope)),
        )
        // Retro
        .route("/api/retro/ws", get(routes::ws::retro_ws))
        .route(
            "/api/retro/{team_id}",
            get(routes::retro::get_retro)
                .route_layer(middleware::from_fn(auth::require_team_scope)),
        )
        .route(
            "/api/retro/{team_id}/start",
            post(routes::retro::start_retro).route_layer(middleware::from_fn(auth::require_admin)),
        )
        .route(
            "/api/retro/{team_id}/invitations",
            post(routes::retro::retro_invitations)
                .route_layer(middleware::from_fn(auth::require_admin)),
        )
        .route(
            "/api/retro/{team_id}/complete",
            post(routes::retro::complete_retro)
                .route_layer(middleware::from_fn(auth::require_admin)),
        )
        // Sprint reports
        .route(
            "/api/sprint-reports/{team_id}",
            get(routes::reports::list_reports)
                .route_layer(middleware::from_fn(auth::require_team_scope)),
        )
        // Surveys
        .route("/api/surveys", post(routes::surveys::submit_survey))
        .route(
            "/api/surveys/{team_id}",
            get(routes::surveys::list_surveys).route_layer(middleware::from_fn(auth::require_admin)),
        )
        .route(
            "/api/surveys/{team_id}/invitations",
            post(routes::surveys::survey_invitations)
                .route_layer(middleware::from_fn(auth::require_admin)),
        )
        .layer(middleware::from_fn_with_state(
            app.signer.clone(),
            auth::auth_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Serve on a pre-bound listener.
///
/// The caller binds so it can read the actual port before starting (useful
/// when `port = 0` and the OS picks a free port).
pub async fn serve_on(app: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let router = build_router(app);

    tracing::info!("retro server listening on http://localhost:{actual_port}");

    axum::serve(listener, router).await?;
    Ok(())
}
