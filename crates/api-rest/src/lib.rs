//! # API REST
//!
//! REST API implementation for the triage service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, server-sent events)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use futures::Stream;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{pb, HealthService};
use triage_core::{wire, TriageError, TriageForm, TriageService};

/// Application state for the REST API server
///
/// Shared by all request handlers; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub service: TriageService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        sign_in,
        score,
        submit_assessment,
        list_assessments,
        stream_assessments,
    ),
    components(schemas(
        pb::HealthRes,
        pb::SignInReq,
        pb::SignInRes,
        pb::Vitals,
        pb::ScoreReq,
        pb::TriageResult,
        pb::SubmitReq,
        pb::SubmitRes,
        pb::Assessment,
        pb::HistoryRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(sign_in))
        .route("/triage/score", post(score))
        .route(
            "/users/:user_id/assessments",
            get(list_assessments).post(submit_assessment),
        )
        .route("/users/:user_id/assessments/stream", get(stream_assessments))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps core errors onto HTTP responses.
fn error_response(e: TriageError) -> (StatusCode, &'static str) {
    if e.is_auth() {
        return (StatusCode::UNAUTHORIZED, "Not authenticated");
    }
    match e {
        TriageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid user id"),
        TriageError::SubmissionInFlight => (StatusCode::CONFLICT, "Submission already in progress"),
        TriageError::PersistenceDisabled => {
            (StatusCode::SERVICE_UNAVAILABLE, "Persistence disabled")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// The message notes when persistence is disabled.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<pb::HealthRes> {
    Json(HealthService::check_health(
        state.service.persistence_enabled(),
    ))
}

#[utoipa::path(
    post,
    path = "/sessions",
    request_body = pb::SignInReq,
    responses(
        (status = 200, description = "Session established", body = pb::SignInRes),
        (status = 401, description = "No sign-in method succeeded")
    )
)]
/// Establish a session
///
/// Resumes `session_id` if this server issued it, otherwise signs in with `token` (or the
/// configured initial token), otherwise signs in anonymously.
#[axum::debug_handler]
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<pb::SignInReq>,
) -> Result<Json<pb::SignInRes>, (StatusCode, &'static str)> {
    match state
        .service
        .sign_in(non_empty(&req.session_id), non_empty(&req.token))
    {
        Ok(session) => Ok(Json(session.into())),
        Err(e) => {
            tracing::error!("Sign-in error: {}", e);
            Err(error_response(e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/triage/score",
    request_body = pb::ScoreReq,
    responses(
        (status = 200, description = "Triage result", body = pb::TriageResult)
    )
)]
/// Score symptoms and vital signs without storing anything
#[axum::debug_handler]
async fn score(
    State(state): State<AppState>,
    Json(req): Json<pb::ScoreReq>,
) -> Json<pb::TriageResult> {
    let form: TriageForm = req.into();
    Json(state.service.score(&form).into())
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/assessments",
    request_body = pb::SubmitReq,
    params(("user_id" = String, Path, description = "Session user id")),
    responses(
        (status = 200, description = "Assessment scored; see `persisted`", body = pb::SubmitRes),
        (status = 400, description = "Malformed user id"),
        (status = 401, description = "Unknown user"),
        (status = 409, description = "A submission for this user is already in progress")
    )
)]
/// Submit an assessment
///
/// Scores the form after the configured processing latency and stores it under the user's
/// history. A storage failure still returns the result, with `persisted: false`.
#[axum::debug_handler]
async fn submit_assessment(
    State(state): State<AppState>,
    AxumPath(user_id): AxumPath<String>,
    Json(mut req): Json<pb::SubmitReq>,
) -> Result<Json<pb::SubmitRes>, (StatusCode, &'static str)> {
    req.user_id = user_id;
    let form = TriageForm::new(req.symptoms, req.vitals.map(Into::into).unwrap_or_default());

    match state.service.submit(non_empty(&req.user_id), form).await {
        Ok(outcome) => Ok(Json(outcome.into())),
        Err(e) => {
            tracing::error!("Submit assessment error: {}", e);
            Err(error_response(e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/assessments",
    params(("user_id" = String, Path, description = "Session user id")),
    responses(
        (status = 200, description = "Assessments, newest first", body = pb::HistoryRes),
        (status = 401, description = "Unknown user"),
        (status = 503, description = "Persistence disabled")
    )
)]
/// List a user's past assessments, newest first
#[axum::debug_handler]
async fn list_assessments(
    State(state): State<AppState>,
    AxumPath(user_id): AxumPath<String>,
) -> Result<Json<pb::HistoryRes>, (StatusCode, &'static str)> {
    match state.service.history(&user_id).await {
        Ok(history) => Ok(Json(wire::history_res(history))),
        Err(e) => {
            tracing::error!("List assessments error: {}", e);
            Err(error_response(e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/assessments/stream",
    params(("user_id" = String, Path, description = "Session user id")),
    responses(
        (status = 200, description = "Server-sent `history` events, one per change"),
        (status = 401, description = "Unknown user"),
        (status = 503, description = "Persistence disabled")
    )
)]
/// Stream a user's history
///
/// Sends the current list immediately, then the full list again after every new submission.
#[axum::debug_handler]
async fn stream_assessments(
    State(state): State<AppState>,
    AxumPath(user_id): AxumPath<String>,
) -> Result<
    Sse<impl Stream<Item = Result<Event, axum::Error>>>,
    (StatusCode, &'static str),
> {
    let feed = match state.service.watch_history(&user_id).await {
        Ok(feed) => feed,
        Err(e) => {
            tracing::error!("Stream assessments error: {}", e);
            return Err(error_response(e));
        }
    };

    let stream = futures::stream::unfold(feed, |mut feed| async move {
        let history = feed.next().await?;
        let event = Event::default()
            .event("history")
            .json_data(wire::history_res(history));
        Some((event, feed))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
