use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, NewTicket, PhotoRecord, PhotoTag, TransitionRequest, TransitionView};
use super::repository::{RepositoryError, TicketRepository};
use super::service::{TicketService, TicketServiceError};
use crate::rules::{Period, TicketId};

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoUpload {
    pub tag: PhotoTag,
    pub storage_key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub assignee: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Router builder exposing ticket lifecycle and scoring endpoints.
pub fn ticket_router<R>(service: Arc<TicketService<R>>) -> Router
where
    R: TicketRepository + 'static,
{
    Router::new()
        .route("/api/v1/tickets", post(create_handler::<R>))
        .route("/api/v1/tickets/:ticket_id", get(ticket_handler::<R>))
        .route("/api/v1/tickets/:ticket_id/photos", post(photo_handler::<R>))
        .route(
            "/api/v1/tickets/:ticket_id/transitions",
            post(transition_handler::<R>),
        )
        .route(
            "/api/v1/tickets/:ticket_id/inspection-failures",
            post(inspection_failure_handler::<R>),
        )
        .route("/api/v1/tickets/:ticket_id/audit", get(audit_handler::<R>))
        .route("/api/v1/scores", post(score_handler::<R>))
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    axum::Json(ticket): axum::Json<NewTicket>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.create(ticket, Utc::now()) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ticket_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    Path(ticket_id): Path<String>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.get(&TicketId(ticket_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn photo_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    Path(ticket_id): Path<String>,
    axum::Json(upload): axum::Json<PhotoUpload>,
) -> Response
where
    R: TicketRepository + 'static,
{
    let photo = PhotoRecord {
        tag: upload.tag,
        storage_key: upload.storage_key,
        uploaded_at: Utc::now(),
    };
    match service.attach_photo(&TicketId(ticket_id), photo.clone()) {
        Ok(()) => (StatusCode::CREATED, axum::Json(photo)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    Path(ticket_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.transition(&TicketId(ticket_id), request, Utc::now()) {
        Ok(outcome) => {
            let view = TransitionView {
                ticket_id: outcome.ticket.id.clone(),
                from: outcome.from.label(),
                status: outcome.ticket.status.label(),
                is_rejection: outcome.result.is_rejection,
                version: outcome.ticket.version,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inspection_failure_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    Path(ticket_id): Path<String>,
    axum::Json(actor): axum::Json<Actor>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.record_failed_inspection(&TicketId(ticket_id), &actor, Utc::now()) {
        Ok(penalty) => (StatusCode::CREATED, axum::Json(penalty)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    Path(ticket_id): Path<String>,
) -> Response
where
    R: TicketRepository + 'static,
{
    match service.audit_trail(&TicketId(ticket_id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<TicketService<R>>>,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: TicketRepository + 'static,
{
    if request.end < request.start {
        let payload = json!({ "error": "period end must not precede its start" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    }

    let period = Period::new(request.start, request.end);
    match service.score(&request.assignee, period, Utc::now()) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Rule violations are surfaced verbatim so the actor sees which rule refused them.
fn error_response(error: TicketServiceError) -> Response {
    let status = match &error {
        TicketServiceError::Transition(_)
        | TicketServiceError::Evidence(_)
        | TicketServiceError::Resolved { .. }
        | TicketServiceError::NotInspection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TicketServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        TicketServiceError::NotFound(_)
        | TicketServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        TicketServiceError::Repository(RepositoryError::Conflict { .. })
        | TicketServiceError::Repository(RepositoryError::Duplicate) => StatusCode::CONFLICT,
        TicketServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
