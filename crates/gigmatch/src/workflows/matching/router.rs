use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::commands::{CandidacyCommand, CommandOutcome};
use super::domain::{
    CandidacyFilter, CandidacyId, CandidacyView, Job, JobFilter, JobId, NewJob, NewUser, User,
    UserFilter, UserId,
};
use super::error::MatchingError;
use super::service::MatchingService;
use super::store::EntityStore;

type SharedService<S> = State<Arc<MatchingService<S>>>;

/// Router builder exposing the matching command surface over HTTP.
pub fn matching_router<S>(service: Arc<MatchingService<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/users",
            post(register_handler::<S>).get(list_users_handler::<S>),
        )
        .route("/api/v1/users/:user_id", get(user_handler::<S>))
        .route("/api/v1/users/:user_id/verify", post(verify_handler::<S>))
        .route(
            "/api/v1/jobs",
            post(post_job_handler::<S>).get(list_jobs_handler::<S>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(job_handler::<S>).delete(withdraw_handler::<S>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_handler::<S>),
        )
        .route("/api/v1/jobs/:job_id/assign", post(assign_handler::<S>))
        .route("/api/v1/jobs/:job_id/complete", post(complete_handler::<S>))
        .route(
            "/api/v1/offers",
            get(list_offers_handler::<S>).post(create_offer_handler::<S>),
        )
        .route(
            "/api/v1/offers/:offer_id",
            get(offer_handler::<S>).patch(command_handler::<S>),
        )
        .with_state(service)
}

impl IntoResponse for MatchingError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, payload) = match &self {
            MatchingError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                json!({ "error": message, "code": self.code() }),
            ),
            MatchingError::Unauthorized { .. } => (
                StatusCode::FORBIDDEN,
                json!({ "error": message, "code": self.code() }),
            ),
            MatchingError::Conflict(kind) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "code": kind.code(), "retryable": kind.retryable() }),
            ),
            MatchingError::Invalid { field, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message, "code": self.code(), "field": field }),
            ),
            MatchingError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message, "code": self.code() }),
            ),
        };
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) worker_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfferRequest {
    pub(crate) job_id: JobId,
    pub(crate) worker_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignRequest {
    pub(crate) worker_id: UserId,
    pub(crate) actor_id: UserId,
}

pub(crate) async fn register_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Json(signup): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), MatchingError> {
    let user = service.register_user(signup)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn list_users_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, MatchingError> {
    service.list_users(&filter).map(Json)
}

pub(crate) async fn user_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, MatchingError> {
    service.get_user(&user_id).map(Json)
}

pub(crate) async fn verify_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(user_id): Path<UserId>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<User>, MatchingError> {
    service.verify_user(user_id, request.actor_id).map(Json)
}

pub(crate) async fn post_job_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Json(posting): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), MatchingError> {
    let job = service.post_job(posting)?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub(crate) async fn list_jobs_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Vec<Job>>, MatchingError> {
    service.list_jobs(&filter).map(Json)
}

pub(crate) async fn job_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(job_id): Path<JobId>,
) -> Result<Json<Job>, MatchingError> {
    service.get_job(&job_id).map(Json)
}

pub(crate) async fn withdraw_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(job_id): Path<JobId>,
    Query(request): Query<ActorRequest>,
) -> Result<StatusCode, MatchingError> {
    service.withdraw_job(job_id, request.actor_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn apply_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(job_id): Path<JobId>,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<CandidacyView>), MatchingError> {
    let candidacy = service.apply(job_id, request.worker_id)?;
    Ok((StatusCode::CREATED, Json(candidacy.view())))
}

pub(crate) async fn assign_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(job_id): Path<JobId>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<Job>, MatchingError> {
    service
        .assign(job_id, request.worker_id, request.actor_id)
        .map(Json)
}

pub(crate) async fn complete_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(job_id): Path<JobId>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<Job>, MatchingError> {
    service.complete(job_id, request.actor_id).map(Json)
}

pub(crate) async fn list_offers_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Query(filter): Query<CandidacyFilter>,
) -> Result<Json<Vec<CandidacyView>>, MatchingError> {
    let rows = service.list_offers(filter)?;
    Ok(Json(rows.iter().map(|row| row.view()).collect()))
}

pub(crate) async fn create_offer_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Json(request): Json<OfferRequest>,
) -> Result<(StatusCode, Json<CandidacyView>), MatchingError> {
    let candidacy = service.create_offer(request.job_id, request.worker_id)?;
    Ok((StatusCode::CREATED, Json(candidacy.view())))
}

pub(crate) async fn offer_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(offer_id): Path<CandidacyId>,
) -> Result<Json<CandidacyView>, MatchingError> {
    service.get_candidacy(&offer_id).map(|row| Json(row.view()))
}

pub(crate) async fn command_handler<S: EntityStore + 'static>(
    State(service): SharedService<S>,
    Path(offer_id): Path<CandidacyId>,
    Json(command): Json<CandidacyCommand>,
) -> Result<Json<CommandOutcome>, MatchingError> {
    service.execute(offer_id, command).map(Json)
}
