use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::IntoParams;
use validator::Validate;

use super::AppState;
use crate::core::message::{
    AnswerRequest, AnswerResponse, Envelope, QuestionRequest, QuestionResponse, StatusResponse,
};

/// `?questionid=` query string
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// Caller-assigned question identifier
    #[serde(rename = "questionid")]
    #[validate(length(min = 1, message = "questionid is required"))]
    pub question_id: String,
}

/// 200 when the envelope carries no error, `failure` otherwise
fn respond<T: Envelope + Serialize>(failure: StatusCode, envelope: T) -> Response {
    let status = if envelope.is_error() {
        failure
    } else {
        StatusCode::OK
    };
    (status, Json(envelope)).into_response()
}

fn bad_request<T: Serialize>(envelope: T) -> Response {
    (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
}

fn read_body<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    let Json(request) = payload.map_err(|rejection| rejection.body_text())?;
    request.validate().map_err(|errors| errors.to_string())?;
    Ok(request)
}

fn read_query(query: Result<Query<IdQuery>, QueryRejection>) -> Result<String, String> {
    let Query(query) = query.map_err(|rejection| rejection.body_text())?;
    query.validate().map_err(|errors| errors.to_string())?;
    Ok(query.question_id)
}

#[utoipa::path(
    get,
    path = "/api/v1/ds/status",
    tag = "datastore",
    responses(
        (status = 200, description = "Datastore is running", body = StatusResponse),
        (status = 503, description = "Datastore is unavailable", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Response {
    respond(StatusCode::SERVICE_UNAVAILABLE, state.model.status().await)
}

#[utoipa::path(
    post,
    path = "/api/v1/ds/insert",
    tag = "datastore",
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question stored", body = QuestionResponse),
        (status = 400, description = "Invalid request", body = QuestionResponse),
        (status = 500, description = "Datastore error", body = QuestionResponse)
    )
)]
pub async fn insert_question(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    match read_body(payload) {
        Ok(request) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.model.insert(request.into_record()).await,
        ),
        Err(reason) => {
            warn!("Rejected insert request: {}", reason);
            bad_request(QuestionResponse::new("insert").fail(reason))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/ds/get",
    tag = "datastore",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer checked, question consumed", body = AnswerResponse),
        (status = 400, description = "Invalid request", body = AnswerResponse),
        (status = 500, description = "Datastore error", body = AnswerResponse)
    )
)]
pub async fn check_answer(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Response {
    match read_body(payload) {
        Ok(request) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.model.fetch_and_verify(request).await,
        ),
        Err(reason) => {
            warn!("Rejected answer request: {}", reason);
            bad_request(AnswerResponse::new("").fail(reason))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/ds/question",
    tag = "datastore",
    params(IdQuery),
    responses(
        (status = 200, description = "Question, left in place", body = QuestionResponse),
        (status = 400, description = "Missing questionid", body = QuestionResponse),
        (status = 500, description = "Datastore error", body = QuestionResponse)
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    match read_query(query) {
        Ok(question_id) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.model.fetch(&question_id).await,
        ),
        Err(reason) => bad_request(QuestionResponse::new("get").fail(reason)),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/ds/update",
    tag = "datastore",
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Question replaced", body = QuestionResponse),
        (status = 400, description = "Invalid request", body = QuestionResponse),
        (status = 500, description = "Datastore error", body = QuestionResponse)
    )
)]
pub async fn update_question(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    match read_body(payload) {
        Ok(request) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.model.update(request.into_record()).await,
        ),
        Err(reason) => {
            warn!("Rejected update request: {}", reason);
            bad_request(QuestionResponse::new("update").fail(reason))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/ds/delete",
    tag = "datastore",
    params(IdQuery),
    responses(
        (status = 200, description = "Question removed, or was never there", body = QuestionResponse),
        (status = 400, description = "Missing questionid", body = QuestionResponse),
        (status = 500, description = "Datastore error", body = QuestionResponse)
    )
)]
pub async fn delete_question(
    State(state): State<AppState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Response {
    match read_query(query) {
        Ok(question_id) => respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            state.model.delete(&question_id).await,
        ),
        Err(reason) => bad_request(QuestionResponse::new("delete").fail(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_maps_error_to_failure_status() {
        let ok = respond(
            StatusCode::SERVICE_UNAVAILABLE,
            StatusResponse::running("memory datastore is running"),
        );
        assert_eq!(ok.status(), StatusCode::OK);

        let down = respond(
            StatusCode::SERVICE_UNAVAILABLE,
            StatusResponse::unavailable("connection refused"),
        );
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_empty_questionid_is_rejected() {
        let query = IdQuery {
            question_id: String::new(),
        };
        assert!(read_query(Ok(Query(query))).is_err());
    }
}
