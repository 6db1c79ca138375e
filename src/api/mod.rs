//! HTTP surface.
//!
//! | method | path                  | operation        |
//! |--------|-----------------------|------------------|
//! | GET    | `/api/v1/ds/status`   | status           |
//! | POST   | `/api/v1/ds/insert`   | insert           |
//! | POST   | `/api/v1/ds/get`      | fetch and verify |
//! | GET    | `/api/v1/ds/question` | fetch            |
//! | PUT    | `/api/v1/ds/update`   | update           |
//! | DELETE | `/api/v1/ds/delete`   | delete           |
//!
//! The OpenAPI document is served at `/api-docs/openapi.json` and rendered at `/scalar`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::HeaderName;
use axum::routing::{delete, get, post, put};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::core::Model;
use crate::core::message::{
    AnswerRequest, AnswerResponse, QuestionRecord, QuestionRequest, QuestionResponse,
    StatusResponse,
};

pub mod handlers;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<Model>,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Datastore Service", description = "Question storage for the quiz service"),
    paths(
        handlers::status,
        handlers::insert_question,
        handlers::check_answer,
        handlers::get_question,
        handlers::update_question,
        handlers::delete_question,
    ),
    components(schemas(
        QuestionRecord,
        QuestionRequest,
        QuestionResponse,
        AnswerRequest,
        AnswerResponse,
        StatusResponse,
    )),
    tags((name = "datastore", description = "Question records"))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/api/v1/ds/status", get(handlers::status))
        .route("/api/v1/ds/insert", post(handlers::insert_question))
        .route("/api/v1/ds/get", post(handlers::check_answer))
        .route("/api/v1/ds/question", get(handlers::get_question))
        .route("/api/v1/ds/update", put(handlers::update_question))
        .route("/api/v1/ds/delete", delete(handlers::delete_question))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}
