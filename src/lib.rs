//! Question datastore service.
//!
//! Stores quiz questions keyed by a caller-assigned id in one of four
//! interchangeable backends (in-process cache, Redis, MySQL, PostgreSQL) and
//! exposes them over a small JSON HTTP API. A submitted answer is checked
//! against the stored one and the question is consumed.

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod logging;

pub use crate::app::App;
pub use crate::config::AppConfig;
pub use crate::core::message::{
    AnswerRequest, AnswerResponse, QuestionRecord, QuestionRequest, QuestionResponse,
    StatusCode, StatusResponse,
};
pub use crate::core::{DriverRegistry, Model};
pub use crate::driver::{Driver, DriverKind};
pub use crate::error::{StoreError, StoreResult};
