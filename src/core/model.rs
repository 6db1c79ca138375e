//! Request orchestration on top of the active driver.
//!
//! Every operation except [`Model::status`] runs under the [`RequestGate`], so
//! at most one datastore operation is in flight at any time. Operations never
//! fail outright: errors are reported in the `error` field of the returned
//! envelope, prefixed with the stage that failed.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::gate::RequestGate;
use super::message::{
    AnswerRequest, AnswerResponse, NO_RESULTS_RETURNED_MSG, QuestionRecord, QuestionResponse,
    StatusResponse,
};
use super::registry::{DriverRegistry, RegistryError};
use crate::config::{AppConfig, MessageConfig};
use crate::driver::Driver;

pub const INSERT_ERROR: &str = "Insertion error: ";
pub const GET_ERROR: &str = "Get error: ";
pub const UPDATE_ERROR: &str = "Error updating record: ";
pub const DELETE_ERROR: &str = "Error deleting record: ";

pub const INSERTED_MSG: &str = "Record added to the datastore";
pub const RETRIEVED_MSG: &str = "Record retrieved from the datastore";
pub const UPDATED_MSG: &str = "Updated question record in the datastore";

pub struct Model {
    registry: Arc<DriverRegistry>,
    gate: RequestGate,
    active_driver: String,
    messages: MessageConfig,
}

impl Model {
    pub fn new(registry: Arc<DriverRegistry>, config: &AppConfig) -> Self {
        Self {
            registry,
            gate: RequestGate::new(),
            active_driver: config.active_driver.clone(),
            messages: config.messages.clone(),
        }
    }

    fn driver(&self) -> Result<Arc<dyn Driver>, RegistryError> {
        self.registry.resolve(&self.active_driver)
    }

    /// Ping the active driver. Not gated.
    pub async fn status(&self) -> StatusResponse {
        info!("Getting status of the {} datastore", self.active_driver);
        let driver = match self.driver() {
            Ok(driver) => driver,
            Err(err) => return StatusResponse::unavailable(err.to_string()),
        };

        match driver.ping().await {
            Ok(()) => StatusResponse::running(format!("{} datastore is running", driver.kind())),
            Err(err) => {
                error!("Datastore ping failed: {}", err);
                StatusResponse::unavailable(err.to_string())
            }
        }
    }

    pub async fn insert(&self, record: QuestionRecord) -> QuestionResponse {
        let _guard = self.gate.enter("insert").await;
        let response = QuestionResponse::new("insert");

        let result = match self.driver() {
            Ok(driver) => driver.insert(&record).await.map_err(|e| e.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match result {
            Ok(affected) => {
                info!("Added question {} ({} rows affected)", record.question_id, affected);
                QuestionResponse {
                    question_id: record.question_id,
                    question: record.question,
                    category: record.category,
                    records_affected: Some(affected),
                    ..response
                }
                .succeed(INSERTED_MSG)
            }
            Err(reason) => {
                error!("{}{}", INSERT_ERROR, reason);
                response.fail(format!("{INSERT_ERROR}{reason}"))
            }
        }
    }

    /// Check a submitted answer and consume the question.
    ///
    /// A found record is deleted whether or not the answer was correct.
    pub async fn fetch_and_verify(&self, request: AnswerRequest) -> AnswerResponse {
        let _guard = self.gate.enter("get").await;
        let mut response = AnswerResponse::new(request.response.as_str());

        let driver = match self.driver() {
            Ok(driver) => driver,
            Err(err) => return response.fail(format!("{GET_ERROR}{err}")),
        };

        let record = match driver.fetch(&request.question_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("No record for question {}", request.question_id);
                return response.succeed(NO_RESULTS_RETURNED_MSG);
            }
            Err(err) => {
                error!("{}{}", GET_ERROR, err);
                return response.fail(format!("{GET_ERROR}{err}"));
            }
        };

        let correct = record.is_correct(&request.response);
        response.question = record.question;
        response.category = record.category;
        response.answer = record.answer;
        response.correct = Some(correct);

        if let Err(err) = driver.delete(&request.question_id).await {
            error!("{}{}", DELETE_ERROR, err);
            return response.fail(format!("{DELETE_ERROR}{err}"));
        }

        let message = if correct {
            &self.messages.congrats
        } else {
            &self.messages.try_again
        };
        response.succeed(message.as_str())
    }

    /// Read a question without consuming it
    pub async fn fetch(&self, question_id: &str) -> QuestionResponse {
        let _guard = self.gate.enter("fetch").await;
        let response = QuestionResponse::new("get");

        let result = match self.driver() {
            Ok(driver) => driver.fetch(question_id).await.map_err(|e| e.to_string()),
            Err(err) => Err(err.to_string()),
        };

        match result {
            Ok(Some(record)) => QuestionResponse {
                question_id: record.question_id,
                question: record.question,
                category: record.category,
                answer: record.answer,
                ..response
            }
            .succeed(RETRIEVED_MSG),
            Ok(None) => QuestionResponse {
                question_id: question_id.to_string(),
                ..response
            }
            .succeed(NO_RESULTS_RETURNED_MSG),
            Err(reason) => {
                error!("{}{}", GET_ERROR, reason);
                response.fail(format!("{GET_ERROR}{reason}"))
            }
        }
    }

    pub async fn update(&self, record: QuestionRecord) -> QuestionResponse {
        let _guard = self.gate.enter("update").await;
        let response = QuestionResponse {
            question_id: record.question_id.clone(),
            question: record.question.clone(),
            category: record.category.clone(),
            ..QuestionResponse::new("update")
        };

        let driver = match self.driver() {
            Ok(driver) => driver,
            Err(err) => return response.fail(format!("{UPDATE_ERROR}{err}")),
        };

        match driver.update(&record).await {
            Ok(affected) => {
                info!("Updated question {} ({} rows affected)", record.question_id, affected);
                let response = response.succeed(UPDATED_MSG);
                if driver.kind().reports_affected() && affected == 0 {
                    warn!("Update matched no record for {}", record.question_id);
                    response.warn(no_match(&record.question_id))
                } else {
                    response
                }
            }
            Err(err) => {
                error!("{}{}", UPDATE_ERROR, err);
                response.fail(format!("{UPDATE_ERROR}{err}"))
            }
        }
    }

    /// Deleting an identifier that does not exist is not an error
    pub async fn delete(&self, question_id: &str) -> QuestionResponse {
        let _guard = self.gate.enter("delete").await;
        let response = QuestionResponse {
            question_id: question_id.to_string(),
            ..QuestionResponse::new("delete")
        };

        let driver = match self.driver() {
            Ok(driver) => driver,
            Err(err) => return response.fail(format!("{DELETE_ERROR}{err}")),
        };

        match driver.delete(question_id).await {
            Ok(affected) => {
                info!("Deleted question {} ({} rows affected)", question_id, affected);
                let response = QuestionResponse {
                    records_affected: Some(affected),
                    ..response
                }
                .succeed(format!("Question with QuestionID = {question_id} has been deleted"));
                if driver.kind().reports_affected() && affected == 0 {
                    response.warn(no_match(question_id))
                } else {
                    response
                }
            }
            Err(err) => {
                error!("{}{}", DELETE_ERROR, err);
                response.fail(format!("{DELETE_ERROR}{err}"))
            }
        }
    }
}

fn no_match(question_id: &str) -> String {
    format!("No record matched questionid {question_id}")
}
