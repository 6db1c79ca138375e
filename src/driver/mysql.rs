//! MySQL driver.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::sql::{close_quietly, finish_write};
use super::{Driver, DriverKind, sealed};
use crate::config::MySqlConfig;
use crate::core::message::QuestionRecord;
use crate::error::{StoreError, StoreResult};

const BACKEND: DriverKind = DriverKind::MySql;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS trivia (
    question_id VARCHAR(64) NOT NULL PRIMARY KEY,
    question TEXT NOT NULL,
    category VARCHAR(255) NOT NULL,
    answer TEXT NOT NULL
)";
const INSERT: &str =
    "INSERT INTO trivia (question_id, question, category, answer) VALUES (?, ?, ?, ?)";
const SELECT: &str =
    "SELECT question_id, question, category, answer FROM trivia WHERE question_id = ?";
const UPDATE: &str =
    "UPDATE trivia SET question = ?, category = ?, answer = ? WHERE question_id = ?";
const DELETE: &str = "DELETE FROM trivia WHERE question_id = ?";

pub struct MySqlDriver {
    options: MySqlConnectOptions,
    init_schema: bool,
    schema: OnceCell<()>,
}

impl MySqlDriver {
    pub fn new(config: &MySqlConfig) -> StoreResult<Self> {
        let options = MySqlConnectOptions::from_str(&config.connection)
            .map_err(|e| StoreError::connection(BACKEND, e))?
            .database(&config.database);

        info!("Creating MySQL driver for database {}", config.database);
        Ok(Self {
            options,
            init_schema: config.init_schema,
            schema: OnceCell::new(),
        })
    }

    async fn connect(&self) -> StoreResult<MySqlConnection> {
        let mut conn = MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        if self.init_schema {
            let target = &mut conn;
            let created = self
                .schema
                .get_or_try_init(|| async move {
                    sqlx::query(CREATE_TABLE).execute(target).await.map(|_| ())
                })
                .await;
            if let Err(e) = created {
                close_quietly(conn, BACKEND).await;
                return Err(StoreError::query(BACKEND, e));
            }
        }

        Ok(conn)
    }
}

impl sealed::Sealed for MySqlDriver {}

#[async_trait]
impl Driver for MySqlDriver {
    fn kind(&self) -> DriverKind {
        BACKEND
    }

    async fn open(&self) -> StoreResult<()> {
        info!("mysql: opening database");
        let conn = self.connect().await?;
        conn.close()
            .await
            .map_err(|e| StoreError::connection(BACKEND, e))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connect().await?;
        let pinged = conn.ping().await;
        close_quietly(conn, BACKEND).await;
        pinged.map_err(|e| StoreError::connection(BACKEND, e))
    }

    async fn insert(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("mysql: adding record {}", record.question_id);
        let mut conn = self.connect().await?;
        let result = sqlx::query(INSERT)
            .bind(&record.question_id)
            .bind(&record.question)
            .bind(&record.category)
            .bind(&record.answer)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "insert", result).await
    }

    async fn fetch(&self, question_id: &str) -> StoreResult<Option<QuestionRecord>> {
        debug!("mysql: getting record {}", question_id);
        let mut conn = self.connect().await?;
        let row = sqlx::query_as::<_, QuestionRecord>(SELECT)
            .bind(question_id)
            .fetch_optional(&mut conn)
            .await;
        close_quietly(conn, BACKEND).await;
        row.map_err(|e| StoreError::query(BACKEND, e))
    }

    async fn update(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("mysql: updating record {}", record.question_id);
        let mut conn = self.connect().await?;
        let result = sqlx::query(UPDATE)
            .bind(&record.question)
            .bind(&record.category)
            .bind(&record.answer)
            .bind(&record.question_id)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "update", result).await
    }

    async fn delete(&self, question_id: &str) -> StoreResult<u64> {
        debug!("mysql: deleting record {}", question_id);
        let mut conn = self.connect().await?;
        let result = sqlx::query(DELETE)
            .bind(question_id)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "delete", result).await
    }
}
