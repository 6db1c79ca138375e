//! PostgreSQL driver.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS trivia (
//!     question_id TEXT PRIMARY KEY,
//!     question TEXT NOT NULL,
//!     category TEXT NOT NULL,
//!     answer TEXT NOT NULL
//! );
//! ```
//!
//! The table is created on first connection only when `postgres.init_schema` is set.

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::sql::{close_quietly, finish_write};
use super::{Driver, DriverKind, sealed};
use crate::config::PostgresConfig;
use crate::core::message::QuestionRecord;
use crate::error::{StoreError, StoreResult};

const BACKEND: DriverKind = DriverKind::Postgres;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS trivia (
    question_id TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    category TEXT NOT NULL,
    answer TEXT NOT NULL
)";
const INSERT: &str =
    "INSERT INTO trivia (question_id, question, category, answer) VALUES ($1, $2, $3, $4)";
const SELECT: &str =
    "SELECT question_id, question, category, answer FROM trivia WHERE question_id = $1";
const UPDATE: &str =
    "UPDATE trivia SET question = $2, category = $3, answer = $4 WHERE question_id = $1";
const DELETE: &str = "DELETE FROM trivia WHERE question_id = $1";

pub struct PostgresDriver {
    options: PgConnectOptions,
    init_schema: bool,
    schema: OnceCell<()>,
}

impl PostgresDriver {
    pub fn new(config: &PostgresConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database);
        if let Some(password) = config.password.as_deref() {
            options = options.password(password);
        }

        info!(
            "Creating PostgreSQL driver for {}@{}:{}/{}",
            config.user, config.host, config.port, config.database
        );
        Self {
            options,
            init_schema: config.init_schema,
            schema: OnceCell::new(),
        }
    }

    async fn connect(&self) -> StoreResult<PgConnection> {
        let mut conn = PgConnection::connect_with(&self.options)
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

impl sealed::Sealed for PostgresDriver {}

#[async_trait]
impl Driver for PostgresDriver {
    fn kind(&self) -> DriverKind {
        BACKEND
    }

    async fn open(&self) -> StoreResult<()> {
        info!("postgres: opening database");
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
        debug!("postgres: adding record {}", record.question_id);
        let mut conn = self.connect().await?;
        let result = bind_record(sqlx::query(INSERT), record)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "insert", result).await
    }

    async fn fetch(&self, question_id: &str) -> StoreResult<Option<QuestionRecord>> {
        debug!("postgres: getting record {}", question_id);
        let mut conn = self.connect().await?;
        let row = sqlx::query_as::<_, QuestionRecord>(SELECT)
            .bind(question_id)
            .fetch_optional(&mut conn)
            .await;
        close_quietly(conn, BACKEND).await;
        row.map_err(|e| StoreError::query(BACKEND, e))
    }

    async fn update(&self, record: &QuestionRecord) -> StoreResult<u64> {
        debug!("postgres: updating record {}", record.question_id);
        let mut conn = self.connect().await?;
        let result = bind_record(sqlx::query(UPDATE), record)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "update", result).await
    }

    async fn delete(&self, question_id: &str) -> StoreResult<u64> {
        debug!("postgres: deleting record {}", question_id);
        let mut conn = self.connect().await?;
        let result = sqlx::query(DELETE)
            .bind(question_id)
            .execute(&mut conn)
            .await
            .map(|done| done.rows_affected());
        finish_write(conn, BACKEND, "delete", result).await
    }
}

/// Numbered placeholders let insert and update share one bind order
fn bind_record<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    record: &'q QuestionRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&record.question_id)
        .bind(&record.question)
        .bind(&record.category)
        .bind(&record.answer)
}
