//! services/api/src/adapters/remote_pg.rs
//!
//! This module contains the remote document store adapter, the concrete implementation
//! of the `RemoteDocumentStore` port from the `core` crate. Each user's document is one
//! row of `user_documents`, keyed by uid, with `last_updated` assigned by the server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scripture_core::domain::UserDocument;
use scripture_core::ports::{PortError, PortResult, RemoteDocumentStore};
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A Postgres adapter that implements the `RemoteDocumentStore` port.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Runs the migrations shared by the document store and the identity provider.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct UserDocumentRecord {
    email: Option<String>,
    display_name: Option<String>,
    read_scriptures: Vec<String>,
    last_updated: DateTime<Utc>,
}

impl UserDocumentRecord {
    fn to_domain(self) -> UserDocument {
        UserDocument {
            email: self.email,
            display_name: self.display_name,
            read_scriptures: self.read_scriptures,
            last_updated: Some(self.last_updated),
        }
    }
}

//=========================================================================================
// `RemoteDocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteDocumentStore for PgDocumentStore {
    async fn get(&self, uid: &str) -> PortResult<Option<UserDocument>> {
        let record = sqlx::query_as::<_, UserDocumentRecord>(
            "SELECT email, display_name, read_scriptures, last_updated FROM user_documents WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(UserDocumentRecord::to_domain))
    }

    async fn set(&self, uid: &str, document: UserDocument) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_documents (uid, email, display_name, read_scriptures, last_updated) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (uid) DO UPDATE SET email = EXCLUDED.email, \
             display_name = EXCLUDED.display_name, read_scriptures = EXCLUDED.read_scriptures, \
             last_updated = now()",
        )
        .bind(uid)
        .bind(document.email)
        .bind(document.display_name)
        .bind(document.read_scriptures)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn update_read_scriptures(
        &self,
        uid: &str,
        read_scriptures: Vec<String>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE user_documents SET read_scriptures = $1, last_updated = now() WHERE uid = $2",
        )
        .bind(read_scriptures)
        .bind(uid)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document for user {} not found", uid)));
        }
        Ok(())
    }
}
