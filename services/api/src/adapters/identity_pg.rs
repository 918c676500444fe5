//! services/api/src/adapters/identity_pg.rs
//!
//! An email/password identity provider implementing the `IdentityProvider` port.
//! Accounts live in the `accounts` table with argon2 password hashes. Every successful
//! registration, sign-in or sign-out is published to subscribers, which is how the core's
//! session manager learns about identity changes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use crate::web::state::AccountRegistrar;
use async_trait::async_trait;
use scripture_core::domain::{Credentials, Identity};
use scripture_core::ports::{AuthError, IdentityProvider, PortResult};
use sqlx::{FromRow, PgPool};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{error, info};
use uuid::Uuid;

const PROVIDER_NAME: &str = "email";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct PgIdentityProvider {
    pool: PgPool,
    current: Mutex<Option<Identity>>,
    changes: broadcast::Sender<Option<Identity>>,
}

impl PgIdentityProvider {
    /// Creates a provider with nobody signed in.
    pub fn new(pool: PgPool) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            pool,
            current: Mutex::new(None),
            changes,
        }
    }

    fn publish(&self, identity: Option<Identity>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = identity.clone();
        let _ = self.changes.send(identity);
    }
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    uid: String,
    email: String,
    display_name: Option<String>,
    hashed_password: String,
}

impl AccountRecord {
    fn to_domain(self) -> Identity {
        Identity {
            uid: self.uid,
            email: Some(self.email),
            display_name: self.display_name,
        }
    }
}

fn check_filled(credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(AuthError::PopupClosedByUser);
    }
    Ok(())
}

fn map_db_error(e: sqlx::Error) -> AuthError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => AuthError::NetworkRequestFailed,
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::Other("An account with this email already exists".to_string())
        }
        other => {
            error!("Account query failed: {other}");
            AuthError::Other(other.to_string())
        }
    }
}

//=========================================================================================
// `IdentityProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn current(&self) -> Option<Identity> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>> {
        self.changes.subscribe()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        check_filled(credentials)?;

        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT uid, email, display_name, hashed_password FROM accounts WHERE email = $1",
        )
        .bind(&credentials.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| AuthError::Other("Invalid email or password".to_string()))?;

        let parsed_hash = PasswordHash::new(&record.hashed_password).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            AuthError::Other("Authentication error".to_string())
        })?;
        Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::Other("Invalid email or password".to_string()))?;

        let identity = record.to_domain();
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.publish(None);
        Ok(())
    }
}

//=========================================================================================
// `AccountRegistrar` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountRegistrar for PgIdentityProvider {
    async fn register(
        &self,
        credentials: &Credentials,
        display_name: Option<String>,
    ) -> Result<Identity, AuthError> {
        check_filled(credentials)?;

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = Argon2::default()
            .hash_password(credentials.password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                AuthError::Other("Failed to hash password".to_string())
            })?
            .to_string();

        let uid = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO accounts (uid, email, display_name, hashed_password) VALUES ($1, $2, $3, $4)",
        )
        .bind(&uid)
        .bind(&credentials.email)
        .bind(&display_name)
        .bind(&hashed_password)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let identity = Identity {
            uid,
            email: Some(credentials.email.clone()),
            display_name,
        };
        info!(uid = %identity.uid, "Registered new account");
        self.publish(Some(identity.clone()));
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn empty_credentials_count_as_cancelled() {
        assert_eq!(
            check_filled(&credentials("", "pw")),
            Err(AuthError::PopupClosedByUser)
        );
        assert_eq!(
            check_filled(&credentials("a@b.c", "")),
            Err(AuthError::PopupClosedByUser)
        );
        assert!(check_filled(&credentials("a@b.c", "pw")).is_ok());
    }

    #[test]
    fn connectivity_failures_are_network_errors() {
        assert_eq!(map_db_error(sqlx::Error::PoolTimedOut), AuthError::NetworkRequestFailed);
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            AuthError::Other(_)
        ));
    }
}
