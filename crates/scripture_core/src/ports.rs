//! crates/scripture_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific identity backend, document store or local storage.

use crate::domain::{Credentials, Identity, UserDocument};
use async_trait::async_trait;
use tokio::sync::broadcast;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Failure kinds of an interactive sign-in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("sign-in was cancelled by the user")]
    PopupClosedByUser,
    #[error("network request failed")]
    NetworkRequestFailed,
    #[error("sign-in failed: {0}")]
    Other(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The external identity provider. Identity transitions are pushed, never polled.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The provider name users select at sign-in (e.g. `"email"`).
    fn name(&self) -> &str;

    /// The identity known right now, before any change is published.
    fn current(&self) -> Option<Identity>;

    /// Subscribes to identity changes. Every sign-in or sign-out publishes one value,
    /// redundant ones included.
    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> PortResult<()>;
}

/// The remote per-user document store, keyed by uid.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    async fn get(&self, uid: &str) -> PortResult<Option<UserDocument>>;

    /// Creates or replaces the whole document. `last_updated` is assigned by the store.
    async fn set(&self, uid: &str, document: UserDocument) -> PortResult<()>;

    /// Overwrites `read_scriptures` and refreshes `last_updated` on an existing document.
    /// Fails with `PortError::NotFound` when the document does not exist.
    async fn update_read_scriptures(&self, uid: &str, read_scriptures: Vec<String>)
        -> PortResult<()>;
}

/// Synchronous string-keyed storage scoped to one browsing context.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}
