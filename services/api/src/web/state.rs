//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use async_trait::async_trait;
use scripture_core::{AuthError, CanonIndex, Credentials, Identity, ReadStateStore, SessionManager};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Creates accounts for the identity provider. Signing in is the provider's own job.
#[async_trait]
pub trait AccountRegistrar: Send + Sync {
    /// Creates an account and signs it in.
    async fn register(
        &self,
        credentials: &Credentials,
        display_name: Option<String>,
    ) -> Result<Identity, AuthError>;
}

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Built once from the raw input; read-only for the life of the process.
    pub canon: Arc<CanonIndex>,
    pub store: Arc<ReadStateStore>,
    pub sessions: Arc<SessionManager>,
    pub accounts: Arc<dyn AccountRegistrar>,
    /// Cancelled at shutdown so long-lived event streams end.
    pub shutdown: CancellationToken,
}
