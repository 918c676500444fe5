pub mod auth;
pub mod events;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

// Re-export the handlers so the router is built from one place.
pub use auth::{signin_handler, signout_handler, signup_handler};
pub use events::events_handler;
pub use rest::{
    canon_handler, link_handler, restart_handler, session_handler, stats_handler, toggle_handler,
};

/// Every checklist route, bound to `state`. CORS and Swagger UI are layered on by the binary.
pub fn router(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/canon", get(canon_handler))
        .route("/stats", get(stats_handler))
        .route("/scriptures/{id}/toggle", post(toggle_handler))
        .route("/scriptures/{id}/link", get(link_handler))
        .route("/restart", post(restart_handler))
        .route("/session", get(session_handler))
        .route("/events", get(events_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/signin/{provider}", post(signin_handler))
        .route("/auth/signout", post(signout_handler))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! An `AppState` over the core's in-memory ports, for driving the router in tests.

    use super::state::{AccountRegistrar, AppState};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, Router};
    use scripture_core::test_support::{FakeIdentityProvider, MemoryDocumentStore, MemoryLocalStore};
    use scripture_core::{
        AuthError, CanonIndex, Credentials, Identity, RawRecord, ReadStateStore, SessionManager,
    };
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    /// Registers by signing the new identity straight in.
    pub struct FakeRegistrar {
        pub provider: Arc<FakeIdentityProvider>,
    }

    #[async_trait]
    impl AccountRegistrar for FakeRegistrar {
        async fn register(
            &self,
            credentials: &Credentials,
            display_name: Option<String>,
        ) -> Result<Identity, AuthError> {
            if credentials.email.is_empty() {
                return Err(AuthError::PopupClosedByUser);
            }
            let identity = Identity {
                uid: "new-user".to_string(),
                email: Some(credentials.email.clone()),
                display_name,
            };
            self.provider.push(Some(identity.clone()));
            Ok(identity)
        }
    }

    pub struct TestApp {
        pub router: Router,
        pub state: Arc<AppState>,
        pub provider: Arc<FakeIdentityProvider>,
        pub remote: Arc<MemoryDocumentStore>,
    }

    pub fn test_app() -> TestApp {
        let canon = Arc::new(CanonIndex::build(&[
            RawRecord::new("Gen 1:1", "In the beginning..."),
            RawRecord::new("D&C 1:1", "Hearken..."),
            RawRecord::new("Mosiah 2:17–18", "When ye are in the service"),
        ]));
        let provider = Arc::new(FakeIdentityProvider::new());
        let remote = Arc::new(MemoryDocumentStore::default());
        let local = Arc::new(MemoryLocalStore::default());
        let store = Arc::new(ReadStateStore::new(remote.clone(), local));
        let sessions = Arc::new(SessionManager::new(provider.clone(), store.clone()));
        let state = Arc::new(AppState {
            canon,
            store,
            sessions,
            accounts: Arc::new(FakeRegistrar {
                provider: provider.clone(),
            }),
            shutdown: CancellationToken::new(),
        });
        TestApp {
            router: super::router(state.clone()),
            state,
            provider,
            remote,
        }
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str, json: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }
}
