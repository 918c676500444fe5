//! crates/scripture_core/src/session.rs
//!
//! The session manager reacts to identity changes pushed by the identity provider: each
//! change makes the new session current, reloads the read-state for it, and tells the
//! presentation layer to refresh. It never moves the session itself; sign-in and sign-out
//! only ask the provider, whose callback then drives the transition.

use crate::domain::{CoreEvent, Credentials, Identity, Session};
use crate::ports::{AuthError, IdentityProvider};
use crate::read_state::ReadStateStore;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Result of a sign-in request, with the short notice to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn { identity: Identity, notice: String },
    /// The requested provider is not available yet.
    ComingSoon(String),
    Failed { error: AuthError, notice: String },
}

impl SignInOutcome {
    pub fn notice(&self) -> &str {
        match self {
            SignInOutcome::SignedIn { notice, .. } => notice,
            SignInOutcome::ComingSoon(notice) => notice,
            SignInOutcome::Failed { notice, .. } => notice,
        }
    }
}

/// The fixed notice shown for each sign-in failure.
pub fn auth_error_notice(error: &AuthError) -> &'static str {
    match error {
        AuthError::PopupClosedByUser => "Sign in cancelled",
        AuthError::NetworkRequestFailed => "Network error. Please check your connection.",
        AuthError::Other(_) => "Sign in failed. Please try again.",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<ReadStateStore>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<ReadStateStore>) -> Self {
        Self { identity, store }
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    /// Applies one identity change. Redundant changes are applied the same way and leave
    /// the same observable state.
    pub async fn handle_identity_change(&self, identity: Option<Identity>) {
        match &identity {
            Some(identity) => info!(uid = %identity.uid, "User signed in"),
            None => info!("User signed out or anonymous"),
        }
        let session = Session::from_identity(identity);
        self.store.load(session.clone()).await;
        self.store.publish(CoreEvent::SessionChanged(session));
    }

    /// Applies the provider's current identity, then follows its changes until `cancel`
    /// fires or the provider goes away.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut changes = self.identity.subscribe();
        self.handle_identity_change(self.identity.current()).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session manager stopping.");
                    break;
                }
                change = changes.recv() => match change {
                    Ok(identity) => self.handle_identity_change(identity).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed identity changes; resyncing with provider");
                        self.handle_identity_change(self.identity.current()).await;
                    }
                    Err(RecvError::Closed) => {
                        info!("Identity provider closed; session manager stopping.");
                        break;
                    }
                },
            }
        }
    }

    /// Spawns `run` on the current runtime.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.clone().run(cancel))
    }

    /// Asks the identity provider to sign in. Only the provider's own name is supported;
    /// any other provider gets a "coming soon" notice.
    pub async fn sign_in(&self, provider: &str, credentials: &Credentials) -> SignInOutcome {
        let label = capitalize(provider);
        if !provider.eq_ignore_ascii_case(self.identity.name()) {
            return SignInOutcome::ComingSoon(format!(
                "{label} login coming soon! Please use {} for now.",
                capitalize(self.identity.name())
            ));
        }

        match self.identity.sign_in(credentials).await {
            Ok(identity) => SignInOutcome::SignedIn {
                identity,
                notice: format!("Successfully signed in with {label}!"),
            },
            Err(error) => {
                error!("Login error: {error}");
                SignInOutcome::Failed {
                    notice: auth_error_notice(&error).to_string(),
                    error,
                }
            }
        }
    }

    /// Flushes the read-state, then asks the provider to sign out. Returns the notice to
    /// show; the provider's callback moves the session to anonymous.
    pub async fn sign_out(&self) -> Result<&'static str, &'static str> {
        self.store.save().await;
        match self.identity.sign_out().await {
            Ok(()) => Ok("Successfully signed out!"),
            Err(e) => {
                error!("Logout error: {e}");
                Err("Error signing out. Please try again.")
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LocalStore;
    use crate::test_support::{identity, FakeIdentityProvider, MemoryDocumentStore, MemoryLocalStore};
    use std::sync::atomic::Ordering;

    struct Fixture {
        provider: Arc<FakeIdentityProvider>,
        remote: Arc<MemoryDocumentStore>,
        local: Arc<MemoryLocalStore>,
        store: Arc<ReadStateStore>,
        manager: Arc<SessionManager>,
    }

    fn fixture() -> Fixture {
        let provider = Arc::new(FakeIdentityProvider::new());
        let remote = Arc::new(MemoryDocumentStore::default());
        let local = Arc::new(MemoryLocalStore::default());
        let store = Arc::new(ReadStateStore::new(remote.clone(), local.clone()));
        let manager = Arc::new(SessionManager::new(provider.clone(), store.clone()));
        Fixture {
            provider,
            remote,
            local,
            store,
            manager,
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "u1@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    async fn next_session(events: &mut broadcast::Receiver<CoreEvent>) -> Session {
        loop {
            if let CoreEvent::SessionChanged(session) = events.recv().await.unwrap() {
                return session;
            }
        }
    }

    #[tokio::test]
    async fn identity_change_loads_the_users_read_state() {
        let f = fixture();
        f.remote.insert("u1", &["scripture-3"]);
        let mut events = f.manager.subscribe();

        f.manager.handle_identity_change(Some(identity("u1"))).await;

        assert_eq!(next_session(&mut events).await, Session::Authenticated(identity("u1")));
        assert!(f.store.is_read("scripture-3"));
        assert_eq!(f.manager.session(), Session::Authenticated(identity("u1")));
    }

    #[tokio::test]
    async fn redundant_changes_are_harmless() {
        let f = fixture();
        f.local.set("scriptures_anonymous", r#"["scripture-1"]"#).unwrap();

        f.manager.handle_identity_change(None).await;
        let first = (f.store.session(), f.store.read_ids());
        f.manager.handle_identity_change(None).await;
        assert_eq!((f.store.session(), f.store.read_ids()), first);

        f.manager.handle_identity_change(Some(identity("u1"))).await;
        let signed_in = (f.store.session(), f.store.read_ids());
        f.manager.handle_identity_change(Some(identity("u1"))).await;
        assert_eq!((f.store.session(), f.store.read_ids()), signed_in);
    }

    #[tokio::test]
    async fn run_follows_provider_events_until_cancelled() {
        let f = fixture();
        f.remote.insert("u1", &["scripture-0"]);
        let mut events = f.manager.subscribe();
        let cancel = CancellationToken::new();
        let handle = f.manager.spawn(cancel.clone());

        assert_eq!(next_session(&mut events).await, Session::Anonymous);

        f.provider.push(Some(identity("u1")));
        assert_eq!(next_session(&mut events).await, Session::Authenticated(identity("u1")));
        assert!(f.store.is_read("scripture-0"));

        f.provider.push(None);
        assert_eq!(next_session(&mut events).await, Session::Anonymous);
        assert!(f.store.read_ids().is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn unsupported_provider_is_coming_soon() {
        let f = fixture();
        let outcome = f.manager.sign_in("github", &credentials()).await;
        assert_eq!(
            outcome,
            SignInOutcome::ComingSoon("Github login coming soon! Please use Email for now.".to_string())
        );
    }

    #[tokio::test]
    async fn sign_in_failures_map_to_notices() {
        let f = fixture();
        for (error, notice) in [
            (AuthError::PopupClosedByUser, "Sign in cancelled"),
            (AuthError::NetworkRequestFailed, "Network error. Please check your connection."),
            (AuthError::Other("bad password".to_string()), "Sign in failed. Please try again."),
        ] {
            *f.provider.sign_in_result.lock().unwrap() = Err(error);
            let outcome = f.manager.sign_in("email", &credentials()).await;
            assert_eq!(outcome.notice(), notice);
        }
        assert_eq!(f.manager.session(), Session::Anonymous);
    }

    #[tokio::test]
    async fn successful_sign_in_reports_the_provider() {
        let f = fixture();
        *f.provider.sign_in_result.lock().unwrap() = Ok(identity("u1"));
        let outcome = f.manager.sign_in("email", &credentials()).await;
        assert_eq!(outcome.notice(), "Successfully signed in with Email!");
    }

    #[tokio::test]
    async fn sign_out_flushes_before_signing_out() {
        let f = fixture();
        f.manager.handle_identity_change(Some(identity("u1"))).await;
        f.store.toggle("scripture-2").await;
        f.local.remove("scriptures_u1").unwrap();

        assert_eq!(f.manager.sign_out().await, Ok("Successfully signed out!"));
        assert_eq!(
            f.local.get("scriptures_u1").unwrap().as_deref(),
            Some(r#"["scripture-2"]"#)
        );
        assert_eq!(f.provider.current(), None);
    }

    #[tokio::test]
    async fn failed_sign_out_is_reported() {
        let f = fixture();
        f.provider.sign_out_fails.store(true, Ordering::SeqCst);
        assert_eq!(
            f.manager.sign_out().await,
            Err("Error signing out. Please try again.")
        );
    }
}
