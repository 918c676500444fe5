//! In-memory implementations of the ports for unit tests. Other crates enable them with
//! the `test-support` feature.

use crate::domain::{Credentials, Identity, UserDocument};
use crate::ports::{
    AuthError, IdentityProvider, LocalStore, PortError, PortResult, RemoteDocumentStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A remote store whose reads and writes can be switched off independently.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, UserDocument>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn set_available(&self, available: bool) {
        self.fail_reads.store(!available, Ordering::SeqCst);
        self.fail_writes.store(!available, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn document(&self, uid: &str) -> Option<UserDocument> {
        self.documents.lock().unwrap().get(uid).cloned()
    }

    pub fn insert(&self, uid: &str, read: &[&str]) {
        let document = UserDocument {
            read_scriptures: read.iter().map(|s| s.to_string()).collect(),
            last_updated: Some(Utc::now()),
            ..Default::default()
        };
        self.documents
            .lock()
            .unwrap()
            .insert(uid.to_string(), document);
    }

    fn check(&self, flag: &AtomicBool) -> PortResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryDocumentStore {
    async fn get(&self, uid: &str) -> PortResult<Option<UserDocument>> {
        self.check(&self.fail_reads)?;
        Ok(self.document(uid))
    }

    async fn set(&self, uid: &str, mut document: UserDocument) -> PortResult<()> {
        self.check(&self.fail_writes)?;
        document.last_updated = Some(Utc::now());
        self.documents
            .lock()
            .unwrap()
            .insert(uid.to_string(), document);
        Ok(())
    }

    async fn update_read_scriptures(
        &self,
        uid: &str,
        read_scriptures: Vec<String>,
    ) -> PortResult<()> {
        self.check(&self.fail_writes)?;
        let mut documents = self.documents.lock().unwrap();
        let document = documents
            .get_mut(uid)
            .ok_or_else(|| PortError::NotFound(uid.to_string()))?;
        document.read_scriptures = read_scriptures;
        document.last_updated = Some(Utc::now());
        Ok(())
    }
}

/// An identity provider driven directly by the test.
pub struct FakeIdentityProvider {
    current: Mutex<Option<Identity>>,
    tx: broadcast::Sender<Option<Identity>>,
    pub sign_in_result: Mutex<Result<Identity, AuthError>>,
    pub sign_out_fails: AtomicBool,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            current: Mutex::new(None),
            tx,
            sign_in_result: Mutex::new(Err(AuthError::PopupClosedByUser)),
            sign_out_fails: AtomicBool::new(false),
        }
    }

    /// Publishes an identity change as the provider's callback would.
    pub fn push(&self, identity: Option<Identity>) {
        *self.current.lock().unwrap() = identity.clone();
        let _ = self.tx.send(identity);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn name(&self) -> &str {
        "email"
    }

    fn current(&self) -> Option<Identity> {
        self.current.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<Identity, AuthError> {
        let result = self.sign_in_result.lock().unwrap().clone();
        if let Ok(identity) = &result {
            self.push(Some(identity.clone()));
        }
        result
    }

    async fn sign_out(&self) -> PortResult<()> {
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("sign-out failed".to_string()));
        }
        self.push(None);
        Ok(())
    }
}

pub fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(format!("{uid}@example.com")),
        display_name: None,
    }
}
