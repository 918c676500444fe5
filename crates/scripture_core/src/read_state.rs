//! crates/scripture_core/src/read_state.rs
//!
//! The read-state store: the set of verse ids the current user has marked as read, kept
//! in sync with the local store (always) and the remote document store (when signed in).
//!
//! Remote failures never reach the caller. They are logged and the local partition of the
//! same user takes over, so the worst outcome is progress tracked on this device only.

use crate::domain::{CoreEvent, Identity, Partition, Session, UserDocument};
use crate::ports::{LocalStore, PortResult, RemoteDocumentStore};
use crate::progress;
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Default)]
struct ReadState {
    session: Session,
    read_ids: BTreeSet<String>,
}

pub struct ReadStateStore {
    remote: Arc<dyn RemoteDocumentStore>,
    local: Arc<dyn LocalStore>,
    state: Mutex<ReadState>,
    /// Serializes persistence so writes land in the order they were issued.
    write_gate: tokio::sync::Mutex<()>,
    events: broadcast::Sender<CoreEvent>,
    today: Clock,
}

impl ReadStateStore {
    pub fn new(remote: Arc<dyn RemoteDocumentStore>, local: Arc<dyn LocalStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            remote,
            local,
            state: Mutex::new(ReadState::default()),
            write_gate: tokio::sync::Mutex::new(()),
            events,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Replaces the calendar used for the reading streak.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ReadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: CoreEvent) {
        // No subscribers is fine: nothing is rendering.
        let _ = self.events.send(event);
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn read_ids(&self) -> BTreeSet<String> {
        self.lock().read_ids.clone()
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.lock().read_ids.contains(id)
    }

    //=====================================================================================
    // Load
    //=====================================================================================

    /// Makes `session` current and replaces the read-state with what its backend holds.
    ///
    /// Signed-in users read their remote document, creating an empty one on first use; if
    /// the remote store fails, their local partition is used instead.
    pub async fn load(&self, session: Session) {
        let _gate = self.write_gate.lock().await;
        let partition = session.partition();

        let read_ids = match session.identity() {
            Some(identity) => match self.load_remote(identity).await {
                Ok(ids) => ids,
                Err(e) => {
                    error!(uid = %identity.uid, "Error loading from remote store, using local storage: {e}");
                    self.load_local(&partition)
                }
            },
            None => self.load_local(&partition),
        };

        let mut state = self.lock();
        state.session = session;
        state.read_ids = read_ids;
    }

    async fn load_remote(&self, identity: &Identity) -> PortResult<BTreeSet<String>> {
        match self.remote.get(&identity.uid).await? {
            Some(document) => {
                info!(uid = %identity.uid, "Loaded {} scriptures from remote store", document.read_scriptures.len());
                Ok(document.read_scriptures.into_iter().collect())
            }
            None => {
                self.remote
                    .set(&identity.uid, UserDocument::first_time(identity))
                    .await?;
                info!(uid = %identity.uid, "Created new remote document for user");
                Ok(BTreeSet::new())
            }
        }
    }

    fn load_local(&self, partition: &Partition) -> BTreeSet<String> {
        let key = partition.scriptures_key();
        let saved = match self.local.get(&key) {
            Ok(saved) => saved,
            Err(e) => {
                error!(%key, "Error reading local storage: {e}");
                None
            }
        };
        let Some(saved) = saved else {
            return BTreeSet::new();
        };
        match serde_json::from_str::<Vec<String>>(&saved) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(%key, "Discarding unreadable local read-state: {e}");
                BTreeSet::new()
            }
        }
    }

    //=====================================================================================
    // Toggle / Save
    //=====================================================================================

    /// Flips `id` between read and unread, then persists. Returns whether `id` is now read.
    ///
    /// The in-memory state changes before any I/O starts, so concurrent readers see the
    /// toggle immediately.
    pub async fn toggle(&self, id: &str) -> bool {
        let (read, partition, has_reads) = {
            let mut state = self.lock();
            let read = if state.read_ids.remove(id) {
                false
            } else {
                state.read_ids.insert(id.to_string());
                true
            };
            (read, state.session.partition(), !state.read_ids.is_empty())
        };
        debug!(%id, read, "Scripture toggled");
        self.publish(CoreEvent::ReadToggled {
            id: id.to_string(),
            read,
        });

        if has_reads {
            if let Err(e) = progress::record_reading(self.local.as_ref(), &partition, (self.today)()) {
                warn!("Could not update reading streak: {e}");
            }
        }

        self.save().await;
        read
    }

    /// Writes the full current read-state. Signed-in users get a remote write followed by a
    /// local backup; the local write happens whether or not the remote one succeeded.
    pub async fn save(&self) {
        let _gate = self.write_gate.lock().await;
        let (session, ids) = {
            let state = self.lock();
            (state.session.clone(), state.read_ids.iter().cloned().collect::<Vec<_>>())
        };

        if let Some(identity) = session.identity() {
            let count = ids.len();
            match self.remote.update_read_scriptures(&identity.uid, ids.clone()).await {
                Ok(()) => info!(uid = %identity.uid, "Saved {count} scriptures to remote store"),
                Err(e) => error!(uid = %identity.uid, "Error saving to remote store: {e}"),
            }
        }
        self.save_local(&session.partition(), &ids);
    }

    fn save_local(&self, partition: &Partition, ids: &[String]) {
        let key = partition.scriptures_key();
        let result = serde_json::to_string(ids)
            .map_err(|e| e.to_string())
            .and_then(|json| self.local.set(&key, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            error!(%key, "Error saving to local storage: {e}");
        }
    }

    //=====================================================================================
    // Restart / Streak
    //=====================================================================================

    /// Clears every read mark of the current user, remotely and locally. Not recoverable.
    pub async fn restart(&self) {
        let _gate = self.write_gate.lock().await;
        let session = {
            let mut state = self.lock();
            state.read_ids.clear();
            state.session.clone()
        };

        if let Some(identity) = session.identity() {
            match self.remote.update_read_scriptures(&identity.uid, Vec::new()).await {
                Ok(()) => info!(uid = %identity.uid, "Cleared remote read-state"),
                Err(e) => error!(uid = %identity.uid, "Error clearing remote read-state: {e}"),
            }
        }

        let partition = session.partition();
        for key in [
            partition.scriptures_key(),
            partition.streak_key(),
            partition.last_read_key(),
        ] {
            if let Err(e) = self.local.remove(&key) {
                error!(%key, "Error clearing local storage: {e}");
            }
        }

        self.publish(CoreEvent::Restarted);
    }

    /// Consecutive reading days for the current user.
    pub fn streak(&self) -> u32 {
        let (partition, has_reads) = {
            let state = self.lock();
            (state.session.partition(), !state.read_ids.is_empty())
        };
        progress::current_streak(self.local.as_ref(), &partition, (self.today)(), has_reads)
            .unwrap_or_else(|e| {
                warn!("Could not read reading streak: {e}");
                0
            })
    }
}
