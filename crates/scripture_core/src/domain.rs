//! crates/scripture_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage backend or transport format.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

//=========================================================================================
// Scripture Records
//=========================================================================================

/// One of the five canonical scripture groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Division {
    OldTestament,
    NewTestament,
    BookOfMormon,
    DoctrineAndCovenants,
    PearlOfGreatPrice,
}

impl Division {
    /// Every division, in display order.
    pub const ALL: [Division; 5] = [
        Division::OldTestament,
        Division::NewTestament,
        Division::BookOfMormon,
        Division::DoctrineAndCovenants,
        Division::PearlOfGreatPrice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Division::OldTestament => "Old Testament",
            Division::NewTestament => "New Testament",
            Division::BookOfMormon => "Book of Mormon",
            Division::DoctrineAndCovenants => "Doctrine and Covenants",
            Division::PearlOfGreatPrice => "Pearl of Great Price",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw `{reference, text}` pair as supplied at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    pub reference: String,
    pub text: String,
}

impl RawRecord {
    pub fn new(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: text.into(),
        }
    }
}

/// A classified verse. Immutable once built by the canon index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptureRecord {
    /// The raw reference string, verbatim.
    pub reference: String,
    pub book: String,
    pub chapter: u32,
    /// A single verse or a range such as `3–5`.
    pub verse: String,
    pub text: String,
    /// `scripture-<index>` where index is the position in the raw input.
    pub id: String,
}

//=========================================================================================
// Identity and Session
//=========================================================================================

/// An authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// The name shown next to the avatar: display name, else the email's local part.
    pub fn display_label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match self.email.as_deref() {
            Some(email) => email.split('@').next().unwrap_or(email).to_string(),
            None => "U".to_string(),
        }
    }

    /// Uppercased first character of the display name or email.
    pub fn initial(&self) -> char {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .and_then(|s| s.chars().next())
            .unwrap_or('U')
            .to_uppercase()
            .next()
            .unwrap_or('U')
    }
}

/// The current user context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl Session {
    pub fn from_identity(identity: Option<Identity>) -> Self {
        identity.map_or(Session::Anonymous, Session::Authenticated)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(identity) => Some(identity),
        }
    }

    /// The storage partition separating this user's local data from others'.
    pub fn partition(&self) -> Partition {
        match self {
            Session::Anonymous => Partition::anonymous(),
            Session::Authenticated(identity) => Partition(identity.uid.clone()),
        }
    }
}

/// Storage-key suffix: `anonymous` or an authenticated uid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition(pub String);

impl Partition {
    pub fn anonymous() -> Self {
        Partition("anonymous".to_string())
    }

    pub fn scriptures_key(&self) -> String {
        format!("scriptures_{}", self.0)
    }

    pub fn streak_key(&self) -> String {
        format!("streak_{}", self.0)
    }

    pub fn last_read_key(&self) -> String {
        format!("lastRead_{}", self.0)
    }
}

//=========================================================================================
// Remote Document
//=========================================================================================

/// The per-user document held by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserDocument {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub read_scriptures: Vec<String>,
    /// Assigned by the store on every write; ignored on input.
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserDocument {
    /// The empty document created on a user's first sign-in.
    pub fn first_time(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            read_scriptures: Vec::new(),
            last_updated: None,
        }
    }
}

//=========================================================================================
// Presentation Events
//=========================================================================================

/// Change notifications for the presentation layer, which re-renders the affected parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    SessionChanged(Session),
    ReadToggled { id: String, read: bool },
    Restarted,
}

/// Credentials collected by the presentation layer for a sign-in attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
