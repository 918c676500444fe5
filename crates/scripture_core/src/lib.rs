pub mod canon;
pub mod domain;
pub mod links;
pub mod ports;
pub mod progress;
pub mod read_state;
pub mod reference;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use canon::{CanonIndex, DropReason, DroppedRecord};
pub use domain::{
    CoreEvent, Credentials, Division, Identity, Partition, RawRecord, ScriptureRecord, Session,
    UserDocument,
};
pub use ports::{AuthError, IdentityProvider, LocalStore, PortError, PortResult, RemoteDocumentStore};
pub use progress::Progress;
pub use read_state::ReadStateStore;
pub use reference::{classify, parse, ParseError, ParsedReference};
pub use session::{SessionManager, SignInOutcome};
