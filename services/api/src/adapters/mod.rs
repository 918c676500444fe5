pub mod identity_pg;
pub mod local_file;
pub mod raw_input;
pub mod remote_pg;

pub use identity_pg::PgIdentityProvider;
pub use local_file::FileLocalStore;
pub use raw_input::load_raw_records;
pub use remote_pg::{run_migrations, PgDocumentStore};
