pub mod connection;
pub mod local_store;
pub mod outbox;
pub mod rows;

pub use connection::{Database, DbPool};
pub use local_store::SqliteLocalStore;
pub use outbox::SqliteOutbox;
