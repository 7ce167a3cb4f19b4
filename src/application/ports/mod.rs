pub mod clock;
pub mod local_store;
pub mod outbox;
pub mod remote_store;

pub use clock::{Clock, SystemClock};
pub use local_store::{ListOptions, LocalStore, OrderBy, RecordFilter};
pub use outbox::{QueueCounts, SyncOutbox};
pub use remote_store::{RemoteFilter, RemoteStore};
