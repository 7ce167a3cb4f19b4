pub mod queue_entry;
pub mod record;

pub use queue_entry::{QueueEntry, QueueEntryDraft};
pub use record::{Record, RecordDraft};
