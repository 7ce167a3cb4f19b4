pub mod operation;
pub mod payload;
pub mod queue_status;
pub mod record_id;
pub mod table;

pub use operation::Operation;
pub use payload::RecordPayload;
pub use queue_status::QueueStatus;
pub use record_id::RecordId;
pub use table::{ColumnDef, ColumnKind, Table, TableSchema};
