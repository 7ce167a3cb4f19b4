pub mod http_store;
pub mod memory;

pub use http_store::HttpRemoteStore;
pub use memory::InMemoryRemoteStore;
