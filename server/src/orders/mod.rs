//! Order domain: money primitives, the aggregate state machine, redb
//! persistence, and the orchestration service.

pub mod aggregate;
pub mod money;
pub mod service;
pub mod storage;

pub use aggregate::{OrderError, OrderResult};
pub use service::OrderService;
pub use storage::{Storage, StorageError, StorageResult};
