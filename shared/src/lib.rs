//! Shared types for the marketplace order & delivery platform
//!
//! Wire/domain types used by the server and its clients:
//!
//! - **order**: the order aggregate, status enums, payment records
//! - **wallet**: runner/store ledgers and transfer audit records
//! - **profile**: store/runner profiles and discounts
//! - **message**: realtime bus messages

pub mod message;
pub mod order;
pub mod profile;
pub mod wallet;

// Re-export common types for convenience
pub use message::{BusMessage, EventKind};
pub use order::{
    Amounts, CreateOrderInput, CustomerInfo, Delivery, LineItem, Order, OrderStatus,
    PaymentInput, PaymentRecord, PaymentState, PaymentStatus,
};
pub use profile::{Discount, PayoutAccount, RunnerProfile, StoreProfile};
pub use wallet::{
    RunnerTransaction, RunnerTxnKind, RunnerWallet, StoreTransaction, StoreTxnKind, StoreWallet,
    Transfer, TransferStatus,
};
