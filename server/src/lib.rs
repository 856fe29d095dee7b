//! Marketplace order orchestration server
//!
//! Coordinates the order lifecycle for a vendor marketplace: checkout,
//! vendor acceptance, runner delivery assignment, delivery-code
//! completion, payment reconciliation (manual and gateway webhook),
//! wallet ledgers, and vendor payouts.
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/        # config, state, HTTP lifecycle
//! ├── auth/        # principal tokens + extractor
//! ├── orders/      # money, aggregate, storage, service
//! ├── assignment/  # runner delivery pricing
//! ├── reconcile/   # wallet credits, payouts
//! ├── gateway/     # payment gateway client + webhook crypto
//! ├── notify/      # bus, push, messaging fan-out
//! ├── api/         # HTTP routes and handlers
//! └── utils/       # errors, logging
//! ```

pub mod api;
pub mod assignment;
pub mod auth;
pub mod core;
pub mod gateway;
pub mod notify;
pub mod orders;
pub mod reconcile;
pub mod utils;

pub use auth::{JwtService, Principal, Role};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderService, Storage};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResponse, AppResult};

/// Load `.env`, ensure the working directory exists, and start logging.
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/marketplace".into());
    std::fs::create_dir_all(&work_dir)?;

    let log_dir = format!("{work_dir}/logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_level = std::env::var("LOG_LEVEL").ok();
    init_logger_with_file(log_level.as_deref(), Some(&log_dir));

    Ok(())
}
