//! Shared server state

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::config::Config;
use crate::gateway::GatewayClient;
use crate::notify::{EventBus, Notifier};
use crate::orders::{OrderService, Storage};
use crate::utils::{AppError, AppResult};

/// Everything handlers need, cheap to clone
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub storage: Storage,
    pub bus: EventBus,
    pub orders: OrderService,
    pub gateway: GatewayClient,
    pub jwt: JwtService,
}

impl ServerState {
    /// Initialize state against the on-disk database in `work_dir`.
    pub fn initialize(config: Config) -> AppResult<Self> {
        let path = std::path::Path::new(&config.work_dir).join("marketplace.redb");
        let storage = Storage::open(path).map_err(|e| AppError::database(e.to_string()))?;
        Ok(Self::with_storage(config, storage))
    }

    /// Initialize state against an in-memory database (tests).
    pub fn in_memory(config: Config) -> AppResult<Self> {
        let storage = Storage::open_in_memory().map_err(|e| AppError::database(e.to_string()))?;
        Ok(Self::with_storage(config, storage))
    }

    fn with_storage(config: Config, storage: Storage) -> Self {
        let bus = EventBus::new();
        let notifier = Notifier::new(&config, bus.clone());
        let gateway = GatewayClient::new(&config);
        let jwt = JwtService::new(&config.jwt_secret);
        let orders = OrderService::new(
            storage.clone(),
            config.clone(),
            notifier,
            gateway.clone(),
        );
        Self {
            config: Arc::new(config),
            storage,
            bus,
            orders,
            gateway,
            jwt,
        }
    }
}
