//! redb-based storage for orders, wallets, and profiles
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order aggregates |
//! | `order_refs` | `payment_reference` | `order_id` | Webhook lookup index |
//! | `order_counters` | `store_id` | `u64` | Per-store order numbering |
//! | `runner_wallets` | `runner_id` | `RunnerWallet` | Runner earnings ledgers |
//! | `store_wallets` | `store_id` | `StoreWallet` | Vendor receivable ledgers |
//! | `transfers` | `transfer_id` | `Transfer` | Payout audit rows |
//! | `stores` | `store_id` | `StoreProfile` | Vendor profiles |
//! | `runners` | `runner_id` | `RunnerProfile` | Runner profiles |
//! | `discounts` | `store_id:code` | `Discount` | Discount codes |
//!
//! # Concurrency
//!
//! redb allows one write transaction at a time. Every order mutation runs
//! inside a single write transaction that re-reads the aggregate, applies
//! the transition, and saves it together with any wallet updates. Two
//! racing mutations therefore serialize, and the loser observes the
//! winner's state.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::order::{Order, OrderStatus};
use shared::profile::{Discount, RunnerProfile, StoreProfile};
use shared::wallet::{RunnerWallet, StoreWallet, Transfer};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const ORDER_REFS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_refs");
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("order_counters");
const RUNNER_WALLETS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("runner_wallets");
const STORE_WALLETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("store_wallets");
const TRANSFERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("transfers");
const STORES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stores");
const RUNNERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("runners");
const DISCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("discounts");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Marketplace storage backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create the database at the given path.
    ///
    /// redb commits with `Durability::Immediate`, so a commit that returns
    /// is persistent and the file stays consistent across crashes.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_REFS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
            let _ = write_txn.open_table(RUNNER_WALLETS_TABLE)?;
            let _ = write_txn.open_table(STORE_WALLETS_TABLE)?;
            let _ = write_txn.open_table(TRANSFERS_TABLE)?;
            let _ = write_txn.open_table(STORES_TABLE)?;
            let _ = write_txn.open_table(RUNNERS_TABLE)?;
            let _ = write_txn.open_table(DISCOUNTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction. One mutation per transaction.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Orders ==========

    /// Load an order within a write transaction
    pub fn load_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Order> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let order = match table.get(order_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(StorageError::OrderNotFound(order_id.to_string())),
        };
        Ok(order)
    }

    /// Save an order within a write transaction
    pub fn save_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let value = serde_json::to_vec(order)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Index an order under its payment reference (webhook lookup)
    pub fn index_reference_txn(
        &self,
        txn: &WriteTransaction,
        reference: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_REFS_TABLE)?;
        table.insert(reference, order_id)?;
        Ok(())
    }

    /// Get an order by id (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve an order id through the payment reference index
    pub fn order_id_by_reference(&self, reference: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_REFS_TABLE)?;
        Ok(table.get(reference)?.map(|g| g.value().to_string()))
    }

    /// All orders, newest first, paginated
    pub fn all_orders(&self, limit: usize, offset: usize) -> StorageResult<Vec<Order>> {
        let orders = self.scan_orders(|_| true)?;
        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    /// All orders for a store, newest first
    pub fn orders_by_store(&self, store_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.store_id == store_id)
    }

    /// Pending, runner-less delivery orders: the runner marketplace feed
    pub fn incoming_orders(&self) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| {
            o.status == OrderStatus::Pending
                && matches!(o.delivery, shared::order::Delivery::Unassigned)
        })
    }

    /// Non-terminal orders assigned to the given runner
    pub fn orders_for_runner(&self, runner_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.runner_id() == Some(runner_id))
    }

    /// Order history for a customer account, newest first. Guest
    /// checkouts carry no account id and never match.
    pub fn orders_for_customer(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.customer_user_id.as_deref() == Some(user_id))
    }

    fn scan_orders(&self, pred: impl Fn(&Order) -> bool) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let order: Order = serde_json::from_slice(value.value())?;
            if pred(&order) {
                orders.push(order);
            }
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Increment and return the store's order counter (within transaction)
    pub fn next_order_number_txn(
        &self,
        txn: &WriteTransaction,
        store_id: &str,
    ) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(store_id)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(store_id, next)?;
        Ok(next)
    }

    // ========== Wallets ==========

    /// Load a runner wallet, creating an empty one on first touch
    pub fn load_runner_wallet_txn(
        &self,
        txn: &WriteTransaction,
        runner_id: &str,
    ) -> StorageResult<RunnerWallet> {
        let table = txn.open_table(RUNNER_WALLETS_TABLE)?;
        let wallet = match table.get(runner_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => RunnerWallet::empty(runner_id),
        };
        Ok(wallet)
    }

    pub fn save_runner_wallet_txn(
        &self,
        txn: &WriteTransaction,
        wallet: &RunnerWallet,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(wallet)?;
        let mut table = txn.open_table(RUNNER_WALLETS_TABLE)?;
        table.insert(wallet.runner_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_runner_wallet(&self, runner_id: &str) -> StorageResult<RunnerWallet> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RUNNER_WALLETS_TABLE)?;
        match table.get(runner_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(RunnerWallet::empty(runner_id)),
        }
    }

    /// Load a store wallet, creating an empty one on first touch
    pub fn load_store_wallet_txn(
        &self,
        txn: &WriteTransaction,
        store_id: &str,
    ) -> StorageResult<StoreWallet> {
        let table = txn.open_table(STORE_WALLETS_TABLE)?;
        let wallet = match table.get(store_id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => StoreWallet::empty(store_id),
        };
        Ok(wallet)
    }

    pub fn save_store_wallet_txn(
        &self,
        txn: &WriteTransaction,
        wallet: &StoreWallet,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(wallet)?;
        let mut table = txn.open_table(STORE_WALLETS_TABLE)?;
        table.insert(wallet.store_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_store_wallet(&self, store_id: &str) -> StorageResult<StoreWallet> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORE_WALLETS_TABLE)?;
        match table.get(store_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Ok(StoreWallet::empty(store_id)),
        }
    }

    // ========== Transfers ==========

    pub fn save_transfer_txn(
        &self,
        txn: &WriteTransaction,
        transfer: &Transfer,
    ) -> StorageResult<()> {
        let value = serde_json::to_vec(transfer)?;
        let mut table = txn.open_table(TRANSFERS_TABLE)?;
        table.insert(transfer.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn transfers_by_store(&self, store_id: &str) -> StorageResult<Vec<Transfer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRANSFERS_TABLE)?;
        let mut transfers = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let transfer: Transfer = serde_json::from_slice(value.value())?;
            if transfer.store_id == store_id {
                transfers.push(transfer);
            }
        }
        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transfers)
    }

    // ========== Profiles ==========

    pub fn get_store(&self, store_id: &str) -> StorageResult<Option<StoreProfile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STORES_TABLE)?;
        match table.get(store_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn save_store(&self, store: &StoreProfile) -> StorageResult<()> {
        let value = serde_json::to_vec(store)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(STORES_TABLE)?;
            table.insert(store.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_runner(&self, runner_id: &str) -> StorageResult<Option<RunnerProfile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RUNNERS_TABLE)?;
        match table.get(runner_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn save_runner(&self, runner: &RunnerProfile) -> StorageResult<()> {
        let value = serde_json::to_vec(runner)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(RUNNERS_TABLE)?;
            table.insert(runner.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Discounts ==========

    /// Codes are scoped per store; the table key is `store_id:code`.
    pub fn get_discount(&self, store_id: &str, code: &str) -> StorageResult<Option<Discount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DISCOUNTS_TABLE)?;
        match table.get(format!("{store_id}:{code}").as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn save_discount(&self, discount: &Discount) -> StorageResult<()> {
        let value = serde_json::to_vec(discount)?;
        let key = format!("{}:{}", discount.store_id, discount.code);
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DISCOUNTS_TABLE)?;
            table.insert(key.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn discounts_by_store(&self, store_id: &str) -> StorageResult<Vec<Discount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DISCOUNTS_TABLE)?;
        let mut discounts = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let discount: Discount = serde_json::from_slice(value.value())?;
            if discount.store_id == store_id {
                discounts.push(discount);
            }
        }
        Ok(discounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use shared::order::{CreateOrderInput, CustomerInfo, LineItemInput};

    fn sample_order(id: &str, store_id: &str) -> Order {
        let input = CreateOrderInput {
            store_id: store_id.to_string(),
            customer_user_id: None,
            customer: CustomerInfo {
                name: "Ada".into(),
                contact: "080".into(),
                address: None,
                pickup: false,
            },
            items: vec![LineItemInput {
                name: "Suya".into(),
                quantity: 1,
                unit_price: 1000.0,
                variant: None,
                add_ons: vec![],
            }],
            items_amount: 1000.0,
            delivery_fee: 0.0,
            service_fee: 0.0,
            discount_amount: 0.0,
            discount_code: None,
            payment_method: "cash".into(),
        };
        let mut order = crate::orders::aggregate::create(
            &input,
            "00001".into(),
            "1234".into(),
            format!("ref-{id}"),
            Utc::now(),
        )
        .unwrap();
        order.id = id.to_string();
        order
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let storage = Storage::open_in_memory().unwrap();
        let order = sample_order("o1", "s1");

        let txn = storage.begin_write().unwrap();
        storage.save_order_txn(&txn, &order).unwrap();
        storage
            .index_reference_txn(&txn, &order.payment_reference, &order.id)
            .unwrap();
        txn.commit().unwrap();

        let loaded = storage.get_order("o1").unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(
            storage.order_id_by_reference("ref-o1").unwrap().as_deref(),
            Some("o1")
        );
        assert!(storage.order_id_by_reference("ref-zzz").unwrap().is_none());
    }

    #[test]
    fn test_order_counter_is_per_store() {
        let storage = Storage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        assert_eq!(storage.next_order_number_txn(&txn, "s1").unwrap(), 1);
        assert_eq!(storage.next_order_number_txn(&txn, "s1").unwrap(), 2);
        assert_eq!(storage.next_order_number_txn(&txn, "s2").unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_incoming_feed_excludes_pickup_and_accepted() {
        let storage = Storage::open_in_memory().unwrap();

        let pending = sample_order("o1", "s1");
        let mut pickup = sample_order("o2", "s1");
        pickup.delivery = shared::order::Delivery::CustomerPickup;
        let mut accepted = sample_order("o3", "s1");
        accepted.status = OrderStatus::Accepted;

        let txn = storage.begin_write().unwrap();
        for order in [&pending, &pickup, &accepted] {
            storage.save_order_txn(&txn, order).unwrap();
        }
        txn.commit().unwrap();

        let feed = storage.incoming_orders().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "o1");
    }

    #[test]
    fn test_reopen_preserves_orders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketplace.redb");
        let order = sample_order("o1", "s1");
        {
            let storage = Storage::open(&path).unwrap();
            let txn = storage.begin_write().unwrap();
            storage.save_order_txn(&txn, &order).unwrap();
            txn.commit().unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get_order("o1").unwrap().unwrap(), order);
    }

    #[test]
    fn test_wallet_defaults_to_empty() {
        let storage = Storage::open_in_memory().unwrap();
        let wallet = storage.get_runner_wallet("r1").unwrap();
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.transactions.is_empty());
    }
}
