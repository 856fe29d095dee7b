//! Payment reconciliation and payouts
//!
//! Wallet credits ride inside the same write transaction as the order
//! mutation that earned them, guarded by per-order markers on the
//! aggregate:
//!
//! - `runner_credited`: flipped once, on the completion that credits the
//!   runner's earning.
//! - `store_credited_amount`: advances monotonically toward the vendor
//!   receivable as payments land; replays and double-triggers credit the
//!   difference, which is zero.
//!
//! Transfers out are the one place the ledger meets an external call. The
//! ledger is debited only after the gateway accepts the transfer; a
//! gateway failure leaves the wallet intact and records a failed audit
//! row.

use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::order::Order;
use shared::profile::StoreProfile;
use shared::wallet::{
    RunnerTransaction, RunnerTxnKind, RunnerWallet, StoreTransaction, StoreTxnKind, Transfer,
    TransferStatus,
};
use tracing::{info, warn};

use crate::gateway::GatewayClient;
use crate::orders::money::round_money;
use crate::orders::{Storage, StorageResult};
use crate::utils::{AppError, AppResult};

/// Flat fee charged on a transfer-out, tiered by amount
pub fn transfer_fee(amount: Decimal) -> Decimal {
    if amount <= Decimal::from(5_000) {
        Decimal::from(10)
    } else if amount <= Decimal::from(50_000) {
        Decimal::from(25)
    } else {
        Decimal::from(50)
    }
}

/// Vendor receivable for an order, capped at what has actually been paid
/// so a partial payment never over-credits the vendor.
pub fn vendor_receivable(order: &Order) -> Decimal {
    let receivable = round_money(
        order.amounts.items_amount + order.amounts.delivery_fee - order.amounts.discount_amount,
    );
    receivable.min(order.amounts.amount_paid).max(Decimal::ZERO)
}

/// Credit the runner's delivery earning, at most once per order.
///
/// Returns the credited amount, or `None` when the order has no runner or
/// was already credited. Mutates the order's marker; the caller saves the
/// order in the same transaction.
pub fn credit_runner_txn(
    storage: &Storage,
    txn: &WriteTransaction,
    order: &mut Order,
    now: DateTime<Utc>,
) -> StorageResult<Option<Decimal>> {
    if order.runner_credited {
        return Ok(None);
    }
    let (Some(runner_id), Some(price)) = (order.runner_id(), order.delivery_price()) else {
        return Ok(None);
    };
    let runner_id = runner_id.to_string();

    let mut wallet = storage.load_runner_wallet_txn(txn, &runner_id)?;
    wallet.transactions.push(RunnerTransaction {
        kind: RunnerTxnKind::Earning,
        amount: price,
        timestamp: now,
        order_id: Some(order.id.clone()),
        note: None,
    });
    wallet.balance = round_money(wallet.balance + price);
    storage.save_runner_wallet_txn(txn, &wallet)?;

    order.runner_credited = true;
    info!(order_id = %order.id, runner_id = %runner_id, amount = %price, "Runner credited");
    Ok(Some(price))
}

/// Advance the store wallet toward the vendor receivable.
///
/// Credits only the portion not yet credited, so the two triggers
/// (payment application and order completion) can both fire without
/// double-paying. Returns the delta credited, `None` when nothing was
/// owed. Mutates the order's marker; the caller saves the order in the
/// same transaction.
pub fn credit_store_txn(
    storage: &Storage,
    txn: &WriteTransaction,
    order: &mut Order,
    now: DateTime<Utc>,
) -> StorageResult<Option<Decimal>> {
    let target = vendor_receivable(order);
    let delta = round_money(target - order.store_credited_amount);
    if delta <= Decimal::ZERO {
        return Ok(None);
    }

    let mut wallet = storage.load_store_wallet_txn(txn, &order.store_id)?;
    wallet.transactions.push(StoreTransaction {
        kind: StoreTxnKind::Credit,
        amount: delta,
        reference: order.id.clone(),
        description: Some(format!("Order #{}", order.order_number)),
        timestamp: now,
    });
    wallet.balance = round_money(wallet.balance + delta);
    storage.save_store_wallet_txn(txn, &wallet)?;

    order.store_credited_amount = target;
    info!(order_id = %order.id, store_id = %order.store_id, amount = %delta, "Store credited");
    Ok(Some(delta))
}

/// Withdraw earnings from a runner wallet. Runners cash out directly,
/// so the debit is recorded in the ledger without a gateway leg. The
/// balance must cover the full amount.
pub fn withdraw_runner(
    storage: &Storage,
    runner_id: &str,
    amount: Decimal,
    note: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<RunnerWallet> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("withdrawal amount must be positive"));
    }

    let txn = storage
        .begin_write()
        .map_err(|e| AppError::database(e.to_string()))?;
    let wallet = {
        let mut wallet = storage
            .load_runner_wallet_txn(&txn, runner_id)
            .map_err(|e| AppError::database(e.to_string()))?;
        if wallet.balance < amount {
            return Err(AppError::InvalidOperation(format!(
                "insufficient balance: {} < {}",
                wallet.balance, amount
            )));
        }
        wallet.transactions.push(RunnerTransaction {
            kind: RunnerTxnKind::Withdrawal,
            amount,
            timestamp: now,
            order_id: None,
            note,
        });
        wallet.balance = round_money(wallet.balance - amount);
        storage
            .save_runner_wallet_txn(&txn, &wallet)
            .map_err(|e| AppError::database(e.to_string()))?;
        wallet
    };
    txn.commit().map_err(|e| AppError::database(e.to_string()))?;

    info!(runner_id = %runner_id, amount = %amount, "Runner withdrawal recorded");
    Ok(wallet)
}

/// Transfer funds out of a store wallet through the gateway.
///
/// Balance must cover the amount plus the tiered fee. The check runs
/// before the gateway call and again inside the debit transaction, since
/// a concurrent transfer may have drained the wallet in between. An audit
/// row is persisted for every attempt, failed ones included.
pub async fn process_transfer(
    storage: &Storage,
    gateway: &GatewayClient,
    store: &StoreProfile,
    amount: Decimal,
    now: DateTime<Utc>,
) -> AppResult<Transfer> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("transfer amount must be positive"));
    }
    let Some(account) = &store.payout_account else {
        return Err(AppError::validation(format!(
            "store {} has no payout account",
            store.id
        )));
    };

    let fee = transfer_fee(amount);
    let required = round_money(amount + fee);

    let wallet = storage
        .get_store_wallet(&store.id)
        .map_err(|e| AppError::database(e.to_string()))?;
    if wallet.balance < required {
        record_transfer(storage, store, amount, fee, TransferStatus::Failed, None, now)?;
        return Err(AppError::InvalidOperation(format!(
            "insufficient balance: {} < {}",
            wallet.balance, required
        )));
    }

    let recipient_code = gateway.create_recipient(account).await;
    let reference = match recipient_code {
        Ok(code) => {
            gateway
                .initiate_transfer(&code, amount, &format!("Payout to {}", store.name))
                .await
        }
        Err(e) => Err(e),
    };

    let reference = match reference {
        Ok(reference) => reference,
        Err(e) => {
            warn!(store_id = %store.id, error = %e, "Transfer rejected by gateway");
            record_transfer(storage, store, amount, fee, TransferStatus::Failed, None, now)?;
            return Err(e);
        }
    };

    // Debit only now that the gateway has accepted. Balance is re-checked
    // under the write lock in case a concurrent transfer landed first.
    let txn = storage
        .begin_write()
        .map_err(|e| AppError::database(e.to_string()))?;
    let transfer = {
        let mut wallet = storage
            .load_store_wallet_txn(&txn, &store.id)
            .map_err(|e| AppError::database(e.to_string()))?;
        if wallet.balance < required {
            drop(txn);
            record_transfer(storage, store, amount, fee, TransferStatus::Failed, None, now)?;
            return Err(AppError::InvalidOperation(format!(
                "balance changed during transfer: {} < {}",
                wallet.balance, required
            )));
        }
        wallet.transactions.push(StoreTransaction {
            kind: StoreTxnKind::Debit,
            amount: required,
            reference: reference.clone(),
            description: Some("Transfer out".into()),
            timestamp: now,
        });
        wallet.balance = round_money(wallet.balance - required);
        storage
            .save_store_wallet_txn(&txn, &wallet)
            .map_err(|e| AppError::database(e.to_string()))?;

        let transfer = Transfer {
            id: uuid::Uuid::new_v4().simple().to_string(),
            store_id: store.id.clone(),
            amount,
            transfer_fee: fee,
            status: TransferStatus::Success,
            transfer_reference: Some(reference),
            created_at: now,
        };
        storage
            .save_transfer_txn(&txn, &transfer)
            .map_err(|e| AppError::database(e.to_string()))?;
        transfer
    };
    txn.commit().map_err(|e| AppError::database(e.to_string()))?;

    info!(store_id = %store.id, amount = %amount, fee = %fee, "Transfer completed");
    Ok(transfer)
}

fn record_transfer(
    storage: &Storage,
    store: &StoreProfile,
    amount: Decimal,
    fee: Decimal,
    status: TransferStatus,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let transfer = Transfer {
        id: uuid::Uuid::new_v4().simple().to_string(),
        store_id: store.id.clone(),
        amount,
        transfer_fee: fee,
        status,
        transfer_reference: reference,
        created_at: now,
    };
    let txn = storage
        .begin_write()
        .map_err(|e| AppError::database(e.to_string()))?;
    storage
        .save_transfer_txn(&txn, &transfer)
        .map_err(|e| AppError::database(e.to_string()))?;
    txn.commit().map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}
