//! Wallet ledgers and transfer audit records
//!
//! Both wallets are append-only ledgers plus a derived balance. The balance
//! is stored for cheap reads but is always equal to the ledger sum; the
//! server recomputes and asserts this in tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runner wallet transaction kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerTxnKind {
    Earning,
    Withdrawal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerTransaction {
    pub kind: RunnerTxnKind,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Order that produced this earning, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runner wallet: balance == sum(earnings) - sum(withdrawals)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerWallet {
    pub runner_id: String,
    pub balance: Decimal,
    pub transactions: Vec<RunnerTransaction>,
}

impl RunnerWallet {
    pub fn empty(runner_id: impl Into<String>) -> Self {
        Self {
            runner_id: runner_id.into(),
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }
}

/// Store wallet transaction kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreTxnKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreTransaction {
    pub kind: StoreTxnKind,
    pub amount: Decimal,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Store wallet: never debited below zero
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreWallet {
    pub store_id: String,
    pub balance: Decimal,
    pub transactions: Vec<StoreTransaction>,
}

impl StoreWallet {
    pub fn empty(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Vendor payout audit record, written for every attempt, success or not
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transfer {
    pub id: String,
    pub store_id: String,
    /// Amount the vendor receives
    pub amount: Decimal,
    /// Fee deducted from the wallet on top of `amount`
    pub transfer_fee: Decimal,
    pub status: TransferStatus,
    /// Gateway transfer reference, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}
