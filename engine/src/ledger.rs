//! # Collaborator Ledgers
//!
//! The engine never owns balances or asset ownership. It asks two external
//! ledgers to move things and trusts each individual call to be atomic:
//!
//! - [`AssetLedger`]: who owns which unique item.
//! - [`PaymentLedger`]: native-currency balances.
//!
//! The in-memory implementations below back the node's devnet mode and the
//! test suite. Each keeps a transfer journal so callers can assert on what
//! actually moved, and supports freezing an account to simulate a
//! collaborator fault.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AssetRef, Principal};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by a collaborator ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The `from` side of an asset transfer does not own the asset.
    #[error("{claimed} does not own {asset}")]
    NotOwner { asset: String, claimed: Principal },

    /// The asset was never minted.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("insufficient funds: {account} has {balance}, needs {required}")]
    InsufficientFunds {
        account: Principal,
        balance: u64,
        required: u64,
    },

    /// The account is frozen and can neither send nor receive.
    #[error("account frozen: {0}")]
    Frozen(Principal),

    /// The collaborator did not answer in time.
    #[error("ledger call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("balance overflow for {0}")]
    Overflow(Principal),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Ownership ledger for unique assets.
pub trait AssetLedger: Send + Sync {
    fn transfer_ownership(
        &self,
        asset: &AssetRef,
        from: &str,
        to: &str,
    ) -> Result<(), LedgerError>;
}

/// Native-currency ledger.
pub trait PaymentLedger: Send + Sync {
    fn move_funds(&self, from: &str, to: &str, amount: u64) -> Result<(), LedgerError>;
}

// ---------------------------------------------------------------------------
// Journal entries
// ---------------------------------------------------------------------------

/// One completed asset transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub asset: AssetRef,
    pub from: Principal,
    pub to: Principal,
}

/// One completed fund movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundTransfer {
    pub from: Principal,
    pub to: Principal,
    pub amount: u64,
}

// ---------------------------------------------------------------------------
// In-memory asset ledger
// ---------------------------------------------------------------------------

/// Asset ownership table keyed by [`AssetRef`].
#[derive(Debug, Default)]
pub struct InMemoryAssetLedger {
    owners: DashMap<AssetRef, Principal>,
    frozen: Mutex<HashSet<Principal>>,
    journal: Mutex<Vec<AssetTransfer>>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or overwrites) the owner of `asset`.
    pub fn mint(&self, asset: AssetRef, owner: impl Into<Principal>) {
        self.owners.insert(asset, owner.into());
    }

    pub fn owner_of(&self, asset: &AssetRef) -> Option<Principal> {
        self.owners.get(asset).map(|owner| owner.clone())
    }

    pub fn freeze(&self, account: impl Into<Principal>) {
        self.frozen.lock().insert(account.into());
    }

    pub fn unfreeze(&self, account: &str) {
        self.frozen.lock().remove(account);
    }

    /// Every successful transfer, oldest first.
    pub fn transfers(&self) -> Vec<AssetTransfer> {
        self.journal.lock().clone()
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn transfer_ownership(
        &self,
        asset: &AssetRef,
        from: &str,
        to: &str,
    ) -> Result<(), LedgerError> {
        {
            let frozen = self.frozen.lock();
            for account in [from, to] {
                if frozen.contains(account) {
                    return Err(LedgerError::Frozen(account.to_string()));
                }
            }
        }

        let mut owner = self
            .owners
            .get_mut(asset)
            .ok_or_else(|| LedgerError::UnknownAsset(asset.to_string()))?;
        if owner.as_str() != from {
            return Err(LedgerError::NotOwner {
                asset: asset.to_string(),
                claimed: from.to_string(),
            });
        }
        *owner = to.to_string();
        drop(owner);

        self.journal.lock().push(AssetTransfer {
            asset: asset.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory payment ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<Principal, u64>,
    frozen: HashSet<Principal>,
    /// Accounts that can receive but not send.
    debit_blocked: HashSet<Principal>,
    /// Remaining incoming moves each account will refuse.
    credit_faults: HashMap<Principal, u32>,
    journal: Vec<FundTransfer>,
}

/// Balance table. A single mutex makes each `move_funds` call atomic
/// across both accounts.
#[derive(Debug, Default)]
pub struct InMemoryPaymentLedger {
    book: Mutex<Book>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `account` out of thin air (faucet / genesis).
    pub fn credit(&self, account: impl Into<Principal>, amount: u64) -> Result<u64, LedgerError> {
        let account = account.into();
        let mut book = self.book.lock();
        let balance = book.balances.entry(account.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        Ok(*balance)
    }

    pub fn balance_of(&self, account: &str) -> u64 {
        self.book.lock().balances.get(account).copied().unwrap_or(0)
    }

    pub fn freeze(&self, account: impl Into<Principal>) {
        self.book.lock().frozen.insert(account.into());
    }

    pub fn unfreeze(&self, account: &str) {
        self.book.lock().frozen.remove(account);
    }

    /// Refuses every move out of `account`. Incoming moves still land.
    pub fn block_debits(&self, account: impl Into<Principal>) {
        self.book.lock().debit_blocked.insert(account.into());
    }

    /// Refuses the next `count` moves into `account`.
    pub fn fail_next_credits(&self, account: impl Into<Principal>, count: u32) {
        self.book.lock().credit_faults.insert(account.into(), count);
    }

    /// Every successful movement, oldest first.
    pub fn transfers(&self) -> Vec<FundTransfer> {
        self.book.lock().journal.clone()
    }
}

impl PaymentLedger for InMemoryPaymentLedger {
    fn move_funds(&self, from: &str, to: &str, amount: u64) -> Result<(), LedgerError> {
        let mut book = self.book.lock();
        for account in [from, to] {
            if book.frozen.contains(account) {
                return Err(LedgerError::Frozen(account.to_string()));
            }
        }
        if book.debit_blocked.contains(from) {
            return Err(LedgerError::Frozen(from.to_string()));
        }
        if let Some(remaining) = book.credit_faults.get_mut(to) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LedgerError::Unavailable(to.to_string()));
            }
        }

        let from_balance = book.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from.to_string(),
                balance: from_balance,
                required: amount,
            });
        }
        if from != to {
            let to_balance = book.balances.get(to).copied().unwrap_or(0);
            let credited = to_balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Overflow(to.to_string()))?;
            book.balances.insert(from.to_string(), from_balance - amount);
            book.balances.insert(to.to_string(), credited);
        }

        book.journal.push(FundTransfer {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }
}
