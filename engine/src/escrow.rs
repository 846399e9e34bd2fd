//! # Escrow Ledger
//!
//! Pure bookkeeping of funds the engine holds on a bidder's behalf, keyed by
//! `(auction, bidder)`. The funds themselves sit with the custody principal
//! on the payment ledger; this table records whose they are.
//!
//! For an active auction the entries sum to the current highest bid (only
//! the highest bidder has a non-zero entry). Once the auction is ended or
//! cancelled they sum to zero.
//!
//! Entries are removed on release rather than zeroed, so a concurrent
//! reader can never observe a stale non-zero amount after the release
//! returned: `DashMap::remove` takes the shard write lock.

use dashmap::DashMap;

use crate::error::AuctionError;
use crate::types::{AuctionId, Principal};

/// Per-auction map of bidder → held amount.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    entries: DashMap<(AuctionId, Principal), u64>,
}

impl EscrowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `amount` as held for `bidder`, on top of anything already
    /// held. Call only after the funds have reached custody.
    pub fn hold(&self, auction: AuctionId, bidder: &str, amount: u64) -> Result<u64, AuctionError> {
        let mut entry = self
            .entries
            .entry((auction, bidder.to_string()))
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(AuctionError::AmountOverflow)?;
        Ok(*entry)
    }

    /// Clears the entry and returns what it held (0 if there was none).
    pub fn release(&self, auction: AuctionId, bidder: &str) -> u64 {
        self.entries
            .remove(&(auction, bidder.to_string()))
            .map(|(_, amount)| amount)
            .unwrap_or(0)
    }

    /// Held amount, 0 if absent.
    pub fn balance_of(&self, auction: AuctionId, bidder: &str) -> u64 {
        self.entries
            .get(&(auction, bidder.to_string()))
            .map(|amount| *amount)
            .unwrap_or(0)
    }

    /// Sum of everything held for `auction`.
    pub fn total_held(&self, auction: AuctionId) -> u64 {
        self.entries
            .iter()
            .filter(|entry| entry.key().0 == auction)
            .map(|entry| *entry.value())
            .sum()
    }

    /// Sum across all auctions; equals the custody account's escrow float.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|entry| *entry.value()).sum()
    }
}
