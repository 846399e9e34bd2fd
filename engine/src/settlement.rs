//! # Settlement Engine
//!
//! Runs exactly once per auction, inside `end`: the winning bid is split
//! between the royalty recipient and the seller, paid out of custody, and
//! then the asset is released to the winner.
//!
//! ## Split
//!
//! `royalty = floor(amount * royalty_bps / 10_000)` in `u128`, and the seller
//! gets `amount - royalty`. The seller's share is never rounded on its own,
//! so the two parts always add back up to the winning bid.
//!
//! ## All or nothing
//!
//! Each completed payout is journaled. If a later step fails (the seller
//! payment, or the asset release) the journal is unwound in reverse order
//! and the error is returned. The caller has not touched the auction
//! record yet, so the auction stays active and `end` can be retried.
//!
//! A payout that cannot be pulled back stays in the journal. The registry
//! keeps that journal per auction and hands it back on the next `end`, so
//! the retry skips the shares already paid instead of paying them twice.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::BPS_DENOMINATOR;
use crate::ledger::{AssetLedger, LedgerError, PaymentLedger};
use crate::types::{AssetRef, Auction, AuctionId, Principal};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while disbursing a winning bid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("royalty split overflowed for amount {amount} at {royalty_bps} bps")]
    Overflow { amount: u64, royalty_bps: u32 },

    /// A payout failed. Earlier payouts were reversed.
    #[error("payment of {amount} to {recipient} failed: {source}")]
    Payment {
        recipient: Principal,
        amount: u64,
        source: LedgerError,
    },

    /// Releasing the asset failed. All payouts were reversed.
    #[error("asset release of {asset} to {recipient} failed: {source}")]
    AssetRelease {
        asset: String,
        recipient: Principal,
        source: LedgerError,
    },

    /// Unwinding a partial settlement failed too. `amount` stays with
    /// `stranded_with` and is not paid again when `end` is retried.
    #[error("compensation failed, {amount} stranded with {stranded_with}: {source}")]
    CompensationFailed {
        stranded_with: Principal,
        amount: u64,
        source: LedgerError,
    },
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// How a winning bid divides between royalty recipient and seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltySplit {
    pub royalty_amount: u64,
    pub seller_amount: u64,
}

impl RoyaltySplit {
    /// Splits `amount` at `royalty_bps`.
    pub fn compute(amount: u64, royalty_bps: u32) -> Result<Self, SettlementError> {
        let overflow = SettlementError::Overflow {
            amount,
            royalty_bps,
        };
        let royalty = (amount as u128)
            .checked_mul(u128::from(royalty_bps))
            .ok_or_else(|| overflow.clone())?
            / u128::from(BPS_DENOMINATOR);
        let royalty_amount = u64::try_from(royalty).map_err(|_| overflow.clone())?;
        let seller_amount = amount.checked_sub(royalty_amount).ok_or(overflow)?;
        Ok(Self {
            royalty_amount,
            seller_amount,
        })
    }
}

/// What `end` did, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub settlement_id: Uuid,
    pub auction_id: AuctionId,
    /// `None` when the auction ended unbid.
    pub winner: Option<Principal>,
    pub winning_bid: u64,
    pub royalty_amount: u64,
    pub seller_amount: u64,
    /// Who holds the asset now: the winner, or the seller if unbid.
    pub asset_recipient: Principal,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Which share of the winning bid a payout carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Share {
    Royalty,
    Seller,
}

/// Payouts completed so far, in order.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    payouts: Vec<(Share, Principal, u64)>,
}

impl Journal {
    pub(crate) fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }

    fn has_paid(&self, share: Share) -> bool {
        self.payouts.iter().any(|(paid, _, _)| *paid == share)
    }
}

/// Borrowed view over the collaborators needed to settle. Built per call by
/// the registry while it holds the auction's lock.
pub struct Settlement<'a> {
    payments: &'a dyn PaymentLedger,
    assets: &'a dyn AssetLedger,
    custody: &'a str,
}

impl<'a> Settlement<'a> {
    pub fn new(
        payments: &'a dyn PaymentLedger,
        assets: &'a dyn AssetLedger,
        custody: &'a str,
    ) -> Self {
        Self {
            payments,
            assets,
            custody,
        }
    }

    /// Pays `amount` out of custody: royalty first (skipped entirely when it
    /// comes to zero), then the seller. Either both land or neither does.
    pub fn settle(
        &self,
        amount: u64,
        royalty_bps: u32,
        royalty_recipient: &str,
        seller: &str,
    ) -> Result<RoyaltySplit, SettlementError> {
        let mut journal = Journal::default();
        self.disburse(amount, royalty_bps, royalty_recipient, seller, &mut journal)
    }

    /// Settles the winning bid and hands the asset to `winner`. If the asset
    /// cannot be released the payouts are reversed.
    ///
    /// `journal` carries payouts left over from an earlier failed attempt;
    /// those shares are not paid again. On error it holds whatever could not
    /// be reversed.
    pub(crate) fn settle_and_release(
        &self,
        auction: &Auction,
        winner: &str,
        journal: &mut Journal,
    ) -> Result<SettlementSummary, SettlementError> {
        let split = self.disburse(
            auction.current_bid,
            auction.royalty_bps,
            &auction.royalty_recipient,
            &auction.seller,
            journal,
        )?;

        let asset = &auction.asset_ref;
        if let Err(source) = self.assets.transfer_ownership(asset, self.custody, winner) {
            warn!(auction_id = auction.id, %asset, winner, error = %source, "asset release failed, reversing payouts");
            self.unwind(journal)?;
            return Err(SettlementError::AssetRelease {
                asset: asset.to_string(),
                recipient: winner.to_string(),
                source,
            });
        }

        Ok(SettlementSummary {
            settlement_id: Uuid::new_v4(),
            auction_id: auction.id,
            winner: Some(winner.to_string()),
            winning_bid: auction.current_bid,
            royalty_amount: split.royalty_amount,
            seller_amount: split.seller_amount,
            asset_recipient: winner.to_string(),
        })
    }

    /// Sends the asset back to the seller. No money moves.
    pub fn return_asset(&self, asset: &AssetRef, seller: &str) -> Result<(), SettlementError> {
        self.assets
            .transfer_ownership(asset, self.custody, seller)
            .map_err(|source| SettlementError::AssetRelease {
                asset: asset.to_string(),
                recipient: seller.to_string(),
                source,
            })
    }

    fn disburse(
        &self,
        amount: u64,
        royalty_bps: u32,
        royalty_recipient: &str,
        seller: &str,
        journal: &mut Journal,
    ) -> Result<RoyaltySplit, SettlementError> {
        let split = RoyaltySplit::compute(amount, royalty_bps)?;

        let payouts = [
            (Share::Royalty, royalty_recipient, split.royalty_amount),
            (Share::Seller, seller, split.seller_amount),
        ];
        for (share, recipient, value) in payouts {
            if value == 0 {
                continue;
            }
            if journal.has_paid(share) {
                debug!(recipient, amount = value, ?share, "payout already made, skipping");
                continue;
            }
            if let Err(source) = self.payments.move_funds(self.custody, recipient, value) {
                warn!(recipient, amount = value, error = %source, "payout failed, reversing settlement");
                self.unwind(journal)?;
                return Err(SettlementError::Payment {
                    recipient: recipient.to_string(),
                    amount: value,
                    source,
                });
            }
            journal.payouts.push((share, recipient.to_string(), value));
        }

        Ok(split)
    }

    /// Pulls payouts back into custody, newest first. Stops at the first
    /// one that cannot be reversed and leaves it, and everything older, in
    /// the journal.
    fn unwind(&self, journal: &mut Journal) -> Result<(), SettlementError> {
        while let Some((share, recipient, amount)) = journal.payouts.pop() {
            if let Err(source) = self.payments.move_funds(&recipient, self.custody, amount) {
                error!(recipient = %recipient, amount, error = %source, "settlement compensation failed");
                let stranded_with = recipient.clone();
                journal.payouts.push((share, recipient, amount));
                return Err(SettlementError::CompensationFailed {
                    stranded_with,
                    amount,
                    source,
                });
            }
        }
        Ok(())
    }
}
