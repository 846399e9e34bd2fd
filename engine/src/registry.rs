//! # Auction Registry
//!
//! Owns every auction record and drives the lifecycle:
//!
//! ```text
//!   create ──► Active ──end──► Ended
//!                 │
//!                 └──cancel──► Cancelled
//! ```
//!
//! `bid` mutates an `Active` record in place (highest bid, highest bidder,
//! possibly `end_time`). Terminal records are kept forever as history.
//!
//! ## Concurrency
//!
//! Records live in a `DashMap<AuctionId, Arc<Mutex<Auction>>>`. Every
//! mutating call clones the record's `Arc` out of the map, then holds that
//! auction's mutex for the whole call, collaborator round-trips included.
//! Two bids on the same auction are therefore strictly ordered, and calls
//! on different auctions never wait on each other. Events are emitted after
//! the record is written and before the lock is released, so per auction the
//! event log follows commit order. `create` publishes the record first and
//! then emits `Created`; the id is unknown to anyone else until then.
//!
//! ## Failure
//!
//! Validation runs before any collaborator is called. Once funds or assets
//! start moving, every completed step is undone if a later one fails, and
//! the record is only written after the last step succeeded. A call that
//! returns an error has changed nothing, with two exceptions when an undo
//! fails as well:
//!
//! - `bid` reports [`AuctionError::DepositStranded`] naming the bidder whose
//!   deposit stayed in custody.
//! - `end` keeps the payouts it could not reverse per auction, and the next
//!   `end` resumes from them instead of paying those shares again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{AuctionConfig, ConfigError, BPS_DENOMINATOR};
use crate::error::AuctionError;
use crate::escrow::EscrowLedger;
use crate::events::{AuctionEvent, EventSink};
use crate::ledger::{AssetLedger, PaymentLedger};
use crate::settlement::{Journal, Settlement, SettlementSummary};
use crate::types::{AssetRef, Auction, AuctionId, AuctionState, Principal, TimeUnit};

// ---------------------------------------------------------------------------
// Inputs & outputs
// ---------------------------------------------------------------------------

/// What a seller asks for when listing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingTerms {
    pub asset_ref: AssetRef,
    /// Length of the auction in time units.
    pub duration: TimeUnit,
    pub reserve_price: u64,
    pub royalty_bps: u32,
    pub royalty_recipient: Principal,
}

/// Result of an accepted bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidReceipt {
    pub auction_id: AuctionId,
    pub bidder: Principal,
    pub amount: u64,
    /// Outbid bidder and the amount returned to them.
    pub refunded: Option<(Principal, u64)>,
    pub end_time: TimeUnit,
    /// Whether this bid pushed `end_time` out.
    pub extended: bool,
}

/// The external systems an [`AuctionHouse`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub assets: Arc<dyn AssetLedger>,
    pub payments: Arc<dyn PaymentLedger>,
    pub events: Arc<dyn EventSink>,
}

// ---------------------------------------------------------------------------
// Bid arithmetic
// ---------------------------------------------------------------------------

/// Smallest amount the next bid must reach: the reserve price while unbid,
/// otherwise `current_bid + max(flat, current_bid * bps / 10_000)`.
pub fn minimum_next_bid(auction: &Auction, config: &AuctionConfig) -> Result<u64, AuctionError> {
    if auction.current_bid == 0 {
        return Ok(auction.reserve_price);
    }
    let proportional = u128::from(auction.current_bid) * u128::from(config.bid_increment_bps)
        / u128::from(BPS_DENOMINATOR);
    let proportional = u64::try_from(proportional).map_err(|_| AuctionError::AmountOverflow)?;
    let increment = proportional.max(config.min_bid_increment);
    auction
        .current_bid
        .checked_add(increment)
        .ok_or(AuctionError::AmountOverflow)
}

/// End time after a bid accepted at `now`. Moves forward by the extension
/// when fewer than `snipe_window` units remain.
fn extended_end_time(
    end_time: TimeUnit,
    now: TimeUnit,
    config: &AuctionConfig,
) -> Result<TimeUnit, AuctionError> {
    let remaining = end_time.saturating_sub(now);
    if remaining < config.snipe_window {
        end_time
            .checked_add(config.snipe_extension)
            .ok_or(AuctionError::AmountOverflow)
    } else {
        Ok(end_time)
    }
}

// ---------------------------------------------------------------------------
// Auction house
// ---------------------------------------------------------------------------

/// The single authoritative auction state machine.
pub struct AuctionHouse {
    config: AuctionConfig,
    auctions: DashMap<AuctionId, Arc<Mutex<Auction>>>,
    next_id: AtomicU64,
    escrow: EscrowLedger,
    /// Payouts from a failed `end` that could not be pulled back.
    stranded_payouts: DashMap<AuctionId, Journal>,
    clock: Arc<dyn Clock>,
    assets: Arc<dyn AssetLedger>,
    payments: Arc<dyn PaymentLedger>,
    events: Arc<dyn EventSink>,
}

impl AuctionHouse {
    pub fn new(config: AuctionConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            auctions: DashMap::new(),
            next_id: AtomicU64::new(0),
            escrow: EscrowLedger::new(),
            stranded_payouts: DashMap::new(),
            clock: collaborators.clock,
            assets: collaborators.assets,
            payments: collaborators.payments,
            events: collaborators.events,
        })
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// Principal holding listed assets and escrowed funds.
    pub fn custody(&self) -> &str {
        &self.config.custody
    }

    pub fn escrow(&self) -> &EscrowLedger {
        &self.escrow
    }

    pub fn now(&self) -> TimeUnit {
        self.clock.now()
    }

    /// Number of auctions ever created.
    pub fn auction_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    pub(crate) fn slot(&self, auction_id: AuctionId) -> Option<Arc<Mutex<Auction>>> {
        // Clone the Arc so the map shard is not held while the auction is locked.
        self.auctions
            .get(&auction_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn settlement(&self) -> Settlement<'_> {
        Settlement::new(&*self.payments, &*self.assets, &self.config.custody)
    }

    /// Lists an asset. Takes custody of it, allocates the next id, and
    /// starts the clock at `now`.
    ///
    /// # Errors
    ///
    /// - [`AuctionError::InvalidDuration`] if `duration` is below the minimum.
    /// - [`AuctionError::InvalidPercent`] if `royalty_bps` exceeds the cap.
    /// - [`AuctionError::BidTooLow`] if `reserve_price` is zero.
    /// - [`AuctionError::Ledger`] if the asset cannot be taken into custody.
    pub fn create(&self, seller: &str, terms: ListingTerms) -> Result<AuctionId, AuctionError> {
        if terms.duration < self.config.min_duration {
            return Err(AuctionError::InvalidDuration {
                duration: terms.duration,
                min: self.config.min_duration,
            });
        }
        if terms.royalty_bps > self.config.max_royalty_bps {
            return Err(AuctionError::InvalidPercent {
                bps: terms.royalty_bps,
                max: self.config.max_royalty_bps,
            });
        }
        if terms.reserve_price == 0 {
            return Err(AuctionError::BidTooLow {
                offered: 0,
                minimum: 1,
            });
        }

        let now = self.clock.now();
        let end_time = now
            .checked_add(terms.duration)
            .ok_or(AuctionError::AmountOverflow)?;

        self.assets
            .transfer_ownership(&terms.asset_ref, seller, &self.config.custody)
            .map_err(|e| {
                warn!(seller, asset = %terms.asset_ref, error = %e, "custody transfer failed");
                AuctionError::Ledger(e)
            })?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let auction = Auction {
            id,
            seller: seller.to_string(),
            asset_ref: terms.asset_ref,
            reserve_price: terms.reserve_price,
            royalty_bps: terms.royalty_bps,
            royalty_recipient: terms.royalty_recipient,
            start_time: now,
            end_time,
            current_bid: 0,
            current_bidder: None,
            state: AuctionState::Active,
            bid_count: 0,
        };
        let event = AuctionEvent::Created {
            auction_id: id,
            seller: auction.seller.clone(),
            asset: auction.asset_ref.clone(),
            reserve_price: auction.reserve_price,
            royalty_bps: auction.royalty_bps,
            end_time,
        };
        self.auctions.insert(id, Arc::new(Mutex::new(auction)));
        info!(auction_id = id, seller, end_time, "auction created");
        self.events.emit(event);
        Ok(id)
    }

    /// Places a bid of `amount` from `bidder`.
    ///
    /// The funds move into custody, the previous highest bidder is refunded
    /// in full, and a bid landing inside the anti-snipe window pushes the
    /// end time out.
    ///
    /// # Errors
    ///
    /// - [`AuctionError::AuctionNotActive`] for an unknown or terminal auction.
    /// - [`AuctionError::AuctionExpired`] once `now >= end_time`.
    /// - [`AuctionError::Unauthorized`] if the seller bids on their own auction.
    /// - [`AuctionError::BidTooLow`] below [`minimum_next_bid`].
    /// - [`AuctionError::Ledger`] if the deposit or the refund fails.
    /// - [`AuctionError::DepositStranded`] if the refund fails and the
    ///   deposit cannot be returned either.
    pub fn bid(
        &self,
        auction_id: AuctionId,
        amount: u64,
        bidder: &str,
    ) -> Result<BidReceipt, AuctionError> {
        let slot = self
            .slot(auction_id)
            .ok_or(AuctionError::AuctionNotActive(auction_id))?;
        let mut auction = slot.lock();

        if !auction.is_active() {
            return Err(AuctionError::AuctionNotActive(auction_id));
        }
        let now = self.clock.now();
        if auction.is_expired(now) {
            return Err(AuctionError::AuctionExpired {
                id: auction_id,
                end_time: auction.end_time,
            });
        }
        if auction.seller == bidder {
            return Err(AuctionError::Unauthorized(
                "seller cannot bid on own auction".into(),
            ));
        }
        let minimum = minimum_next_bid(&auction, &self.config)?;
        if amount < minimum {
            return Err(AuctionError::BidTooLow {
                offered: amount,
                minimum,
            });
        }
        let new_end_time = extended_end_time(auction.end_time, now, &self.config)?;
        let bid_count = auction
            .bid_count
            .checked_add(1)
            .ok_or(AuctionError::AmountOverflow)?;

        let custody = self.config.custody.as_str();
        self.payments.move_funds(bidder, custody, amount)?;

        let previous = auction.current_bidder.clone();
        let mut refunded = None;
        if let Some(previous_bidder) = previous {
            let held = self.escrow.release(auction_id, &previous_bidder);
            if held > 0 {
                if let Err(e) = self.payments.move_funds(custody, &previous_bidder, held) {
                    warn!(auction_id, previous_bidder = %previous_bidder, error = %e, "refund failed, returning deposit");
                    self.escrow.hold(auction_id, &previous_bidder, held)?;
                    if let Err(source) = self.payments.move_funds(custody, bidder, amount) {
                        error!(auction_id, bidder, amount, error = %source, "deposit return failed");
                        return Err(AuctionError::DepositStranded {
                            stranded_with: bidder.to_string(),
                            amount,
                            source,
                        });
                    }
                    return Err(e.into());
                }
            }
            refunded = Some((previous_bidder, held));
        }
        self.escrow.hold(auction_id, bidder, amount)?;

        let extended = new_end_time != auction.end_time;
        auction.current_bid = amount;
        auction.current_bidder = Some(bidder.to_string());
        auction.end_time = new_end_time;
        auction.bid_count = bid_count;

        debug!(auction_id, bidder, amount, end_time = new_end_time, extended, "bid accepted");
        self.events.emit(AuctionEvent::Bid {
            auction_id,
            bidder: bidder.to_string(),
            amount,
            previous_bidder: refunded.as_ref().map(|(who, _)| who.clone()),
            refunded: refunded.as_ref().map(|(_, held)| *held).unwrap_or(0),
            end_time: new_end_time,
            extended,
        });

        Ok(BidReceipt {
            auction_id,
            bidder: bidder.to_string(),
            amount,
            refunded,
            end_time: new_end_time,
            extended,
        })
    }

    /// Closes an expired auction. Anyone may call it.
    ///
    /// With a winner, the winning bid is split between royalty recipient and
    /// seller and the asset goes to the winner. Unbid, the asset goes back to
    /// the seller and no money moves.
    ///
    /// # Errors
    ///
    /// - [`AuctionError::AuctionNotActive`] for an unknown or terminal auction
    ///   (so a second `end` is rejected).
    /// - [`AuctionError::Unauthorized`] if `asset_ref` is not the listed asset.
    /// - [`AuctionError::AuctionNotEnded`] while `now < end_time`.
    /// - [`AuctionError::Settlement`] if a payout or the asset release fails;
    ///   the auction stays active and the call can be retried. Payouts that
    ///   could not be reversed are not made again on the retry.
    pub fn end(
        &self,
        auction_id: AuctionId,
        asset_ref: &AssetRef,
    ) -> Result<SettlementSummary, AuctionError> {
        let slot = self
            .slot(auction_id)
            .ok_or(AuctionError::AuctionNotActive(auction_id))?;
        let mut auction = slot.lock();

        if !auction.is_active() {
            return Err(AuctionError::AuctionNotActive(auction_id));
        }
        if auction.asset_ref != *asset_ref {
            return Err(AuctionError::Unauthorized(format!(
                "asset {} is not listed in auction {}",
                asset_ref, auction_id
            )));
        }
        let now = self.clock.now();
        if !auction.is_expired(now) {
            return Err(AuctionError::AuctionNotEnded {
                id: auction_id,
                end_time: auction.end_time,
                now,
            });
        }

        let settlement = self.settlement();
        let summary = match auction.current_bidder.clone() {
            Some(winner) => {
                let mut journal = self
                    .stranded_payouts
                    .remove(&auction_id)
                    .map(|(_, journal)| journal)
                    .unwrap_or_default();
                let summary = match settlement.settle_and_release(&auction, &winner, &mut journal) {
                    Ok(summary) => summary,
                    Err(e) => {
                        if !journal.is_empty() {
                            warn!(auction_id, "settlement left payouts in place, retry resumes from them");
                            self.stranded_payouts.insert(auction_id, journal);
                        }
                        return Err(e.into());
                    }
                };
                self.escrow.release(auction_id, &winner);
                summary
            }
            None => {
                settlement.return_asset(&auction.asset_ref, &auction.seller)?;
                SettlementSummary {
                    settlement_id: Uuid::new_v4(),
                    auction_id,
                    winner: None,
                    winning_bid: 0,
                    royalty_amount: 0,
                    seller_amount: 0,
                    asset_recipient: auction.seller.clone(),
                }
            }
        };

        auction.state = AuctionState::Ended;

        info!(
            auction_id,
            winner = ?summary.winner,
            winning_bid = summary.winning_bid,
            royalty = summary.royalty_amount,
            "auction ended"
        );
        self.events.emit(AuctionEvent::Ended {
            auction_id,
            winner: summary.winner.clone(),
            winning_bid: summary.winning_bid,
            royalty_amount: summary.royalty_amount,
            seller_amount: summary.seller_amount,
        });
        Ok(summary)
    }

    /// Withdraws an unbid auction and returns the asset to the seller.
    ///
    /// # Errors
    ///
    /// - [`AuctionError::AuctionNotActive`] for an unknown or terminal auction.
    /// - [`AuctionError::Unauthorized`] unless `caller` is the seller and
    ///   `asset_ref` is the listed asset.
    /// - [`AuctionError::NoBids`] once any bid has been accepted.
    pub fn cancel(
        &self,
        auction_id: AuctionId,
        asset_ref: &AssetRef,
        caller: &str,
    ) -> Result<(), AuctionError> {
        let slot = self
            .slot(auction_id)
            .ok_or(AuctionError::AuctionNotActive(auction_id))?;
        let mut auction = slot.lock();

        if !auction.is_active() {
            return Err(AuctionError::AuctionNotActive(auction_id));
        }
        if auction.seller != caller {
            return Err(AuctionError::Unauthorized(
                "only the seller can cancel".into(),
            ));
        }
        if auction.asset_ref != *asset_ref {
            return Err(AuctionError::Unauthorized(format!(
                "asset {} is not listed in auction {}",
                asset_ref, auction_id
            )));
        }
        if auction.has_bids() {
            return Err(AuctionError::NoBids(auction_id));
        }

        self.settlement()
            .return_asset(&auction.asset_ref, &auction.seller)?;
        auction.state = AuctionState::Cancelled;
        let seller = auction.seller.clone();

        info!(auction_id, seller = %seller, "auction cancelled");
        self.events.emit(AuctionEvent::Cancelled { auction_id, seller });
        Ok(())
    }
}
