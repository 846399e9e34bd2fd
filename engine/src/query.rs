//! Read-only projections over the registry and escrow.
//!
//! Each query locks the auction briefly and returns a snapshot. Nothing here
//! mutates state or calls a ledger.

use crate::error::AuctionError;
use crate::registry::{minimum_next_bid, AuctionHouse};
use crate::types::{Auction, AuctionId, AuctionStatus};

impl AuctionHouse {
    fn snapshot(&self, auction_id: AuctionId) -> Result<Auction, AuctionError> {
        let slot = self
            .slot(auction_id)
            .ok_or(AuctionError::NotFound(auction_id))?;
        let auction = slot.lock().clone();
        Ok(auction)
    }

    /// Full record, including terminal auctions.
    pub fn get_auction(&self, auction_id: AuctionId) -> Result<Auction, AuctionError> {
        self.snapshot(auction_id)
    }

    /// Smallest bid that would currently be accepted.
    pub fn get_min_bid(&self, auction_id: AuctionId) -> Result<u64, AuctionError> {
        let auction = self.snapshot(auction_id)?;
        minimum_next_bid(&auction, self.config())
    }

    /// Current highest bid, 0 while unbid.
    pub fn get_highest_bid(&self, auction_id: AuctionId) -> Result<u64, AuctionError> {
        Ok(self.snapshot(auction_id)?.current_bid)
    }

    /// Amount held for `bidder` on `auction_id`. Unknown pairs read as 0.
    pub fn get_escrow(&self, auction_id: AuctionId, bidder: &str) -> u64 {
        self.escrow().balance_of(auction_id, bidder)
    }

    pub fn get_status(&self, auction_id: AuctionId) -> Result<AuctionStatus, AuctionError> {
        let auction = self.snapshot(auction_id)?;
        let now = self.now();
        Ok(AuctionStatus {
            active: auction.is_active(),
            ended: auction.is_expired(now),
            has_bids: auction.has_bids(),
            remaining: auction.end_time.saturating_sub(now),
        })
    }

    /// Snapshots of every auction, ordered by id.
    pub fn list_auctions(&self) -> Vec<Auction> {
        (0..self.auction_count())
            .filter_map(|id| self.snapshot(id).ok())
            .collect()
    }
}
