//! Core data model: auction records, lifecycle states, and the identifiers
//! that tie them to the outside world.

use serde::{Deserialize, Serialize};

/// Sequential auction identifier. Assigned at creation, never reused.
pub type AuctionId = u64;

/// An already-authenticated caller identity (account address, contract
/// principal, ...). The engine never inspects its contents.
pub type Principal = String;

/// Opaque, monotonically increasing time unit (block height).
pub type TimeUnit = u64;

/// Reference to the unique item being auctioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    /// Collection (contract) the item belongs to.
    pub collection: String,
    /// Item id within the collection.
    pub token_id: u64,
}

impl AssetRef {
    pub fn new(collection: impl Into<String>, token_id: u64) -> Self {
        Self {
            collection: collection.into(),
            token_id,
        }
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.collection, self.token_id)
    }
}

/// Lifecycle state of an auction.
///
/// `Active` is the only non-terminal state. Nothing transitions out of
/// `Ended` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionState {
    /// Accepting bids (or waiting to be ended once the clock runs out).
    Active,
    /// Settled: the asset went to the winner, or back to the seller if unbid.
    Ended,
    /// Withdrawn by the seller before any bid arrived.
    Cancelled,
}

impl AuctionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AuctionState::Active)
    }
}

impl std::fmt::Display for AuctionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuctionState::Active => write!(f, "Active"),
            AuctionState::Ended => write!(f, "Ended"),
            AuctionState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A single auction record, owned by the [`AuctionHouse`](crate::AuctionHouse).
///
/// Records are never deleted; terminal auctions stay around as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    /// Lister. Immutable after creation.
    pub seller: Principal,
    pub asset_ref: AssetRef,
    /// Floor for the first bid. Always > 0.
    pub reserve_price: u64,
    /// Share of the final price routed to `royalty_recipient`, in basis points.
    pub royalty_bps: u32,
    pub royalty_recipient: Principal,
    pub start_time: TimeUnit,
    /// Only ever moved forward, and only by the anti-snipe rule.
    pub end_time: TimeUnit,
    /// Highest accepted bid, 0 while unbid.
    pub current_bid: u64,
    /// `None` exactly when `current_bid == 0`.
    pub current_bidder: Option<Principal>,
    pub state: AuctionState,
    /// Number of accepted bids.
    pub bid_count: u32,
}

impl Auction {
    /// `true` until the auction is ended or cancelled.
    pub fn is_active(&self) -> bool {
        self.state == AuctionState::Active
    }

    pub fn has_bids(&self) -> bool {
        self.current_bid > 0
    }

    /// Whether the clock has run out. Expiry is evaluated lazily against
    /// `now`; no timer ever fires.
    pub fn is_expired(&self, now: TimeUnit) -> bool {
        now >= self.end_time
    }
}

/// Read-only status projection returned by
/// [`AuctionHouse::get_status`](crate::AuctionHouse::get_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionStatus {
    pub active: bool,
    /// `now >= end_time`.
    pub ended: bool,
    pub has_bids: bool,
    /// Time units left before `end_time`, 0 once expired.
    pub remaining: TimeUnit,
}
