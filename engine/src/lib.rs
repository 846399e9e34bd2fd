// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Gavel: Auction & Escrow Engine
//!
//! Timed, competitive auctions for unique digital assets. Sellers list an
//! asset, bidders lock funds in escrow, outbid funds are refunded on the
//! spot, late bids push the clock out, and the winning payment is split
//! between a royalty recipient and the seller before the asset changes hands.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **clock**: the opaque, monotonically increasing time source.
//! - **ledger**: the asset-ownership and payment collaborators the engine
//!   calls but does not own, plus in-memory implementations.
//! - **escrow**: per-auction bookkeeping of who holds what.
//! - **registry**: the auction state machine (`create`, `bid`, `end`, `cancel`).
//! - **settlement**: the royalty/seller split and its disbursement.
//! - **query**: read-only projections over registry + escrow.
//! - **events**: append-only side channel for external indexers.
//! - **config**: every numeric rule in one place.
//!
//! ## Design Philosophy
//!
//! 1. Money never wraps. Every amount goes through checked arithmetic.
//! 2. A failed call leaves no trace: collaborator steps are journaled and
//!    compensated before an error is returned.
//! 3. One lock per auction. Different auctions never contend.
//! 4. Terminal means terminal. `Ended` and `Cancelled` are never left.

pub mod clock;
pub mod config;
pub mod error;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod query;
pub mod registry;
pub mod settlement;
pub mod types;

pub use clock::{Clock, ManualClock};
pub use config::{AuctionConfig, ConfigError};
pub use error::AuctionError;
pub use escrow::EscrowLedger;
pub use events::{AuctionEvent, EventLog, EventRecord, EventSink};
pub use ledger::{
    AssetLedger, InMemoryAssetLedger, InMemoryPaymentLedger, LedgerError, PaymentLedger,
};
pub use registry::{minimum_next_bid, AuctionHouse, BidReceipt, Collaborators, ListingTerms};
pub use settlement::{RoyaltySplit, Settlement, SettlementError, SettlementSummary};
pub use types::{AssetRef, Auction, AuctionId, AuctionState, AuctionStatus, Principal, TimeUnit};
