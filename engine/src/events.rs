//! # Auction Events
//!
//! One structured record per successful mutating operation, for external
//! indexers. Events are written to an [`EventSink`] after the state change
//! has been committed; a sink cannot fail or roll back the operation.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{AssetRef, AuctionId, Principal, TimeUnit};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuctionEvent {
    Created {
        auction_id: AuctionId,
        seller: Principal,
        asset: AssetRef,
        reserve_price: u64,
        royalty_bps: u32,
        end_time: TimeUnit,
    },
    Bid {
        auction_id: AuctionId,
        bidder: Principal,
        amount: u64,
        /// Outbid bidder, if any, and what they got back.
        previous_bidder: Option<Principal>,
        refunded: u64,
        /// End time after the bid (moved forward on a late bid).
        end_time: TimeUnit,
        extended: bool,
    },
    Ended {
        auction_id: AuctionId,
        winner: Option<Principal>,
        winning_bid: u64,
        royalty_amount: u64,
        seller_amount: u64,
    },
    Cancelled {
        auction_id: AuctionId,
        seller: Principal,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> AuctionId {
        match self {
            AuctionEvent::Created { auction_id, .. }
            | AuctionEvent::Bid { auction_id, .. }
            | AuctionEvent::Ended { auction_id, .. }
            | AuctionEvent::Cancelled { auction_id, .. } => *auction_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuctionEvent::Created { .. } => "created",
            AuctionEvent::Bid { .. } => "bid",
            AuctionEvent::Ended { .. } => "ended",
            AuctionEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// An event as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: AuctionEvent,
}

/// Append-only destination for events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AuctionEvent);
}

/// In-memory event log.
#[derive(Debug, Default)]
pub struct EventLog {
    records: RwLock<Vec<EventRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` and returns the stored record.
    pub fn append(&self, event: AuctionEvent) -> EventRecord {
        let mut records = self.records.write();
        let record = EventRecord {
            sequence: records.len() as u64,
            recorded_at: Utc::now(),
            event,
        };
        records.push(record.clone());
        record
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.read().clone()
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> Vec<EventRecord> {
        let records = self.records.read();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(records.len());
        records[start..].to_vec()
    }

    /// All records concerning one auction.
    pub fn for_auction(&self, auction_id: AuctionId) -> Vec<EventRecord> {
        self.records
            .read()
            .iter()
            .filter(|record| record.event.auction_id() == auction_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: AuctionEvent) {
        self.append(event);
    }
}
