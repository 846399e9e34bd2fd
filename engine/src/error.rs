//! Error types for auction operations.
//!
//! Every mutating call returns an [`AuctionError`] on failure. None of them
//! are retried internally, and a failed call leaves the auction record
//! untouched, so the caller may retry at its own discretion. The one case
//! that needs an operator is [`AuctionError::DepositStranded`].

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::settlement::SettlementError;
use crate::types::{AuctionId, Principal, TimeUnit};

/// Errors returned by the auction registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuctionError {
    /// Unknown id, or the auction has already ended or been cancelled.
    #[error("auction {0} is not active")]
    AuctionNotActive(AuctionId),

    /// The amount is below the required minimum (or the reserve price is 0).
    #[error("bid too low: offered {offered}, minimum {minimum}")]
    BidTooLow { offered: u64, minimum: u64 },

    #[error("auction {id} expired at {end_time}")]
    AuctionExpired { id: AuctionId, end_time: TimeUnit },

    #[error("auction {id} runs until {end_time}, now {now}")]
    AuctionNotEnded {
        id: AuctionId,
        end_time: TimeUnit,
        now: TimeUnit,
    },

    /// Cancellation is only allowed while the auction is unbid.
    #[error("auction {0} already has bids")]
    NoBids(AuctionId),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("royalty {bps} bps exceeds cap of {max} bps")]
    InvalidPercent { bps: u32, max: u32 },

    #[error("duration {duration} below minimum of {min}")]
    InvalidDuration { duration: TimeUnit, min: TimeUnit },

    #[error("auction {0} not found")]
    NotFound(AuctionId),

    #[error("amount overflow")]
    AmountOverflow,

    /// A collaborator call failed before any state was touched.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Payment or asset release failed during `end`. The auction is still
    /// active and `end` can be retried; payouts that could not be pulled
    /// back are remembered and skipped on the retry.
    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    /// A bid's refund failed and returning the new deposit failed too. The
    /// auction is unchanged but `amount` sits in custody owed to
    /// `stranded_with`.
    #[error("deposit of {amount} stranded in custody for {stranded_with}: {source}")]
    DepositStranded {
        stranded_with: Principal,
        amount: u64,
        source: LedgerError,
    },
}

impl AuctionError {
    /// Stable numeric code, reported alongside the message by the node API.
    pub fn code(&self) -> u32 {
        match self {
            AuctionError::AuctionNotActive(_) => 101,
            AuctionError::BidTooLow { .. } => 102,
            AuctionError::AuctionExpired { .. } => 103,
            AuctionError::AuctionNotEnded { .. } => 104,
            AuctionError::NoBids(_) => 105,
            AuctionError::Unauthorized(_) => 106,
            AuctionError::InvalidPercent { .. } => 107,
            AuctionError::InvalidDuration { .. } => 108,
            AuctionError::NotFound(_) => 109,
            AuctionError::AmountOverflow => 110,
            AuctionError::Ledger(_) => 200,
            AuctionError::Settlement(_) => 201,
            AuctionError::DepositStranded { .. } => 202,
        }
    }

    /// Collaborator faults, as opposed to caller mistakes.
    pub fn is_collaborator_fault(&self) -> bool {
        matches!(
            self,
            AuctionError::Ledger(_)
                | AuctionError::Settlement(_)
                | AuctionError::DepositStranded { .. }
        )
    }
}
