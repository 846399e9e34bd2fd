//! # Auction Rules & Constants
//!
//! Every magic number in Gavel lives here. If you're hardcoding a bid
//! increment somewhere else, you're doing it wrong.
//!
//! The defaults are bundled into [`AuctionConfig`] so a host can run an
//! engine with different rules (a faster devnet, a longer anti-snipe window)
//! without touching the state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TimeUnit;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Shortest auction a seller may list, in time units (blocks).
/// 50 blocks is rejected, 150 is accepted. 100 is the floor.
pub const MIN_AUCTION_DURATION: TimeUnit = 100;

/// Identity that holds listed assets and escrowed funds on behalf of the
/// engine, unless the host configures its own.
pub const DEFAULT_CUSTODY_PRINCIPAL: &str = "gavel.auction-house";

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Basis-point denominator. 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Royalty cap: 1_000 bps = 10%.
pub const MAX_ROYALTY_BPS: u32 = 1_000;

/// Flat floor on the step between consecutive bids.
pub const MIN_BID_INCREMENT: u64 = 10_000;

/// Proportional step between consecutive bids: 500 bps = 5% of the current
/// bid. Whichever of this and [`MIN_BID_INCREMENT`] is larger applies.
pub const BID_INCREMENT_BPS: u32 = 500;

// ---------------------------------------------------------------------------
// Anti-sniping
// ---------------------------------------------------------------------------

/// A bid accepted with fewer than this many units left on the clock
/// triggers an extension.
pub const SNIPE_WINDOW: TimeUnit = 10;

/// How far an extension pushes `end_time` forward.
pub const SNIPE_EXTENSION: TimeUnit = 10;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Rejected configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_duration must be positive")]
    ZeroDuration,

    #[error("max_royalty_bps {0} exceeds 100%")]
    RoyaltyCapTooHigh(u32),

    #[error("bid_increment_bps {0} exceeds 100%")]
    IncrementTooHigh(u32),

    /// Both increments zero would accept a bid equal to the current one.
    #[error("min_bid_increment and bid_increment_bps are both zero")]
    ZeroIncrement,

    /// An extension shorter than the window would leave the auction
    /// closing inside the window of the bid that triggered it.
    #[error("snipe_extension {extension} is shorter than snipe_window {window}")]
    ExtensionShorterThanWindow {
        window: TimeUnit,
        extension: TimeUnit,
    },

    #[error("custody principal must not be empty")]
    EmptyCustody,
}

/// The rule set a single [`AuctionHouse`](crate::AuctionHouse) runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Minimum listing duration in time units.
    pub min_duration: TimeUnit,
    /// Royalty cap in basis points.
    pub max_royalty_bps: u32,
    /// Flat minimum step between bids.
    pub min_bid_increment: u64,
    /// Proportional minimum step between bids, in basis points.
    pub bid_increment_bps: u32,
    /// Time left on the clock below which a bid extends the auction.
    pub snipe_window: TimeUnit,
    /// Extension applied by a late bid.
    pub snipe_extension: TimeUnit,
    /// Principal that holds assets and escrowed funds.
    pub custody: String,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            min_duration: MIN_AUCTION_DURATION,
            max_royalty_bps: MAX_ROYALTY_BPS,
            min_bid_increment: MIN_BID_INCREMENT,
            bid_increment_bps: BID_INCREMENT_BPS,
            snipe_window: SNIPE_WINDOW,
            snipe_extension: SNIPE_EXTENSION,
            custody: DEFAULT_CUSTODY_PRINCIPAL.to_string(),
        }
    }
}

impl AuctionConfig {
    /// Checks that the rule set cannot break the engine's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if u64::from(self.max_royalty_bps) > BPS_DENOMINATOR {
            return Err(ConfigError::RoyaltyCapTooHigh(self.max_royalty_bps));
        }
        if u64::from(self.bid_increment_bps) > BPS_DENOMINATOR {
            return Err(ConfigError::IncrementTooHigh(self.bid_increment_bps));
        }
        if self.min_bid_increment == 0 && self.bid_increment_bps == 0 {
            return Err(ConfigError::ZeroIncrement);
        }
        if self.snipe_extension < self.snipe_window {
            return Err(ConfigError::ExtensionShorterThanWindow {
                window: self.snipe_window,
                extension: self.snipe_extension,
            });
        }
        if self.custody.trim().is_empty() {
            return Err(ConfigError::EmptyCustody);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(AuctionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn royalty_cap_is_ten_percent() {
        assert_eq!(MAX_ROYALTY_BPS as u64 * 10, BPS_DENOMINATOR);
    }

    #[test]
    fn extension_outlasts_window() {
        // Otherwise a late bid could still close inside its own window.
        assert!(SNIPE_EXTENSION >= SNIPE_WINDOW);
        assert!(SNIPE_WINDOW < MIN_AUCTION_DURATION);
    }

    #[test]
    fn rejects_short_extension() {
        let config = AuctionConfig {
            snipe_window: 20,
            snipe_extension: 5,
            ..AuctionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ExtensionShorterThanWindow {
                window: 20,
                extension: 5
            })
        );
    }

    #[test]
    fn rejects_royalty_cap_above_full_price() {
        let config = AuctionConfig {
            max_royalty_bps: 10_001,
            ..AuctionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RoyaltyCapTooHigh(10_001))
        ));
    }

    #[test]
    fn rejects_zero_increments() {
        let config = AuctionConfig {
            min_bid_increment: 0,
            bid_increment_bps: 0,
            ..AuctionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroIncrement));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AuctionConfig = serde_json::from_str(r#"{ "snipe_window": 5 }"#).unwrap();
        assert_eq!(config.snipe_window, 5);
        assert_eq!(config.min_duration, MIN_AUCTION_DURATION);
        assert_eq!(config.custody, DEFAULT_CUSTODY_PRINCIPAL);
    }
}
