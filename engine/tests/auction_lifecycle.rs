//! Integration tests for the full auction lifecycle.
//!
//! Each test builds its own house over fresh in-memory ledgers and a manual
//! clock, then drives it only through the public API: create, bid, end,
//! cancel and the queries. Balances on the payment ledger and ownership on
//! the asset ledger are checked after every step that should move them.

use std::sync::Arc;

use gavel_engine::{
    AssetRef, AuctionConfig, AuctionError, AuctionEvent, AuctionHouse, AuctionId, Collaborators,
    EventLog, InMemoryAssetLedger, InMemoryPaymentLedger, ListingTerms, ManualClock,
    SettlementError,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const SELLER: &str = "seller";
const CREATOR: &str = "creator";
const STARTING_BALANCE: u64 = 100_000_000;

struct Harness {
    house: Arc<AuctionHouse>,
    clock: ManualClock,
    assets: Arc<InMemoryAssetLedger>,
    payments: Arc<InMemoryPaymentLedger>,
    events: Arc<EventLog>,
}

impl Harness {
    fn new() -> Self {
        let clock = ManualClock::new(0);
        let assets = Arc::new(InMemoryAssetLedger::new());
        let payments = Arc::new(InMemoryPaymentLedger::new());
        let events = Arc::new(EventLog::new());
        let house = AuctionHouse::new(
            AuctionConfig::default(),
            Collaborators {
                clock: Arc::new(clock.clone()),
                assets: assets.clone(),
                payments: payments.clone(),
                events: events.clone(),
            },
        )
        .expect("default config is valid");
        Self {
            house: Arc::new(house),
            clock,
            assets,
            payments,
            events,
        }
    }

    fn fund(&self, who: &str) {
        self.payments.credit(who, STARTING_BALANCE).unwrap();
    }

    fn custody(&self) -> String {
        self.house.custody().to_string()
    }

    /// Mints token `token_id` to the seller and lists it.
    fn list(&self, token_id: u64, royalty_bps: u32) -> (AuctionId, AssetRef) {
        let asset = AssetRef::new("test-nft", token_id);
        self.assets.mint(asset.clone(), SELLER);
        let id = self
            .house
            .create(
                SELLER,
                ListingTerms {
                    asset_ref: asset.clone(),
                    duration: 150,
                    reserve_price: 1_000_000,
                    royalty_bps,
                    royalty_recipient: CREATOR.into(),
                },
            )
            .expect("listing succeeds");
        (id, asset)
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[test]
fn create_takes_custody_and_starts_active() {
    let h = Harness::new();
    let (id, asset) = h.list(1, 500);

    assert_eq!(id, 0);
    assert_eq!(h.assets.owner_of(&asset), Some(h.custody()));
    let status = h.house.get_status(id).unwrap();
    assert!(status.active);
    assert!(!status.has_bids);

    let auction = h.house.get_auction(id).unwrap();
    assert_eq!(auction.start_time, 0);
    assert_eq!(auction.end_time, 150);
    assert_eq!(auction.current_bidder, None);
}

#[test]
fn ids_are_sequential() {
    let h = Harness::new();
    assert_eq!(h.list(1, 0).0, 0);
    assert_eq!(h.list(2, 0).0, 1);
    assert_eq!(h.list(3, 0).0, 2);
    assert_eq!(h.house.auction_count(), 3);
}

#[test]
fn create_rejects_bad_terms() {
    let h = Harness::new();
    let asset = AssetRef::new("test-nft", 1);
    h.assets.mint(asset.clone(), SELLER);
    let terms = |duration, reserve_price, royalty_bps| ListingTerms {
        asset_ref: asset.clone(),
        duration,
        reserve_price,
        royalty_bps,
        royalty_recipient: CREATOR.into(),
    };

    assert!(matches!(
        h.house.create(SELLER, terms(50, 1_000_000, 500)),
        Err(AuctionError::InvalidDuration { duration: 50, min: 100 })
    ));
    assert!(matches!(
        h.house.create(SELLER, terms(150, 1_000_000, 1_500)),
        Err(AuctionError::InvalidPercent { bps: 1_500, .. })
    ));
    assert!(matches!(
        h.house.create(SELLER, terms(150, 0, 500)),
        Err(AuctionError::BidTooLow { .. })
    ));

    // Nothing was allocated and the asset never moved.
    assert_eq!(h.house.auction_count(), 0);
    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some(SELLER));

    // The cap itself is allowed.
    assert!(h.house.create(SELLER, terms(150, 1_000_000, 1_000)).is_ok());
}

#[test]
fn create_without_owning_the_asset_fails() {
    let h = Harness::new();
    let asset = AssetRef::new("test-nft", 9);
    h.assets.mint(asset.clone(), "someone-else");

    let err = h
        .house
        .create(
            SELLER,
            ListingTerms {
                asset_ref: asset,
                duration: 150,
                reserve_price: 1_000_000,
                royalty_bps: 0,
                royalty_recipient: SELLER.into(),
            },
        )
        .unwrap_err();
    assert!(err.is_collaborator_fault());
    assert_eq!(h.house.auction_count(), 0);
    assert!(h.events.is_empty());
}

// ---------------------------------------------------------------------------
// Bidding
// ---------------------------------------------------------------------------

#[test]
fn first_bid_must_meet_reserve() {
    let h = Harness::new();
    h.fund("alice");
    let (id, _) = h.list(1, 500);

    assert!(matches!(
        h.house.bid(id, 999_999, "alice"),
        Err(AuctionError::BidTooLow { offered: 999_999, minimum: 1_000_000 })
    ));
    assert!(h.house.bid(id, 1_000_000, "alice").is_ok());
    assert_eq!(h.house.get_min_bid(id).unwrap(), 1_050_000);
}

#[test]
fn outbid_refunds_previous_bidder_in_full() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (id, _) = h.list(1, 500);

    h.house.bid(id, 1_000_000, "alice").unwrap();
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE - 1_000_000);
    assert_eq!(h.house.get_escrow(id, "alice"), 1_000_000);

    let receipt = h.house.bid(id, 1_100_000, "bob").unwrap();
    assert_eq!(receipt.refunded, Some(("alice".to_string(), 1_000_000)));
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE);
    assert_eq!(h.house.get_escrow(id, "alice"), 0);
    assert_eq!(h.house.get_escrow(id, "bob"), 1_100_000);
    assert_eq!(h.house.get_highest_bid(id).unwrap(), 1_100_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 1_100_000);
}

#[test]
fn flat_increment_applies_to_small_bids() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let asset = AssetRef::new("test-nft", 1);
    h.assets.mint(asset.clone(), SELLER);
    let id = h
        .house
        .create(
            SELLER,
            ListingTerms {
                asset_ref: asset,
                duration: 150,
                reserve_price: 100_000,
                royalty_bps: 0,
                royalty_recipient: SELLER.into(),
            },
        )
        .unwrap();
    h.house.bid(id, 100_000, "alice").unwrap();

    // 5% of 100,000 is below the flat floor of 10,000.
    assert!(matches!(
        h.house.bid(id, 105_000, "bob"),
        Err(AuctionError::BidTooLow { minimum: 110_000, .. })
    ));
    assert!(h.house.bid(id, 110_000, "bob").is_ok());
}

#[test]
fn increment_after_reserve_bid() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (id, _) = h.list(1, 0);
    h.house.bid(id, 1_000_000, "alice").unwrap();

    assert!(matches!(
        h.house.bid(id, 1_005_000, "bob"),
        Err(AuctionError::BidTooLow { minimum: 1_050_000, .. })
    ));
    assert!(h.house.bid(id, 1_050_000, "bob").is_ok());
}

#[test]
fn percentage_increment_applies_to_large_bids() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (id, _) = h.list(1, 0);
    h.house.bid(id, 10_000_000, "alice").unwrap();

    assert!(matches!(
        h.house.bid(id, 10_400_000, "bob"),
        Err(AuctionError::BidTooLow { minimum: 10_500_000, .. })
    ));
    assert!(h.house.bid(id, 10_500_000, "bob").is_ok());
}

#[test]
fn seller_cannot_bid() {
    let h = Harness::new();
    h.fund(SELLER);
    let (id, _) = h.list(1, 0);
    assert!(matches!(
        h.house.bid(id, 1_000_000, SELLER),
        Err(AuctionError::Unauthorized(_))
    ));
}

#[test]
fn bid_on_unknown_or_expired_auction() {
    let h = Harness::new();
    h.fund("alice");
    assert_eq!(
        h.house.bid(42, 1_000_000, "alice"),
        Err(AuctionError::AuctionNotActive(42))
    );

    let (id, _) = h.list(1, 0);
    h.clock.advance(150);
    assert!(matches!(
        h.house.bid(id, 1_000_000, "alice"),
        Err(AuctionError::AuctionExpired { end_time: 150, .. })
    ));
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE);
}

#[test]
fn bid_without_funds_changes_nothing() {
    let h = Harness::new();
    let (id, _) = h.list(1, 0);
    let err = h.house.bid(id, 1_000_000, "broke").unwrap_err();
    assert!(err.is_collaborator_fault());
    assert_eq!(h.house.get_highest_bid(id).unwrap(), 0);
    assert_eq!(h.house.get_escrow(id, "broke"), 0);
}

#[test]
fn raising_own_bid_nets_out() {
    let h = Harness::new();
    h.fund("alice");
    let (id, _) = h.list(1, 0);
    h.house.bid(id, 1_000_000, "alice").unwrap();
    h.house.bid(id, 1_050_000, "alice").unwrap();

    assert_eq!(h.house.get_escrow(id, "alice"), 1_050_000);
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE - 1_050_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 1_050_000);
}

#[test]
fn stranded_deposit_is_reported() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (id, _) = h.list(1, 500);
    h.house.bid(id, 1_000_000, "alice").unwrap();

    // Neither the refund to alice nor the deposit return to bob goes through.
    h.payments.fail_next_credits("alice", 1);
    h.payments.fail_next_credits("bob", 1);
    let err = h.house.bid(id, 1_100_000, "bob").unwrap_err();
    assert!(matches!(
        err,
        AuctionError::DepositStranded { ref stranded_with, amount: 1_100_000, .. }
            if stranded_with == "bob"
    ));
    assert!(err.is_collaborator_fault());

    // The auction itself is untouched.
    assert_eq!(h.house.get_highest_bid(id).unwrap(), 1_000_000);
    assert_eq!(h.house.get_escrow(id, "alice"), 1_000_000);
    assert_eq!(h.house.get_escrow(id, "bob"), 0);
    assert_eq!(h.payments.balance_of("bob"), STARTING_BALANCE - 1_100_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 2_100_000);
    assert_eq!(h.events.for_auction(id).len(), 2);
}

// ---------------------------------------------------------------------------
// Anti-snipe
// ---------------------------------------------------------------------------

#[test]
fn early_bid_does_not_extend() {
    let h = Harness::new();
    h.fund("alice");
    let (id, _) = h.list(1, 0);
    let receipt = h.house.bid(id, 1_000_000, "alice").unwrap();
    assert!(!receipt.extended);
    assert_eq!(h.house.get_auction(id).unwrap().end_time, 150);
}

#[test]
fn late_bid_extends_end_time() {
    let h = Harness::new();
    h.fund("alice");
    let (id, _) = h.list(1, 0);
    h.clock.advance(145);

    let receipt = h.house.bid(id, 1_000_000, "alice").unwrap();
    assert!(receipt.extended);
    assert!(receipt.end_time > 150);
    assert_eq!(h.house.get_auction(id).unwrap().end_time, 160);
}

#[test]
fn extended_auction_can_end_after_extension() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 0);
    h.clock.advance(147);
    h.house.bid(id, 1_000_000, "alice").unwrap();

    // 3 units were left; the old end time no longer closes the auction.
    h.clock.advance(3);
    assert!(matches!(
        h.house.end(id, &asset),
        Err(AuctionError::AuctionNotEnded { .. })
    ));

    h.clock.advance(12);
    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.winner.as_deref(), Some("alice"));
}

// ---------------------------------------------------------------------------
// Ending & settlement
// ---------------------------------------------------------------------------

#[test]
fn two_bidder_auction_pays_royalty_and_seller() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (id, asset) = h.list(1, 500);

    h.house.bid(id, 1_000_000, "alice").unwrap();
    h.house.bid(id, 1_100_000, "bob").unwrap();
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE);

    h.clock.advance(151);
    let summary = h.house.end(id, &asset).unwrap();

    assert_eq!(summary.winning_bid, 1_100_000);
    assert_eq!(summary.royalty_amount, 55_000);
    assert_eq!(summary.seller_amount, 1_045_000);
    assert_eq!(h.payments.balance_of(CREATOR), 55_000);
    assert_eq!(h.payments.balance_of(SELLER), 1_045_000);
    assert_eq!(h.payments.balance_of("bob"), STARTING_BALANCE - 1_100_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 0);
    assert_eq!(h.house.get_escrow(id, "bob"), 0);
    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some("bob"));
    assert!(!h.house.get_status(id).unwrap().active);
}

#[test]
fn three_bidder_auction_with_max_royalty() {
    let h = Harness::new();
    for who in ["alice", "bob", "carol"] {
        h.fund(who);
    }
    let (id, asset) = h.list(1, 1_000);

    h.house.bid(id, 1_000_000, "alice").unwrap();
    h.house.bid(id, 2_000_000, "bob").unwrap();
    h.house.bid(id, 3_000_000, "carol").unwrap();
    assert_eq!(h.house.get_auction(id).unwrap().bid_count, 3);

    h.clock.advance(200);
    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.royalty_amount, 300_000);
    assert_eq!(summary.seller_amount, 2_700_000);
    assert_eq!(h.payments.balance_of("alice"), STARTING_BALANCE);
    assert_eq!(h.payments.balance_of("bob"), STARTING_BALANCE);
    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some("carol"));
}

#[test]
fn zero_royalty_pays_seller_everything() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 0);
    h.house.bid(id, 2_000_000, "alice").unwrap();
    h.clock.advance(150);

    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.royalty_amount, 0);
    assert_eq!(h.payments.balance_of(SELLER), 2_000_000);
    assert_eq!(h.payments.balance_of(CREATOR), 0);
}

#[test]
fn unbid_auction_returns_asset_without_moving_funds() {
    let h = Harness::new();
    let (id, asset) = h.list(1, 500);
    h.clock.advance(200);

    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.winner, None);
    assert_eq!(summary.asset_recipient, SELLER);
    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some(SELLER));
    assert!(h.payments.transfers().is_empty());
    assert!(!h.house.get_status(id).unwrap().active);
}

#[test]
fn end_before_expiry_is_rejected() {
    let h = Harness::new();
    let (id, asset) = h.list(1, 0);
    h.clock.advance(149);
    assert!(matches!(
        h.house.end(id, &asset),
        Err(AuctionError::AuctionNotEnded { end_time: 150, now: 149, .. })
    ));
}

#[test]
fn ending_twice_fails() {
    let h = Harness::new();
    let (id, asset) = h.list(1, 0);
    h.clock.advance(150);
    h.house.end(id, &asset).unwrap();
    assert_eq!(h.house.end(id, &asset), Err(AuctionError::AuctionNotActive(id)));
}

#[test]
fn end_with_wrong_asset_is_unauthorized() {
    let h = Harness::new();
    let (id, _) = h.list(1, 0);
    h.clock.advance(150);
    assert!(matches!(
        h.house.end(id, &AssetRef::new("test-nft", 2)),
        Err(AuctionError::Unauthorized(_))
    ));
    assert!(h.house.get_status(id).unwrap().active);
}

#[test]
fn failed_asset_release_keeps_auction_open_for_retry() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 500);
    h.house.bid(id, 1_000_000, "alice").unwrap();
    h.clock.advance(150);

    h.assets.freeze("alice");
    let err = h.house.end(id, &asset).unwrap_err();
    assert!(matches!(err, AuctionError::Settlement(_)));
    assert!(h.house.get_status(id).unwrap().active);
    assert_eq!(h.house.get_escrow(id, "alice"), 1_000_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 1_000_000);
    assert_eq!(h.payments.balance_of(SELLER), 0);
    assert_eq!(h.payments.balance_of(CREATOR), 0);

    h.assets.unfreeze("alice");
    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.royalty_amount, 50_000);
    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some("alice"));
}

#[test]
fn unreversible_payout_is_not_paid_twice_on_retry() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (a, asset_a) = h.list(1, 1_000);
    let (b, _) = h.list(2, 1_000);
    h.house.bid(a, 1_000_000, "alice").unwrap();
    h.house.bid(b, 1_000_000, "bob").unwrap();
    h.clock.advance(150);

    // The royalty lands, the seller payout fails, and the royalty cannot be
    // pulled back.
    h.payments.block_debits(CREATOR);
    h.payments.fail_next_credits(SELLER, 1);
    let err = h.house.end(a, &asset_a).unwrap_err();
    assert!(matches!(
        err,
        AuctionError::Settlement(SettlementError::CompensationFailed { ref stranded_with, amount: 100_000, .. })
            if stranded_with == CREATOR
    ));
    assert!(h.house.get_status(a).unwrap().active);
    assert_eq!(h.payments.balance_of(CREATOR), 100_000);

    let summary = h.house.end(a, &asset_a).unwrap();
    assert_eq!(summary.royalty_amount, 100_000);
    assert_eq!(summary.seller_amount, 900_000);
    assert_eq!(h.payments.balance_of(CREATOR), 100_000);
    assert_eq!(h.payments.balance_of(SELLER), 900_000);
    assert_eq!(h.assets.owner_of(&asset_a).as_deref(), Some("alice"));

    // Auction b's escrow is still fully backed.
    assert_eq!(h.house.get_escrow(b, "bob"), 1_000_000);
    assert_eq!(h.house.escrow().total(), 1_000_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 1_000_000);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn seller_cancels_unbid_auction() {
    let h = Harness::new();
    let (id, asset) = h.list(1, 0);
    h.house.cancel(id, &asset, SELLER).unwrap();

    assert_eq!(h.assets.owner_of(&asset).as_deref(), Some(SELLER));
    assert!(!h.house.get_status(id).unwrap().active);
    assert_eq!(
        h.house.cancel(id, &asset, SELLER),
        Err(AuctionError::AuctionNotActive(id))
    );
}

#[test]
fn cancel_rules() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 0);

    assert!(matches!(
        h.house.cancel(id, &asset, "alice"),
        Err(AuctionError::Unauthorized(_))
    ));
    assert!(matches!(
        h.house.cancel(id, &AssetRef::new("other", 1), SELLER),
        Err(AuctionError::Unauthorized(_))
    ));

    h.house.bid(id, 1_000_000, "alice").unwrap();
    assert_eq!(h.house.cancel(id, &asset, SELLER), Err(AuctionError::NoBids(id)));
    assert!(h.house.get_status(id).unwrap().active);
}

#[test]
fn cancelled_auction_rejects_bids() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 0);
    h.house.cancel(id, &asset, SELLER).unwrap();
    assert_eq!(
        h.house.bid(id, 1_000_000, "alice"),
        Err(AuctionError::AuctionNotActive(id))
    );
}

// ---------------------------------------------------------------------------
// Isolation, events & concurrency
// ---------------------------------------------------------------------------

#[test]
fn escrow_is_isolated_between_auctions() {
    let h = Harness::new();
    h.fund("alice");
    h.fund("bob");
    let (first, _) = h.list(1, 0);
    let (second, _) = h.list(2, 0);

    h.house.bid(first, 1_000_000, "alice").unwrap();
    h.house.bid(second, 2_000_000, "alice").unwrap();
    h.house.bid(first, 1_100_000, "bob").unwrap();

    assert_eq!(h.house.get_escrow(first, "alice"), 0);
    assert_eq!(h.house.get_escrow(second, "alice"), 2_000_000);
    assert_eq!(h.house.escrow().total(), 3_100_000);
    assert_eq!(h.payments.balance_of(&h.custody()), 3_100_000);
}

#[test]
fn every_mutation_emits_one_event() {
    let h = Harness::new();
    h.fund("alice");
    let (id, asset) = h.list(1, 500);
    h.house.bid(id, 1_000_000, "alice").unwrap();
    let _ = h.house.bid(id, 1, "alice");
    h.clock.advance(150);
    h.house.end(id, &asset).unwrap();

    let kinds: Vec<_> = h.events.records().iter().map(|r| r.event.kind()).collect();
    assert_eq!(kinds, vec!["created", "bid", "ended"]);
    match &h.events.records()[2].event {
        AuctionEvent::Ended { winner, royalty_amount, .. } => {
            assert_eq!(winner.as_deref(), Some("alice"));
            assert_eq!(*royalty_amount, 50_000);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn concurrent_bids_are_serialized() {
    let h = Harness::new();
    let bidders: Vec<String> = (0..8).map(|i| format!("bidder-{i}")).collect();
    for bidder in &bidders {
        h.fund(bidder);
    }
    let (id, asset) = h.list(1, 500);

    std::thread::scope(|scope| {
        for (i, bidder) in bidders.iter().enumerate() {
            let house = &h.house;
            scope.spawn(move || {
                let mut amount = 1_000_000 + i as u64 * 1_000;
                for _ in 0..5 {
                    match house.bid(id, amount, bidder) {
                        Ok(_) => amount = house.get_min_bid(id).unwrap(),
                        Err(AuctionError::BidTooLow { minimum, .. }) => amount = minimum,
                        Err(other) => panic!("unexpected error {other:?}"),
                    }
                }
            });
        }
    });

    let auction = h.house.get_auction(id).unwrap();
    let winner = auction.current_bidder.clone().expect("someone won");

    // Exactly one bidder has funds held, and custody holds exactly that.
    for bidder in &bidders {
        let held = h.house.get_escrow(id, bidder);
        if *bidder == winner {
            assert_eq!(held, auction.current_bid);
        } else {
            assert_eq!(held, 0);
            assert_eq!(h.payments.balance_of(bidder), STARTING_BALANCE);
        }
    }
    assert_eq!(h.payments.balance_of(&h.custody()), auction.current_bid);

    // Accepted bids are strictly increasing in log order.
    let amounts: Vec<u64> = h
        .events
        .records()
        .iter()
        .filter_map(|r| match &r.event {
            AuctionEvent::Bid { amount, .. } => Some(*amount),
            _ => None,
        })
        .collect();
    assert_eq!(amounts.len() as u32, auction.bid_count);
    assert!(amounts.windows(2).all(|pair| pair[0] < pair[1]));

    h.clock.advance(1_000);
    let summary = h.house.end(id, &asset).unwrap();
    assert_eq!(summary.royalty_amount + summary.seller_amount, auction.current_bid);
}
