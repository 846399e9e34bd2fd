//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the auction engine over HTTP. All
//! endpoints share application state through axum's `State` extractor.
//! Caller identity (seller, bidder, caller) travels in the request body and
//! is assumed to be authenticated upstream.
//!
//! ## Endpoints
//!
//! | Method | Path                            | Description                        |
//! |--------|---------------------------------|------------------------------------|
//! | GET    | `/health`                       | Liveness probe                     |
//! | GET    | `/status`                       | Node status summary                |
//! | POST   | `/auctions`                     | List an asset                      |
//! | GET    | `/auctions/:id`                 | Auction record                     |
//! | POST   | `/auctions/:id/bids`            | Place a bid                        |
//! | POST   | `/auctions/:id/end`             | Settle an expired auction          |
//! | POST   | `/auctions/:id/cancel`          | Withdraw an unbid auction          |
//! | GET    | `/auctions/:id/min-bid`         | Smallest acceptable next bid       |
//! | GET    | `/auctions/:id/highest-bid`     | Current highest bid                |
//! | GET    | `/auctions/:id/status`          | Active / ended / has-bids flags    |
//! | GET    | `/auctions/:id/escrow/:bidder`  | Funds held for a bidder            |
//! | GET    | `/events?since=n`               | Event log from sequence `n`        |
//! | GET    | `/ws`                           | WebSocket for live auction events  |
//! | POST   | `/dev/mint`                     | Mint an asset on the dev ledger    |
//! | POST   | `/dev/fund`                     | Credit an account on the dev ledger|
//! | GET    | `/accounts/:principal`          | Dev ledger balance                 |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gavel_engine::{
    AssetRef, Auction, AuctionConfig, AuctionError, AuctionEvent, AuctionHouse, AuctionId,
    AuctionStatus, BidReceipt, Clock, Collaborators, ConfigError, EventLog, EventRecord,
    EventSink, InMemoryAssetLedger, InMemoryPaymentLedger, LedgerError, ListingTerms,
    ManualClock, Principal, SettlementSummary,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Event sink that appends to the in-memory log and fans the stored record
/// out to WebSocket subscribers.
pub struct BroadcastSink {
    log: Arc<EventLog>,
    tx: broadcast::Sender<EventRecord>,
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: AuctionEvent) {
        let record = self.log.append(event);
        // No subscribers is not an error.
        let _ = self.tx.send(record);
    }
}

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub house: Arc<AuctionHouse>,
    /// Advanced by the block ticker.
    pub clock: ManualClock,
    pub assets: Arc<InMemoryAssetLedger>,
    pub payments: Arc<InMemoryPaymentLedger>,
    pub events: Arc<EventLog>,
    pub event_tx: broadcast::Sender<EventRecord>,
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Wires an auction house over fresh in-memory ledgers.
    pub fn new(
        config: AuctionConfig,
        version: String,
        metrics: SharedMetrics,
        event_capacity: usize,
    ) -> Result<Self, ConfigError> {
        let clock = ManualClock::new(0);
        let assets = Arc::new(InMemoryAssetLedger::new());
        let payments = Arc::new(InMemoryPaymentLedger::new());
        let events = Arc::new(EventLog::new());
        let (event_tx, _) = broadcast::channel(event_capacity);

        let sink = BroadcastSink {
            log: Arc::clone(&events),
            tx: event_tx.clone(),
        };
        let house = AuctionHouse::new(
            config,
            Collaborators {
                clock: Arc::new(clock.clone()),
                assets: assets.clone(),
                payments: payments.clone(),
                events: Arc::new(sink),
            },
        )?;

        Ok(Self {
            version,
            house: Arc::new(house),
            clock,
            assets,
            payments,
            events,
            event_tx,
            metrics,
        })
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/auctions", post(create_auction_handler))
        .route("/auctions/:id", get(auction_handler))
        .route("/auctions/:id/bids", post(bid_handler))
        .route("/auctions/:id/end", post(end_handler))
        .route("/auctions/:id/cancel", post(cancel_handler))
        .route("/auctions/:id/min-bid", get(min_bid_handler))
        .route("/auctions/:id/highest-bid", get(highest_bid_handler))
        .route("/auctions/:id/status", get(auction_status_handler))
        .route("/auctions/:id/escrow/:bidder", get(escrow_handler))
        .route("/events", get(events_handler))
        .route("/ws", get(ws_handler))
        .route("/dev/mint", post(mint_handler))
        .route("/dev/fund", post(fund_handler))
        .route("/accounts/:principal", get(account_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body: `{ "error": "...", "code": 102 }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u32,
}

/// Handler error carrying its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

fn status_for(err: &AuctionError) -> StatusCode {
    match err {
        AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
        AuctionError::Unauthorized(_) => StatusCode::FORBIDDEN,
        AuctionError::AuctionNotActive(_)
        | AuctionError::AuctionExpired { .. }
        | AuctionError::AuctionNotEnded { .. }
        | AuctionError::NoBids(_) => StatusCode::CONFLICT,
        AuctionError::BidTooLow { .. }
        | AuctionError::InvalidPercent { .. }
        | AuctionError::InvalidDuration { .. }
        | AuctionError::AmountOverflow => StatusCode::BAD_REQUEST,
        AuctionError::Ledger(_)
        | AuctionError::Settlement(_)
        | AuctionError::DepositStranded { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl From<AuctionError> for ApiError {
    fn from(err: AuctionError) -> Self {
        Self {
            status: status_for(&err),
            body: ErrorResponse {
                error: err.to_string(),
                code: err.code(),
            },
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        AuctionError::Ledger(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Request & Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub block_height: u64,
    pub auctions: u64,
    pub events: usize,
    pub custody: String,
    /// Funds currently held in escrow across all auctions.
    pub escrow_total: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAuctionRequest {
    pub seller: Principal,
    #[serde(flatten)]
    pub terms: ListingTerms,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAuctionResponse {
    pub auction_id: AuctionId,
    pub end_time: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BidRequest {
    pub bidder: Principal,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndRequest {
    pub asset_ref: AssetRef,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelRequest {
    pub caller: Principal,
    pub asset_ref: AssetRef,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AmountResponse {
    pub auction_id: AuctionId,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EscrowResponse {
    pub auction_id: AuctionId,
    pub bidder: Principal,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MintRequest {
    pub asset_ref: AssetRef,
    pub owner: Principal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FundRequest {
    pub account: Principal,
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub principal: Principal,
    pub balance: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: state.version.clone(),
        block_height: state.clock.now(),
        auctions: state.house.auction_count(),
        events: state.events.len(),
        custody: state.house.custody().to_string(),
        escrow_total: state.house.escrow().total(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /auctions`: returns 201 with the new id.
async fn create_auction_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<CreateAuctionResponse>), ApiError> {
    let _timer = state
        .metrics
        .operation_latency_seconds
        .with_label_values(&["create"])
        .start_timer();

    let auction_id = state.house.create(&req.seller, req.terms)?;
    state.metrics.auctions_created_total.inc();
    let end_time = state.house.get_auction(auction_id)?.end_time;
    Ok((
        StatusCode::CREATED,
        Json(CreateAuctionResponse {
            auction_id,
            end_time,
        }),
    ))
}

/// `GET /auctions/:id`
async fn auction_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
) -> ApiResult<Auction> {
    Ok(Json(state.house.get_auction(id)?))
}

/// `POST /auctions/:id/bids`
async fn bid_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
    Json(req): Json<BidRequest>,
) -> ApiResult<BidReceipt> {
    let _timer = state
        .metrics
        .operation_latency_seconds
        .with_label_values(&["bid"])
        .start_timer();

    match state.house.bid(id, req.amount, &req.bidder) {
        Ok(receipt) => {
            state.metrics.bids_accepted_total.inc();
            if receipt.extended {
                state.metrics.snipe_extensions_total.inc();
            }
            Ok(Json(receipt))
        }
        Err(e) => {
            state
                .metrics
                .bids_rejected_total
                .with_label_values(&[&e.code().to_string()])
                .inc();
            Err(e.into())
        }
    }
}

/// `POST /auctions/:id/end`
async fn end_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
    Json(req): Json<EndRequest>,
) -> ApiResult<SettlementSummary> {
    let _timer = state
        .metrics
        .operation_latency_seconds
        .with_label_values(&["end"])
        .start_timer();

    let summary = state.house.end(id, &req.asset_ref)?;
    state.metrics.auctions_ended_total.inc();
    Ok(Json(summary))
}

/// `POST /auctions/:id/cancel`
async fn cancel_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
    Json(req): Json<CancelRequest>,
) -> ApiResult<serde_json::Value> {
    let _timer = state
        .metrics
        .operation_latency_seconds
        .with_label_values(&["cancel"])
        .start_timer();

    state.house.cancel(id, &req.asset_ref, &req.caller)?;
    state.metrics.auctions_cancelled_total.inc();
    Ok(Json(serde_json::json!({ "auction_id": id, "cancelled": true })))
}

async fn min_bid_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
) -> ApiResult<AmountResponse> {
    let amount = state.house.get_min_bid(id)?;
    Ok(Json(AmountResponse {
        auction_id: id,
        amount,
    }))
}

async fn highest_bid_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
) -> ApiResult<AmountResponse> {
    let amount = state.house.get_highest_bid(id)?;
    Ok(Json(AmountResponse {
        auction_id: id,
        amount,
    }))
}

async fn auction_status_handler(
    Path(id): Path<AuctionId>,
    State(state): State<AppState>,
) -> ApiResult<AuctionStatus> {
    Ok(Json(state.house.get_status(id)?))
}

/// `GET /auctions/:id/escrow/:bidder`: 0 for unknown pairs, never 404.
async fn escrow_handler(
    Path((id, bidder)): Path<(AuctionId, Principal)>,
    State(state): State<AppState>,
) -> Json<EscrowResponse> {
    let amount = state.house.get_escrow(id, &bidder);
    Json(EscrowResponse {
        auction_id: id,
        bidder,
        amount,
    })
}

/// `GET /events?since=n`
async fn events_handler(
    Query(query): Query<EventsQuery>,
    State(state): State<AppState>,
) -> Json<Vec<EventRecord>> {
    Json(state.events.since(query.since))
}

/// `GET /ws`: pushes every new [`EventRecord`] as a JSON text frame.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(record) => {
                        let payload = match serde_json::to_string(&record) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to serialize ws event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Clients can catch up through GET /events.
                        tracing::warn!(skipped = n, "ws subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    // Push-only channel.
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

/// `POST /dev/mint`: creates (or reassigns) an asset on the in-memory ledger.
async fn mint_handler(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> impl IntoResponse {
    tracing::debug!(asset = %req.asset_ref, owner = %req.owner, "dev mint");
    state.assets.mint(req.asset_ref.clone(), req.owner.clone());
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "asset_ref": req.asset_ref, "owner": req.owner })),
    )
}

/// `POST /dev/fund`: credits an account on the in-memory payment ledger.
async fn fund_handler(
    State(state): State<AppState>,
    Json(req): Json<FundRequest>,
) -> ApiResult<AccountResponse> {
    let balance = state.payments.credit(req.account.clone(), req.amount)?;
    tracing::debug!(account = %req.account, amount = req.amount, balance, "dev fund");
    Ok(Json(AccountResponse {
        principal: req.account,
        balance,
    }))
}

/// `GET /accounts/:principal`
async fn account_handler(
    Path(principal): Path<Principal>,
    State(state): State<AppState>,
) -> Json<AccountResponse> {
    let balance = state.payments.balance_of(&principal);
    Json(AccountResponse { principal, balance })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
