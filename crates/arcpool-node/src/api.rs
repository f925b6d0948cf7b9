//! HTTP API server for the ArcPool node.
//!
//! Read endpoints expose pool status, LP positions, invoices, conversions and
//! the event log. Write endpoints map one-to-one onto ledger operations.
//! Amounts travel as decimal strings, identities as `0x` hex.

use arcpool_core::types::{amount_string, parse_amount};
use arcpool_core::{Address, InvoiceId};
use arcpool_ledger::{
    AuthorizationError, DepositReceipt, ErrorKind, FinancingRecord, FinancingTerms, InvoiceView,
    LedgerError, LpPosition, PoolSummary, RepaymentReceipt, SequencedEvent, WithdrawalReceipt,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::state::NodeState;

const MAX_EVENT_PAGE: usize = 1_000;

// --- Request types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub lp: Address,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub lp: Address,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub lp: Address,
    #[serde(with = "amount_string")]
    pub shares: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinanceRequest {
    pub supplier: Address,
    #[serde(flatten)]
    pub terms: FinancingTerms,
    /// 65-byte `r ‖ s ‖ v` signature as hex.
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepayRequest {
    pub invoice_id: InvoiceId,
    pub payer: Address,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSignerRequest {
    pub caller: Address,
    pub new_signer: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminRequest {
    pub caller: Address,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminRoleRequest {
    pub caller: Address,
    pub account: Address,
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub from: u64,
    #[serde(default = "default_event_limit")]
    pub limit: usize,
}

fn default_event_limit() -> usize {
    100
}

// --- Response types ---

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct ConversionResponse {
    #[serde(with = "amount_string")]
    pub assets: u128,
    #[serde(with = "amount_string")]
    pub shares: u128,
}

#[derive(Serialize)]
pub struct SignerResponse {
    pub old: Address,
    pub new: Address,
}

#[derive(Serialize)]
pub struct PauseResponse {
    pub changed: bool,
    pub paused: bool,
}

#[derive(Serialize)]
pub struct AdminRoleResponse {
    pub account: Address,
    pub changed: bool,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authorization => StatusCode::UNAUTHORIZED,
        ErrorKind::Access => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Replay => StatusCode::CONFLICT,
        ErrorKind::Liquidity => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn ledger_error(e: LedgerError) -> ApiError {
    let kind = e.kind();
    (
        status_for(kind),
        Json(ErrorResponse {
            kind,
            error: e.to_string(),
        }),
    )
}

fn bad_request(error: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            kind: ErrorKind::Validation,
            error,
        }),
    )
}

fn parse_path_address(s: &str) -> Result<Address, ApiError> {
    s.parse().map_err(|e| bad_request(format!("invalid address {s:?}: {e}")))
}

fn parse_path_invoice(s: &str) -> Result<InvoiceId, ApiError> {
    s.parse().map_err(|e| bad_request(format!("invalid invoice id {s:?}: {e}")))
}

fn parse_path_amount(s: &str) -> Result<u128, ApiError> {
    parse_amount(s).map_err(|e| bad_request(e.to_string()))
}

fn decode_signature(s: &str) -> Result<Vec<u8>, ApiError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(trimmed).map_err(|e| {
        ledger_error(AuthorizationError::MalformedSignature(format!("invalid hex: {e}")).into())
    })
}

// --- Read handlers ---

async fn handle_health(State(state): State<Arc<NodeState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn handle_pool(State(state): State<Arc<NodeState>>) -> Json<PoolSummary> {
    Json(state.service.pool_summary())
}

async fn handle_lp(
    State(state): State<Arc<NodeState>>,
    Path(address): Path<String>,
) -> ApiResult<LpPosition> {
    let lp = parse_path_address(&address)?;
    Ok(Json(state.service.lp_position(&lp)))
}

async fn handle_invoice(
    State(state): State<Arc<NodeState>>,
    Path(invoice_id): Path<String>,
) -> ApiResult<InvoiceView> {
    let id = parse_path_invoice(&invoice_id)?;
    Ok(Json(state.service.invoice_view(&id)))
}

async fn handle_shares_for_assets(
    State(state): State<Arc<NodeState>>,
    Path(assets): Path<String>,
) -> ApiResult<ConversionResponse> {
    let assets = parse_path_amount(&assets)?;
    let shares = state.service.shares_for_assets(assets).map_err(ledger_error)?;
    Ok(Json(ConversionResponse { assets, shares }))
}

async fn handle_assets_for_shares(
    State(state): State<Arc<NodeState>>,
    Path(shares): Path<String>,
) -> ApiResult<ConversionResponse> {
    let shares = parse_path_amount(&shares)?;
    let assets = state.service.assets_for_shares(shares).map_err(ledger_error)?;
    Ok(Json(ConversionResponse { assets, shares }))
}

async fn handle_events(
    State(state): State<Arc<NodeState>>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Vec<SequencedEvent>> {
    let limit = query.limit.min(MAX_EVENT_PAGE);
    let events = state
        .service
        .events_since(query.from, limit)
        .map_err(ledger_error)?;
    Ok(Json(events))
}

// --- Write handlers ---

async fn handle_deposit(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<DepositReceipt> {
    state
        .service
        .deposit(req.lp, req.amount)
        .map(Json)
        .map_err(ledger_error)
}

async fn handle_withdraw(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<WithdrawRequest>,
) -> ApiResult<WithdrawalReceipt> {
    state
        .service
        .withdraw_assets(req.lp, req.amount)
        .map(Json)
        .map_err(ledger_error)
}

async fn handle_redeem(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<RedeemRequest>,
) -> ApiResult<WithdrawalReceipt> {
    state
        .service
        .redeem_shares(req.lp, req.shares)
        .map(Json)
        .map_err(ledger_error)
}

async fn handle_finance(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<FinanceRequest>,
) -> ApiResult<FinancingRecord> {
    let signature = decode_signature(&req.signature)?;
    state
        .service
        .withdraw_financing(req.supplier, req.terms, &signature)
        .map(Json)
        .map_err(ledger_error)
}

async fn handle_repay(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<RepayRequest>,
) -> ApiResult<RepaymentReceipt> {
    state
        .service
        .repay(&req.invoice_id, req.payer, req.amount)
        .map(Json)
        .map_err(ledger_error)
}

async fn handle_update_signer(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<UpdateSignerRequest>,
) -> ApiResult<SignerResponse> {
    let old = state
        .service
        .update_signer(&req.caller, req.new_signer)
        .map_err(ledger_error)?;
    Ok(Json(SignerResponse {
        old,
        new: req.new_signer,
    }))
}

async fn handle_pause(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<AdminRequest>,
) -> ApiResult<PauseResponse> {
    let changed = state.service.pause(&req.caller).map_err(ledger_error)?;
    Ok(Json(PauseResponse {
        changed,
        paused: true,
    }))
}

async fn handle_unpause(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<AdminRequest>,
) -> ApiResult<PauseResponse> {
    let changed = state.service.unpause(&req.caller).map_err(ledger_error)?;
    Ok(Json(PauseResponse {
        changed,
        paused: false,
    }))
}

async fn handle_grant_admin(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<AdminRoleRequest>,
) -> ApiResult<AdminRoleResponse> {
    let changed = state
        .service
        .grant_admin(&req.caller, req.account)
        .map_err(ledger_error)?;
    Ok(Json(AdminRoleResponse {
        account: req.account,
        changed,
        is_admin: true,
    }))
}

async fn handle_revoke_admin(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<AdminRoleRequest>,
) -> ApiResult<AdminRoleResponse> {
    let changed = state
        .service
        .revoke_admin(&req.caller, req.account)
        .map_err(ledger_error)?;
    Ok(Json(AdminRoleResponse {
        account: req.account,
        changed,
        is_admin: false,
    }))
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/pool", get(handle_pool))
        .route("/api/v1/lps/{address}", get(handle_lp))
        .route("/api/v1/invoices/{invoice_id}", get(handle_invoice))
        .route("/api/v1/convert/shares/{assets}", get(handle_shares_for_assets))
        .route("/api/v1/convert/assets/{shares}", get(handle_assets_for_shares))
        .route("/api/v1/events", get(handle_events))
        .route("/api/v1/deposits", post(handle_deposit))
        .route("/api/v1/withdrawals", post(handle_withdraw))
        .route("/api/v1/redemptions", post(handle_redeem))
        .route("/api/v1/financings", post(handle_finance))
        .route("/api/v1/repayments", post(handle_repay))
        .route("/api/v1/admin/signer", post(handle_update_signer))
        .route("/api/v1/admin/pause", post(handle_pause))
        .route("/api/v1/admin/unpause", post(handle_unpause))
        .route("/api/v1/admin/admins/grant", post(handle_grant_admin))
        .route("/api/v1/admin/admins/revoke", post(handle_revoke_admin))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
