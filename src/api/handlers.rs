//! REST API handlers for ledger operations

use crate::api::auth::{
    AuthError, IndexBody, Nonced, SignedRequest, SubmitBody, ACTION_CONFIRM,
    ACTION_REVOKE, ACTION_SUBMIT,
};
use crate::core::{decode_payload, encode_payload, format_native, Address};
use crate::multisig::{EventRecord, LedgerError, MultisigWallet, Transaction};
use crate::storage::Storage;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
///
/// The wallet lock is the single point of serialization: every mutating
/// handler holds the write guard for the whole operation, from the nonce
/// check to the save.
#[derive(Clone)]
pub struct ApiState {
    pub wallet: Arc<RwLock<MultisigWallet>>,
    pub storage: Arc<Storage>,
}

impl ApiState {
    pub fn new(wallet: MultisigWallet, storage: Storage) -> Self {
        Self {
            wallet: Arc::new(RwLock::new(wallet)),
            storage: Arc::new(storage),
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

fn api_error(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
        }),
    )
}

fn ledger_error(e: LedgerError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        LedgerError::NotOwner(_) => StatusCode::FORBIDDEN,
        LedgerError::InvalidIndex(_) => StatusCode::NOT_FOUND,
        LedgerError::AlreadyConfirmed { .. }
        | LedgerError::NotConfirmed { .. }
        | LedgerError::AlreadyExecuted(_) => StatusCode::CONFLICT,
        LedgerError::ExecutionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::InvalidThreshold(_)
        | LedgerError::NoOwners
        | LedgerError::DuplicateOwner(_) => StatusCode::BAD_REQUEST,
        LedgerError::CorruptLedger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

fn auth_error(e: AuthError) -> (StatusCode, Json<ApiError>) {
    api_error(StatusCode::UNAUTHORIZED, e)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub address: Address,
    pub owners: Vec<Address>,
    pub required: usize,
    pub description: String,
    pub transaction_count: usize,
    pub pending: usize,
    pub executed: usize,
    pub balance: u128,
    pub balance_formatted: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub index: usize,
    pub destination: Address,
    pub value: u128,
    pub value_formatted: String,
    pub data: String,
    pub executed: bool,
    pub confirmations: usize,
    pub required: usize,
    pub confirmed_by: Vec<Address>,
    pub status: String,
    pub submitted_by: Address,
    pub submitted_at: String,
    pub executed_at: Option<String>,
    pub last_failure: Option<String>,
}

impl TransactionInfo {
    fn from_wallet(wallet: &MultisigWallet, tx: &Transaction) -> Self {
        let required = wallet.ledger.required_confirmations();
        Self {
            index: tx.index,
            destination: *tx.destination(),
            value: tx.value(),
            value_formatted: format_native(tx.value()),
            data: encode_payload(tx.data()),
            executed: tx.executed,
            confirmations: tx.confirmation_count(),
            required,
            confirmed_by: wallet.ledger.confirmations(tx.index).unwrap_or_default(),
            status: format!("{:?}", tx.status(required)),
            submitted_by: tx.submitted_by,
            submitted_at: tx.submitted_at.to_rfc3339(),
            executed_at: tx.executed_at.map(|t| t.to_rfc3339()),
            last_failure: tx.last_failure.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub index: usize,
    pub executed: bool,
    pub confirmations: usize,
    pub required: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub balance: u128,
    pub balance_formatted: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub from: Address,
    pub amount: u128,
}

// ============================================================================
// Helpers
// ============================================================================

/// Verify a signed request from an owner and consume its nonce
///
/// Non-owners are rejected before their nonce is looked at, so only owners
/// ever get an entry in the persisted registry.
fn authenticate<T: Serialize + Nonced>(
    wallet: &mut MultisigWallet,
    action: &str,
    request: &SignedRequest<T>,
) -> Result<Address, (StatusCode, Json<ApiError>)> {
    let caller = request.verify(action).map_err(|e| {
        log::debug!("Rejected {} request: {}", action, e);
        auth_error(e)
    })?;

    if !wallet.ledger.is_owner(&caller) {
        return Err(ledger_error(LedgerError::NotOwner(caller)));
    }

    wallet
        .nonces
        .check_and_record(caller, request.body.nonce())
        .map_err(|e| auth_error(e.into()))?;

    Ok(caller)
}

/// Write the wallet to disk
///
/// Called after every accepted nonce, whether or not the ledger operation
/// that followed succeeded.
fn persist(state: &ApiState, wallet: &MultisigWallet) {
    if let Err(e) = state.storage.save(wallet) {
        log::error!("Failed to save ledger: {}", e);
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/ledger - Owners, threshold and counters
pub async fn get_ledger_info(State(state): State<ApiState>) -> Json<LedgerInfo> {
    let wallet = state.wallet.read().await;
    let status = wallet.ledger.status();
    let balance = wallet.balance();

    Json(LedgerInfo {
        address: status.address,
        owners: status.owners,
        required: status.required,
        description: wallet.ledger.owner_set().description(),
        transaction_count: status.transaction_count,
        pending: status.pending,
        executed: status.executed,
        balance,
        balance_formatted: format_native(balance),
    })
}

/// GET /api/transactions - All transactions in index order
pub async fn list_transactions(State(state): State<ApiState>) -> Json<Vec<TransactionInfo>> {
    let wallet = state.wallet.read().await;
    Json(
        wallet
            .ledger
            .transactions()
            .iter()
            .map(|tx| TransactionInfo::from_wallet(&wallet, tx))
            .collect(),
    )
}

/// GET /api/transactions/pending - Unexecuted transactions
pub async fn list_pending(State(state): State<ApiState>) -> Json<Vec<TransactionInfo>> {
    let wallet = state.wallet.read().await;
    Json(
        wallet
            .ledger
            .pending_transactions()
            .into_iter()
            .map(|tx| TransactionInfo::from_wallet(&wallet, tx))
            .collect(),
    )
}

/// GET /api/transactions/{index}
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
) -> ApiResult<TransactionInfo> {
    let wallet = state.wallet.read().await;
    let tx = wallet.ledger.transaction(index).map_err(ledger_error)?;
    Ok(Json(TransactionInfo::from_wallet(&wallet, tx)))
}

/// GET /api/transactions/{index}/confirmations
pub async fn get_confirmations(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
) -> ApiResult<Vec<Address>> {
    let wallet = state.wallet.read().await;
    let confirmations = wallet.ledger.confirmations(index).map_err(ledger_error)?;
    Ok(Json(confirmations))
}

/// POST /api/transactions - Submit a signed proposal
pub async fn submit_transaction(
    State(state): State<ApiState>,
    Json(request): Json<SignedRequest<SubmitBody>>,
) -> ApiResult<TransactionInfo> {
    let data = decode_payload(&request.body.data)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid data: {}", e)))?;
    let mut wallet = state.wallet.write().await;
    let caller = authenticate(&mut wallet, ACTION_SUBMIT, &request)?;
    let body = request.body;
    let result = wallet.submit(&caller, body.destination, body.value, data);
    persist(&state, &wallet);

    let index = result.map_err(ledger_error)?;
    let tx = wallet.ledger.transaction(index).map_err(ledger_error)?;
    Ok(Json(TransactionInfo::from_wallet(&wallet, tx)))
}

/// POST /api/transactions/{index}/confirm
pub async fn confirm_transaction(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
    Json(request): Json<SignedRequest<IndexBody>>,
) -> ApiResult<ConfirmationResponse> {
    if request.body.index != index {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Signed index does not match path",
        ));
    }
    let mut wallet = state.wallet.write().await;
    let caller = authenticate(&mut wallet, ACTION_CONFIRM, &request)?;
    let result = wallet.confirm(&caller, index);
    persist(&state, &wallet);

    let outcome = result.map_err(ledger_error)?;
    Ok(Json(ConfirmationResponse {
        index,
        executed: outcome.executed,
        confirmations: outcome.confirmations,
        required: wallet.ledger.required_confirmations(),
    }))
}

/// POST /api/transactions/{index}/revoke
pub async fn revoke_confirmation(
    State(state): State<ApiState>,
    Path(index): Path<usize>,
    Json(request): Json<SignedRequest<IndexBody>>,
) -> ApiResult<ConfirmationResponse> {
    if request.body.index != index {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Signed index does not match path",
        ));
    }
    let mut wallet = state.wallet.write().await;
    let caller = authenticate(&mut wallet, ACTION_REVOKE, &request)?;
    let result = wallet.revoke(&caller, index);
    persist(&state, &wallet);

    let confirmations = result.map_err(ledger_error)?;
    Ok(Json(ConfirmationResponse {
        index,
        executed: false,
        confirmations,
        required: wallet.ledger.required_confirmations(),
    }))
}

/// POST /api/deposit - Send native funds to the wallet
pub async fn deposit(
    State(state): State<ApiState>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<DepositResponse> {
    if req.amount == 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "Deposit amount must be positive"));
    }

    let mut wallet = state.wallet.write().await;
    let balance = wallet.deposit(req.from, req.amount);
    if let Err(e) = state.storage.save(&wallet) {
        log::error!("Failed to save ledger: {}", e);
    }

    Ok(Json(DepositResponse {
        balance,
        balance_formatted: format_native(balance),
    }))
}

/// GET /api/events - Audit log
pub async fn list_events(State(state): State<ApiState>) -> Json<Vec<EventRecord>> {
    let wallet = state.wallet.read().await;
    Json(wallet.ledger.events().to_vec())
}
