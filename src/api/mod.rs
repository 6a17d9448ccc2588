//! REST API module
//!
//! Provides HTTP access to the multisig ledger. Mutating transaction calls
//! must be signed by an owner key (see [`auth`]).
//!
//! # Endpoints
//!
//! ## Ledger
//! - `GET /api/ledger` - Owners, threshold, counters and balance
//! - `GET /api/events` - Audit log
//! - `POST /api/deposit` - Fund the wallet
//!
//! ## Transactions
//! - `GET /api/transactions` - List all transactions
//! - `GET /api/transactions/pending` - List unexecuted transactions
//! - `GET /api/transactions/{index}` - Get transaction
//! - `GET /api/transactions/{index}/confirmations` - Confirming owners
//! - `POST /api/transactions` - Submit (signed)
//! - `POST /api/transactions/{index}/confirm` - Confirm (signed)
//! - `POST /api/transactions/{index}/revoke` - Revoke confirmation (signed)

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{IndexBody, SignedRequest, SubmitBody};
pub use handlers::ApiState;
pub use routes::create_router;
