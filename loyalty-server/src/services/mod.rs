//! Business services
//!
//! Synchronous request paths (order submission, withdrawal) and the
//! background reconciliation worker. Handlers call these; these call the
//! repositories and the accrual client.

pub mod order_service;
pub mod reconciler;
pub mod withdrawal_service;

pub use order_service::{OrderService, SubmitOutcome};
pub use reconciler::Reconciler;
pub use withdrawal_service::WithdrawalService;
