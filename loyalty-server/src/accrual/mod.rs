//! External accrual service integration
//!
//! A thin, typed wrapper over the upstream HTTP contract. One request per
//! call, no internal retry: retrying across cycles is the reconciler's
//! job, so an error here is a classification, not a failure mode.

mod client;

pub use client::{AccrualClient, AccrualError, AccrualReply};
