//! Application layer containing the core business logic orchestration.
//!
//! `PaymentEngine` executes the money-moving operations inside scoped ledger
//! transactions; `Reporting` serves the read-only queries next to them.

pub mod engine;
pub mod reporting;
