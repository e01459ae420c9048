//! Scenario and property tests for ccwallet.
//!
//! Wallets here run against an in-memory explorer so balance refreshes,
//! builds and broadcasts can be driven deterministically.

pub mod helpers;
