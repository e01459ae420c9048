//! # ccw-core
//! Foundation types and traits for ccwallet.

pub mod address;
pub mod check;
pub mod client;
pub mod constants;
pub mod currency;
pub mod error;
pub mod locale;
pub mod money;
pub mod network;
pub mod types;
