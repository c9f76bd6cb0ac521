//! Hardware custody domain logic.
//!
//! Tracks which worker holds which piece of hardware. The centre of the crate
//! is the arrangement state machine in [`arrangement`] (pure rules) and
//! [`engine`] (applies them inside a ledger transaction). Storage is reached
//! only through the traits in [`ports`].

pub mod arrangement;
pub mod asset;
pub mod config;
pub mod custody;
pub mod engine;
pub mod error;
pub mod journal;
pub mod memory;
pub mod ports;
pub mod query;
pub mod types;
pub mod worker;
