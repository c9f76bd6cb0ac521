//! Row structs for the custody tables.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! the conversion into the matching `custody_core` type. Conversions that can
//! meet invalid data return [`StoreError::Backend`](custody_core::error::StoreError).

pub mod arrange;
pub mod hardware;
pub mod hardware_use;
pub mod status;
pub mod worker;
