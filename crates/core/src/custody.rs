//! Current custody state of a single asset.
//!
//! The ledger keeps exactly one [`CustodyRecord`] per asset that has ever been
//! arranged. Records are overwritten in place; history lives in the journal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, DocDate};

/// Whether an asset can be handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyStatus {
    Free,
    InUse,
}

impl fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustodyStatus::Free => f.write_str("free"),
            CustodyStatus::InUse => f.write_str("in_use"),
        }
    }
}

/// Status and holder, fused so that "in use" always carries a holder and
/// "free" never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CustodyState {
    Free,
    InUse { holder_id: DbId },
}

/// A stored status/holder pair that does not describe a valid state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("asset {asset_id}: status {status} is inconsistent with holder {holder_id:?}")]
pub struct InvalidCustodyState {
    pub asset_id: DbId,
    pub status: CustodyStatus,
    pub holder_id: Option<DbId>,
}

impl CustodyState {
    pub fn status(self) -> CustodyStatus {
        match self {
            CustodyState::Free => CustodyStatus::Free,
            CustodyState::InUse { .. } => CustodyStatus::InUse,
        }
    }

    pub fn holder_id(self) -> Option<DbId> {
        match self {
            CustodyState::Free => None,
            CustodyState::InUse { holder_id } => Some(holder_id),
        }
    }

    /// Rebuild a state from the two stored columns.
    pub fn from_parts(
        asset_id: DbId,
        status: CustodyStatus,
        holder_id: Option<DbId>,
    ) -> Result<Self, InvalidCustodyState> {
        match (status, holder_id) {
            (CustodyStatus::Free, None) => Ok(CustodyState::Free),
            (CustodyStatus::InUse, Some(holder_id)) => Ok(CustodyState::InUse { holder_id }),
            _ => Err(InvalidCustodyState {
                asset_id,
                status,
                holder_id,
            }),
        }
    }
}

/// The ledger row for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyRecord {
    pub asset_id: DbId,
    #[serde(flatten)]
    pub state: CustodyState,
    /// Number of the last document that changed this record.
    pub document_number: Option<i64>,
    pub document_date: Option<DocDate>,
    /// Operator who signed the last document. Audit only.
    pub operator_id: Option<DbId>,
}

impl CustodyRecord {
    /// The record materialized for an asset that has never been arranged.
    pub fn vacant(asset_id: DbId) -> Self {
        Self {
            asset_id,
            state: CustodyState::Free,
            document_number: None,
            document_date: None,
            operator_id: None,
        }
    }

    pub fn status(&self) -> CustodyStatus {
        self.state.status()
    }

    pub fn holder_id(&self) -> Option<DbId> {
        self.state.holder_id()
    }

    pub fn is_free(&self) -> bool {
        self.state == CustodyState::Free
    }

    pub fn is_held_by(&self, worker_id: DbId) -> bool {
        self.holder_id() == Some(worker_id)
    }
}
