//! Append-only log of applied arrangements.

use serde::{Deserialize, Serialize};

use crate::arrangement::Operation;
use crate::types::{DbId, DocDate, Timestamp};

/// One line of the journal: one asset moved by one document.
///
/// Written in the same transaction as the custody update, so every custody
/// change has a matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementEntry {
    pub asset_id: DbId,
    pub operation: Operation,
    pub employee_id: DbId,
    pub second_employee_id: Option<DbId>,
    pub operator_id: DbId,
    pub document_number: i64,
    pub document_date: DocDate,
    pub logged_at: Timestamp,
}
