//! Custody rows: one per asset that has ever been arranged.

use custody_core::custody::{CustodyRecord, CustodyState};
use custody_core::error::StoreError;
use custody_core::types::{DbId, DocDate};
use sqlx::FromRow;

use crate::models::status::{HardwareStatus, StatusId};

/// A row from the `hardware_use` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct HardwareUse {
    pub hardware_id: DbId,
    pub employee_id: Option<DbId>,
    pub status_id: StatusId,
    pub doc_num: Option<i64>,
    pub doc_date: Option<DocDate>,
    pub it_worker_id: Option<DbId>,
}

impl TryFrom<HardwareUse> for CustodyRecord {
    type Error = StoreError;

    /// Fails on rows whose status and holder disagree; those are reported,
    /// not repaired.
    fn try_from(row: HardwareUse) -> Result<Self, Self::Error> {
        let status = HardwareStatus::from_id(row.status_id)?;
        let state = CustodyState::from_parts(row.hardware_id, status.into(), row.employee_id)
            .map_err(|e| StoreError::Backend(format!("corrupt custody row: {e}")))?;

        Ok(CustodyRecord {
            asset_id: row.hardware_id,
            state,
            document_number: row.doc_num,
            document_date: row.doc_date,
            operator_id: row.it_worker_id,
        })
    }
}

impl From<&CustodyRecord> for HardwareUse {
    fn from(record: &CustodyRecord) -> Self {
        HardwareUse {
            hardware_id: record.asset_id,
            employee_id: record.holder_id(),
            status_id: HardwareStatus::from(record.status()).id(),
            doc_num: record.document_number,
            doc_date: record.document_date,
            it_worker_id: record.operator_id,
        }
    }
}
