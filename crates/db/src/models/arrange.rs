//! Journal rows.

use custody_core::error::StoreError;
use custody_core::journal::ArrangementEntry;
use custody_core::types::{DbId, DocDate, Timestamp};
use sqlx::FromRow;

use crate::models::status::{OperationCode, StatusId};

/// A row from the `arranges` table.
#[derive(Debug, Clone, FromRow)]
pub struct Arrange {
    pub arrange_id: DbId,
    pub hardware_id: DbId,
    pub employee_id: DbId,
    pub employee2_id: Option<DbId>,
    pub it_worker_id: DbId,
    pub operation_id: StatusId,
    pub doc_num: i64,
    pub doc_date: DocDate,
    pub log_date: Timestamp,
}

impl TryFrom<Arrange> for ArrangementEntry {
    type Error = StoreError;

    fn try_from(row: Arrange) -> Result<Self, Self::Error> {
        Ok(ArrangementEntry {
            asset_id: row.hardware_id,
            operation: OperationCode::from_id(row.operation_id)?.into(),
            employee_id: row.employee_id,
            second_employee_id: row.employee2_id,
            operator_id: row.it_worker_id,
            document_number: row.doc_num,
            document_date: row.doc_date,
            logged_at: row.log_date,
        })
    }
}
