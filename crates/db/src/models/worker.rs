//! Worker directory rows.

use custody_core::types::DbId;
use sqlx::FromRow;

/// A row from the `workers` table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkerRow {
    pub worker_id: DbId,
    pub name: String,
    pub department_id: DbId,
}

impl From<WorkerRow> for custody_core::worker::Worker {
    fn from(row: WorkerRow) -> Self {
        Self {
            id: row.worker_id,
            name: row.name,
            department_id: row.department_id,
        }
    }
}
