//! Repository for the `arranges` journal table. Append-only.

use custody_core::journal::ArrangementEntry;
use custody_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::arrange::Arrange;
use crate::models::status::OperationCode;

/// Column list for `arranges` queries.
const COLUMNS: &str = "\
    arrange_id, hardware_id, employee_id, employee2_id, it_worker_id, \
    operation_id, doc_num, doc_date, log_date";

pub struct ArrangeRepo;

impl ArrangeRepo {
    /// Append one journal row.
    pub async fn insert(conn: &mut PgConnection, entry: &ArrangementEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO arranges \
                (hardware_id, employee_id, employee2_id, it_worker_id, \
                 operation_id, doc_num, doc_date, log_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.asset_id)
        .bind(entry.employee_id)
        .bind(entry.second_employee_id)
        .bind(entry.operator_id)
        .bind(OperationCode::from(entry.operation).id())
        .bind(entry.document_number)
        .bind(entry.document_date)
        .bind(entry.logged_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Journal rows for one piece of hardware, newest first.
    pub async fn list_for_hardware(
        pool: &PgPool,
        hardware_id: DbId,
    ) -> Result<Vec<Arrange>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM arranges \
             WHERE hardware_id = $1 \
             ORDER BY log_date DESC, arrange_id DESC"
        );
        sqlx::query_as::<_, Arrange>(&query)
            .bind(hardware_id)
            .fetch_all(pool)
            .await
    }
}
