//! Repository for the `hardware_use` table (the custody ledger).

use custody_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::hardware_use::HardwareUse;
use crate::models::status::HardwareStatus;

/// Column list for `hardware_use` queries.
const COLUMNS: &str = "hardware_id, employee_id, status_id, doc_num, doc_date, it_worker_id";

pub struct HardwareUseRepo;

impl HardwareUseRepo {
    // ── Queries ──────────────────────────────────────────────────────────

    /// Custody rows for `ids`, ordered by id. Ids without a row are skipped.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<HardwareUse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hardware_use \
             WHERE hardware_id = ANY($1) \
             ORDER BY hardware_id"
        );
        sqlx::query_as::<_, HardwareUse>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Rows currently in use by `employee_id`, ordered by hardware id.
    pub async fn list_held_by(
        pool: &PgPool,
        employee_id: DbId,
    ) -> Result<Vec<HardwareUse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hardware_use \
             WHERE employee_id = $1 AND status_id = $2 \
             ORDER BY hardware_id"
        );
        sqlx::query_as::<_, HardwareUse>(&query)
            .bind(employee_id)
            .bind(HardwareStatus::InUse.id())
            .fetch_all(pool)
            .await
    }

    /// Highest document number on record, `None` when no row carries one.
    pub async fn max_doc_num(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(doc_num) FROM hardware_use")
            .fetch_one(pool)
            .await
    }

    // ── Transactional ────────────────────────────────────────────────────

    /// Insert a free row for every id that has none. Returns how many were
    /// created. Inserts go in ascending id order, same as [`Self::lock_by_ids`].
    pub async fn insert_missing(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO hardware_use (hardware_id, status_id) \
             SELECT DISTINCT id, $2::SMALLINT FROM UNNEST($1::BIGINT[]) AS t(id) \
             ORDER BY id \
             ON CONFLICT (hardware_id) DO NOTHING",
        )
        .bind(ids)
        .bind(HardwareStatus::Free.id())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Lock the rows for `ids` until the transaction ends.
    ///
    /// Rows are locked in ascending id order so two overlapping batches
    /// cannot deadlock on each other.
    pub async fn lock_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<HardwareUse>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hardware_use \
             WHERE hardware_id = ANY($1) \
             ORDER BY hardware_id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, HardwareUse>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    /// Write `row`, replacing any existing row for the same hardware.
    pub async fn upsert(conn: &mut PgConnection, row: &HardwareUse) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO hardware_use \
                (hardware_id, employee_id, status_id, doc_num, doc_date, it_worker_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (hardware_id) DO UPDATE SET \
                employee_id = EXCLUDED.employee_id, \
                status_id = EXCLUDED.status_id, \
                doc_num = EXCLUDED.doc_num, \
                doc_date = EXCLUDED.doc_date, \
                it_worker_id = EXCLUDED.it_worker_id",
        )
        .bind(row.hardware_id)
        .bind(row.employee_id)
        .bind(row.status_id)
        .bind(row.doc_num)
        .bind(row.doc_date)
        .bind(row.it_worker_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
