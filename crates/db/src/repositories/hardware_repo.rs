//! Repository for the `hardware` table. Read-only: the catalog is maintained
//! elsewhere.

use custody_core::types::DbId;
use sqlx::PgPool;

use crate::models::hardware::Hardware;

/// Column list for `hardware` queries.
const COLUMNS: &str = "\
    hardware_id, name, id_type, id_brand, id_condition, \
    serial_num, descrip, validation_date";

pub struct HardwareRepo;

impl HardwareRepo {
    /// Fetch the hardware rows for `ids`, ordered by id. Unknown ids are skipped.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Hardware>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hardware \
             WHERE hardware_id = ANY($1) \
             ORDER BY hardware_id"
        );
        sqlx::query_as::<_, Hardware>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM hardware WHERE hardware_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
