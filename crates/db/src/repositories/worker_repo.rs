//! Repository for the `workers` table.

use custody_core::types::DbId;
use sqlx::PgPool;

use crate::models::worker::WorkerRow;

/// Column list for `workers` queries.
const COLUMNS: &str = "worker_id, name, department_id";

pub struct WorkerRepo;

impl WorkerRepo {
    /// Find a worker by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workers WHERE worker_id = $1");
        sqlx::query_as::<_, WorkerRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every worker ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<WorkerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workers ORDER BY name ASC, worker_id ASC");
        sqlx::query_as::<_, WorkerRow>(&query)
            .fetch_all(pool)
            .await
    }
}
