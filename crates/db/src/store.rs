//! PostgreSQL implementation of the custody ports.

use std::time::Duration;

use async_trait::async_trait;
use custody_core::asset::Asset;
use custody_core::custody::CustodyRecord;
use custody_core::error::StoreError;
use custody_core::journal::ArrangementEntry;
use custody_core::ports::{AssetCatalog, CustodyLedger, LedgerTransaction, WorkerDirectory};
use custody_core::types::DbId;
use custody_core::worker::Worker;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::classify;
use crate::models::hardware_use::HardwareUse;
use crate::repositories::{ArrangeRepo, HardwareRepo, HardwareUseRepo, WorkerRepo};

/// Catalog, directory, and ledger backed by one connection pool.
///
/// Cloning is cheap: clones share the pool.
#[derive(Debug, Clone)]
pub struct PgCustodyStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgCustodyStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AssetCatalog for PgCustodyStore {
    async fn find_assets(&self, ids: &[DbId]) -> Result<Vec<Asset>, StoreError> {
        let rows = HardwareRepo::find_by_ids(&self.pool, ids)
            .await
            .map_err(classify)?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    async fn asset_exists(&self, id: DbId) -> Result<bool, StoreError> {
        HardwareRepo::exists(&self.pool, id).await.map_err(classify)
    }
}

#[async_trait]
impl WorkerDirectory for PgCustodyStore {
    async fn find_worker(&self, id: DbId) -> Result<Option<Worker>, StoreError> {
        let row = WorkerRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?;
        Ok(row.map(Worker::from))
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError> {
        let rows = WorkerRepo::list(&self.pool).await.map_err(classify)?;
        Ok(rows.into_iter().map(Worker::from).collect())
    }
}

#[async_trait]
impl CustodyLedger for PgCustodyStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        // Scoped to this transaction only.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tracing::debug!(
            lock_timeout_ms = self.lock_timeout.as_millis() as u64,
            "Ledger transaction started"
        );
        Ok(PgTransaction { tx })
    }

    async fn get_custody(&self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError> {
        let rows = HardwareUseRepo::find_by_ids(&self.pool, ids)
            .await
            .map_err(classify)?;
        to_records(rows)
    }

    async fn max_document_number(&self) -> Result<Option<i64>, StoreError> {
        HardwareUseRepo::max_doc_num(&self.pool)
            .await
            .map_err(classify)
    }

    async fn held_by(&self, worker_id: DbId) -> Result<Vec<CustodyRecord>, StoreError> {
        let rows = HardwareUseRepo::list_held_by(&self.pool, worker_id)
            .await
            .map_err(classify)?;
        to_records(rows)
    }

    async fn history(&self, asset_id: DbId) -> Result<Vec<ArrangementEntry>, StoreError> {
        ArrangeRepo::list_for_hardware(&self.pool, asset_id)
            .await
            .map_err(classify)?
            .into_iter()
            .map(ArrangementEntry::try_from)
            .collect()
    }
}

/// An open PostgreSQL transaction. Dropping it rolls back.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgTransaction {
    async fn ensure_custody(&mut self, ids: &[DbId]) -> Result<usize, StoreError> {
        let created = HardwareUseRepo::insert_missing(&mut *self.tx, ids)
            .await
            .map_err(classify)?;
        Ok(created as usize)
    }

    async fn lock_custody(&mut self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError> {
        let rows = HardwareUseRepo::lock_by_ids(&mut *self.tx, ids)
            .await
            .map_err(classify)?;
        to_records(rows)
    }

    async fn upsert_custody(&mut self, records: &[CustodyRecord]) -> Result<(), StoreError> {
        for record in records {
            HardwareUseRepo::upsert(&mut *self.tx, &HardwareUse::from(record))
                .await
                .map_err(classify)?;
        }
        Ok(())
    }

    async fn append_journal(&mut self, entries: &[ArrangementEntry]) -> Result<(), StoreError> {
        for entry in entries {
            ArrangeRepo::insert(&mut *self.tx, entry)
                .await
                .map_err(classify)?;
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(classify)?;
        tracing::debug!("Ledger transaction committed");
        Ok(())
    }
}

fn to_records(rows: Vec<HardwareUse>) -> Result<Vec<CustodyRecord>, StoreError> {
    rows.into_iter().map(CustodyRecord::try_from).collect()
}
