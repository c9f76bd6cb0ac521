//! Storage-facing traits consumed by the engine and the query service.
//!
//! `custody-db` implements them on PostgreSQL; [`crate::memory`] implements
//! them in process for tests and local runs.

use async_trait::async_trait;

use crate::asset::Asset;
use crate::custody::CustodyRecord;
use crate::error::StoreError;
use crate::journal::ArrangementEntry;
use crate::types::DbId;
use crate::worker::Worker;

/// Read-only hardware catalog.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// Catalog entries for `ids`. Unknown ids are skipped; order is unspecified.
    async fn find_assets(&self, ids: &[DbId]) -> Result<Vec<Asset>, StoreError>;

    async fn asset_exists(&self, id: DbId) -> Result<bool, StoreError>;
}

/// Read-only worker directory.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn find_worker(&self, id: DbId) -> Result<Option<Worker>, StoreError>;

    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError>;
}

/// The custody ledger: current state per asset plus the journal.
///
/// Reads on the ledger itself see committed data only. All writes go
/// through a [`LedgerTransaction`].
#[async_trait]
pub trait CustodyLedger: Send + Sync {
    type Tx: LedgerTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Committed records for `ids`. Assets never arranged have no record.
    async fn get_custody(&self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError>;

    /// Highest document number on any record, `None` when nothing is numbered.
    async fn max_document_number(&self) -> Result<Option<i64>, StoreError>;

    /// In-use records held by `worker_id`, ordered by asset id.
    async fn held_by(&self, worker_id: DbId) -> Result<Vec<CustodyRecord>, StoreError>;

    /// Journal entries for `asset_id`, newest first.
    async fn history(&self, asset_id: DbId) -> Result<Vec<ArrangementEntry>, StoreError>;
}

/// One atomic unit of work against the ledger.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// every write made through it.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Create a free, holder-less record for each id that has none.
    /// Returns how many records were created.
    async fn ensure_custody(&mut self, ids: &[DbId]) -> Result<usize, StoreError>;

    /// Read the records for `ids` and hold them exclusively until the
    /// transaction ends. Order is unspecified.
    async fn lock_custody(&mut self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError>;

    /// Overwrite the given records as one batch.
    async fn upsert_custody(&mut self, records: &[CustodyRecord]) -> Result<(), StoreError>;

    async fn append_journal(&mut self, entries: &[ArrangementEntry]) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
