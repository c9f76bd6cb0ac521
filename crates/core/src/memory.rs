//! In-process implementation of every port.
//!
//! A transaction owns the store's mutex from `begin` until it is committed or
//! dropped, so transactions are fully serialized. Writes are staged inside the
//! transaction and only reach the store on commit.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::asset::Asset;
use crate::custody::CustodyRecord;
use crate::error::StoreError;
use crate::journal::ArrangementEntry;
use crate::ports::{AssetCatalog, CustodyLedger, LedgerTransaction, WorkerDirectory};
use crate::types::DbId;
use crate::worker::Worker;

#[derive(Debug, Default)]
struct StoreState {
    assets: BTreeMap<DbId, Asset>,
    workers: BTreeMap<DbId, Worker>,
    custody: BTreeMap<DbId, CustodyRecord>,
    journal: Vec<ArrangementEntry>,
    /// Errors handed out by upcoming commits, oldest first.
    commit_faults: VecDeque<StoreError>,
}

/// Shared in-memory catalog, directory, and ledger. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_asset(&self, asset: Asset) {
        self.state.lock().await.assets.insert(asset.id, asset);
    }

    pub async fn add_worker(&self, worker: Worker) {
        self.state.lock().await.workers.insert(worker.id, worker);
    }

    /// Seed a custody record directly, bypassing the engine.
    pub async fn put_custody(&self, record: CustodyRecord) {
        self.state
            .lock()
            .await
            .custody
            .insert(record.asset_id, record);
    }

    /// All committed custody records, ordered by asset id.
    pub async fn custody_snapshot(&self) -> Vec<CustodyRecord> {
        self.state.lock().await.custody.values().cloned().collect()
    }

    /// All committed journal entries, oldest first.
    pub async fn journal_snapshot(&self) -> Vec<ArrangementEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Make the next commit fail with `error`. Queued faults are consumed one
    /// per commit.
    pub async fn fail_next_commit(&self, error: StoreError) {
        self.state.lock().await.commit_faults.push_back(error);
    }
}

#[async_trait]
impl AssetCatalog for InMemoryStore {
    async fn find_assets(&self, ids: &[DbId]) -> Result<Vec<Asset>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.assets.get(id).cloned())
            .collect())
    }

    async fn asset_exists(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.assets.contains_key(&id))
    }
}

#[async_trait]
impl WorkerDirectory for InMemoryStore {
    async fn find_worker(&self, id: DbId) -> Result<Option<Worker>, StoreError> {
        Ok(self.state.lock().await.workers.get(&id).cloned())
    }

    async fn list_workers(&self) -> Result<Vec<Worker>, StoreError> {
        Ok(self.state.lock().await.workers.values().cloned().collect())
    }
}

#[async_trait]
impl CustodyLedger for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction, StoreError> {
        Ok(InMemoryTransaction {
            state: self.state.clone().lock_owned().await,
            custody: BTreeMap::new(),
            journal: Vec::new(),
        })
    }

    async fn get_custody(&self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.custody.get(id).cloned())
            .collect())
    }

    async fn max_document_number(&self) -> Result<Option<i64>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .custody
            .values()
            .filter_map(|r| r.document_number)
            .max())
    }

    async fn held_by(&self, worker_id: DbId) -> Result<Vec<CustodyRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .custody
            .values()
            .filter(|r| r.is_held_by(worker_id))
            .cloned()
            .collect())
    }

    async fn history(&self, asset_id: DbId) -> Result<Vec<ArrangementEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .journal
            .iter()
            .rev()
            .filter(|e| e.asset_id == asset_id)
            .cloned()
            .collect())
    }
}

/// Exclusive handle on an [`InMemoryStore`] with staged writes.
pub struct InMemoryTransaction {
    state: OwnedMutexGuard<StoreState>,
    custody: BTreeMap<DbId, CustodyRecord>,
    journal: Vec<ArrangementEntry>,
}

impl InMemoryTransaction {
    fn current(&self, id: DbId) -> Option<&CustodyRecord> {
        self.custody.get(&id).or_else(|| self.state.custody.get(&id))
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn ensure_custody(&mut self, ids: &[DbId]) -> Result<usize, StoreError> {
        let mut created = 0;
        for &id in ids {
            if self.current(id).is_none() {
                self.custody.insert(id, CustodyRecord::vacant(id));
                created += 1;
            }
        }
        Ok(created)
    }

    async fn lock_custody(&mut self, ids: &[DbId]) -> Result<Vec<CustodyRecord>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|&id| self.current(id).cloned())
            .collect())
    }

    async fn upsert_custody(&mut self, records: &[CustodyRecord]) -> Result<(), StoreError> {
        for record in records {
            self.custody.insert(record.asset_id, record.clone());
        }
        Ok(())
    }

    async fn append_journal(&mut self, entries: &[ArrangementEntry]) -> Result<(), StoreError> {
        self.journal.extend_from_slice(entries);
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut state,
            custody,
            journal,
        } = self;

        if let Some(fault) = state.commit_faults.pop_front() {
            return Err(fault);
        }
        state.custody.extend(custody);
        state.journal.extend(journal);
        Ok(())
    }
}
