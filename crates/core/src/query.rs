//! Read-only queries: the pre-arrange view, asset history, worker holdings.
//!
//! Nothing here writes to the ledger. In particular [`QueryService::prepare`]
//! never materializes custody records, unlike the engine.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;

use crate::arrangement::{operation_catalog, OperationOption};
use crate::asset::Asset;
use crate::config::CustodyConfig;
use crate::custody::CustodyRecord;
use crate::error::{CustodyError, StoreError};
use crate::journal::ArrangementEntry;
use crate::ports::{AssetCatalog, CustodyLedger, WorkerDirectory};
use crate::types::{DbId, DocDate};
use crate::worker::{partition_workers, Worker};

/// Everything the transfer form needs before a document is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct PrearrangeView {
    /// Selected hardware found in the catalog, in selection order.
    pub assets: Vec<Asset>,
    /// Selected ids the catalog does not know. Shown as a warning.
    pub missing_asset_ids: Vec<DbId>,
    /// Current custody of the selected hardware. Hardware that was never
    /// arranged has no entry and is free.
    pub custody: Vec<CustodyRecord>,
    pub operators: Vec<Worker>,
    pub employees: Vec<Worker>,
    pub next_document_number: i64,
    pub document_date: DocDate,
    pub operations: Vec<OperationOption>,
}

/// Number for the next document: one past the highest, or 1 on an empty ledger.
/// `None` when the highest number has no successor.
pub fn next_document_number(max_existing: Option<i64>) -> Option<i64> {
    match max_existing {
        Some(max) if max > 0 => max.checked_add(1),
        _ => Some(1),
    }
}

pub struct QueryService<C, W, L> {
    catalog: C,
    directory: W,
    ledger: L,
    config: CustodyConfig,
}

impl<C, W, L> QueryService<C, W, L>
where
    C: AssetCatalog,
    W: WorkerDirectory,
    L: CustodyLedger,
{
    pub fn new(catalog: C, directory: W, ledger: L, config: CustodyConfig) -> Self {
        Self {
            catalog,
            directory,
            ledger,
            config,
        }
    }

    /// Assemble the choice sets for `asset_ids`.
    ///
    /// An empty selection is [`CustodyError::Malformed`]: there is nothing to
    /// arrange and the caller should not show the form.
    pub async fn prepare(&self, asset_ids: &[DbId]) -> Result<PrearrangeView, CustodyError> {
        if asset_ids.is_empty() {
            return Err(CustodyError::Malformed("no hardware selected".into()));
        }

        let mut found: HashMap<DbId, Asset> = self
            .catalog
            .find_assets(asset_ids)
            .await?
            .into_iter()
            .map(|asset| (asset.id, asset))
            .collect();

        // Repeated ids count once, first occurrence wins.
        let mut seen = HashSet::with_capacity(asset_ids.len());
        let mut assets = Vec::with_capacity(found.len());
        let mut missing_asset_ids = Vec::new();
        for &id in asset_ids.iter().filter(|id| seen.insert(**id)) {
            match found.remove(&id) {
                Some(asset) => assets.push(asset),
                None => missing_asset_ids.push(id),
            }
        }
        if !missing_asset_ids.is_empty() {
            tracing::warn!(
                missing = ?missing_asset_ids,
                "Selected hardware not found in catalog",
            );
        }

        let resolved: Vec<DbId> = assets.iter().map(|a| a.id).collect();
        let custody = if resolved.is_empty() {
            Vec::new()
        } else {
            let position: HashMap<DbId, usize> =
                resolved.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            let mut records = self.ledger.get_custody(&resolved).await?;
            records.sort_by_key(|r| position.get(&r.asset_id).copied());
            records
        };

        let partition = partition_workers(
            self.directory.list_workers().await?,
            self.config.operator_department_id,
        );
        let max_existing = self.ledger.max_document_number().await?;
        let next = next_document_number(max_existing).ok_or_else(|| {
            tracing::error!(max_existing, "Document numbers exhausted");
            StoreError::Backend(format!(
                "no document number follows {}",
                max_existing.unwrap_or_default()
            ))
        })?;

        Ok(PrearrangeView {
            assets,
            missing_asset_ids,
            custody,
            operators: partition.operators,
            employees: partition.employees,
            next_document_number: next,
            document_date: Utc::now().date_naive(),
            operations: operation_catalog(),
        })
    }

    /// Journal of `asset_id`, newest first.
    pub async fn history(&self, asset_id: DbId) -> Result<Vec<ArrangementEntry>, CustodyError> {
        if !self.catalog.asset_exists(asset_id).await? {
            return Err(CustodyError::NotFound {
                entity: "hardware",
                id: asset_id,
            });
        }
        Ok(self.ledger.history(asset_id).await?)
    }

    /// Hardware currently held by `worker_id`.
    pub async fn holdings(&self, worker_id: DbId) -> Result<Vec<CustodyRecord>, CustodyError> {
        if self.directory.find_worker(worker_id).await?.is_none() {
            return Err(CustodyError::NotFound {
                entity: "worker",
                id: worker_id,
            });
        }
        Ok(self.ledger.held_by(worker_id).await?)
    }
}
