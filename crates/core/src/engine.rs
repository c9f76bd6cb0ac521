//! The arrangement engine: validates custody documents against the ledger and
//! applies them atomically.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::arrangement::{Arrangement, ArrangementOutcome, ArrangementRequest};
use crate::config::CustodyConfig;
use crate::custody::CustodyRecord;
use crate::error::{CustodyError, StoreError};
use crate::ports::{AssetCatalog, CustodyLedger, LedgerTransaction, WorkerDirectory};
use crate::types::DbId;

/// Processes [`ArrangementRequest`]s.
///
/// Holds the three collaborators it reads from. A single store value that
/// implements every port can be passed three times (stores are cheap to clone).
pub struct ArrangementEngine<C, W, L> {
    catalog: C,
    directory: W,
    ledger: L,
    config: CustodyConfig,
}

impl<C, W, L> ArrangementEngine<C, W, L>
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

    /// Validate and apply one request.
    ///
    /// `Ok` carries both successes and business-rule rejections. `Err` means
    /// the request was malformed, referenced something unknown, or the ledger
    /// failed; in every error case the ledger is left untouched.
    pub async fn process(
        &self,
        request: ArrangementRequest,
    ) -> Result<ArrangementOutcome, CustodyError> {
        let arrangement = Arrangement::try_from(request)?;
        tracing::debug!(
            operation = %arrangement.operation(),
            doc_num = arrangement.document_number,
            asset_count = arrangement.asset_ids.len(),
            "Arrangement received",
        );

        self.check_references(&arrangement).await?;

        let mut attempt = 0;
        loop {
            match self.arrange(&arrangement).await {
                Ok(outcome) => return Ok(outcome),
                Err(StoreError::Conflict(msg)) if attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    tracing::warn!(
                        doc_num = arrangement.document_number,
                        attempt,
                        error = %msg,
                        "Ledger conflict, retrying arrangement",
                    );
                }
                Err(e) => {
                    tracing::error!(
                        doc_num = arrangement.document_number,
                        error = %e,
                        "Arrangement aborted by ledger failure",
                    );
                    return Err(CustodyError::Persistence(e));
                }
            }
        }
    }

    /// Every asset must be in the catalog and every named worker in the
    /// directory. Reports the first miss in request order.
    async fn check_references(&self, arrangement: &Arrangement) -> Result<(), CustodyError> {
        let found: HashSet<DbId> = self
            .catalog
            .find_assets(&arrangement.asset_ids)
            .await?
            .into_iter()
            .map(|asset| asset.id)
            .collect();

        if let Some(&missing) = arrangement.asset_ids.iter().find(|id| !found.contains(id)) {
            return Err(CustodyError::NotFound {
                entity: "hardware",
                id: missing,
            });
        }

        let directive = &arrangement.directive;
        let mut workers = vec![arrangement.operator_id, directive.employee_id()];
        workers.extend(directive.second_employee_id());

        for worker_id in workers {
            if self.directory.find_worker(worker_id).await?.is_none() {
                return Err(CustodyError::NotFound {
                    entity: "worker",
                    id: worker_id,
                });
            }
        }

        Ok(())
    }

    /// One transactional attempt: materialize, lock, validate, transition.
    async fn arrange(&self, arrangement: &Arrangement) -> Result<ArrangementOutcome, StoreError> {
        let ids = &arrangement.asset_ids;
        let mut tx = self.ledger.begin().await?;

        let created = tx.ensure_custody(ids).await?;
        let records = in_request_order(ids, tx.lock_custody(ids).await?)?;

        if let Some(rejection) = arrangement.directive.check(&records) {
            // Only the default records are pending; keep them so the ledger
            // stays dense, otherwise roll back by dropping.
            if created > 0 {
                tx.commit().await?;
            }
            tracing::warn!(
                operation = %arrangement.operation(),
                doc_num = arrangement.document_number,
                reason = ?rejection.reason,
                asset_ids = ?rejection.asset_ids,
                "Arrangement rejected",
            );
            return Ok(ArrangementOutcome::rejected(rejection));
        }

        let updated: Vec<_> = records.iter().map(|r| arrangement.apply(r)).collect();
        tx.upsert_custody(&updated).await?;
        tx.append_journal(&arrangement.journal_entries(Utc::now())).await?;
        tx.commit().await?;

        tracing::info!(
            operation = %arrangement.operation(),
            doc_num = arrangement.document_number,
            operator_id = arrangement.operator_id,
            asset_count = updated.len(),
            "Arrangement applied",
        );
        Ok(ArrangementOutcome::completed())
    }
}

/// Reorder locked records to match `ids`. A missing record after
/// `ensure_custody` means the backend lost a row.
fn in_request_order(
    ids: &[DbId],
    records: Vec<CustodyRecord>,
) -> Result<Vec<CustodyRecord>, StoreError> {
    let mut by_id: HashMap<DbId, _> = records.into_iter().map(|r| (r.asset_id, r)).collect();
    ids.iter()
        .map(|id| {
            by_id.remove(id).ok_or_else(|| {
                StoreError::Backend(format!("custody record for asset {id} vanished"))
            })
        })
        .collect()
}
