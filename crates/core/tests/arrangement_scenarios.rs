//! Arrangement engine and query service against the in-memory store.
//!
//! Covers the documented scenarios plus the ledger invariants:
//! - status IN_USE iff a holder is set
//! - rejected requests never change existing records
//! - a batch is applied completely or not at all
//! - storage failures are errors, never rejections

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use custody_core::arrangement::{
    ArrangementRequest, Operation, OutcomeStatus, RejectionReason, Severity,
};
use custody_core::asset::Asset;
use custody_core::config::CustodyConfig;
use custody_core::custody::{CustodyRecord, CustodyState, CustodyStatus};
use custody_core::engine::ArrangementEngine;
use custody_core::error::{CustodyError, StoreError};
use custody_core::memory::InMemoryStore;
use custody_core::query::QueryService;
use custody_core::types::DbId;
use custody_core::worker::Worker;

type Engine = ArrangementEngine<InMemoryStore, InMemoryStore, InMemoryStore>;
type Queries = QueryService<InMemoryStore, InMemoryStore, InMemoryStore>;

const OPERATOR: DbId = 1;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn doc_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn asset(id: DbId) -> Asset {
    Asset {
        id,
        name: format!("Laptop {id}"),
        type_id: 1,
        brand_id: 1,
        condition_id: 1,
        serial_number: Some(format!("SN-{id}")),
        validation_date: doc_date(),
        description: None,
    }
}

fn worker(id: DbId, name: &str, department_id: DbId) -> Worker {
    Worker {
        id,
        name: name.to_string(),
        department_id,
    }
}

fn held(asset_id: DbId, holder_id: DbId, doc_num: i64) -> CustodyRecord {
    CustodyRecord {
        asset_id,
        state: CustodyState::InUse { holder_id },
        document_number: Some(doc_num),
        document_date: Some(doc_date()),
        operator_id: Some(OPERATOR),
    }
}

/// Store with assets 10..=13, operator 1 and employees 5, 6, 7, 9.
async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    for id in 10..=13 {
        store.add_asset(asset(id)).await;
    }
    store.add_worker(worker(OPERATOR, "Ivan Operator", 1)).await;
    store.add_worker(worker(5, "Eve", 3)).await;
    store.add_worker(worker(6, "Dan", 3)).await;
    store.add_worker(worker(7, "Carl", 4)).await;
    store.add_worker(worker(9, "Bella", 4)).await;
    store
}

fn engine(store: &InMemoryStore) -> Engine {
    engine_with(store, CustodyConfig::default())
}

fn engine_with(store: &InMemoryStore, config: CustodyConfig) -> Engine {
    ArrangementEngine::new(store.clone(), store.clone(), store.clone(), config)
}

fn queries(store: &InMemoryStore) -> Queries {
    QueryService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        CustodyConfig::default(),
    )
}

fn request(operation: Operation, employee_id: DbId, asset_ids: &[DbId]) -> ArrangementRequest {
    ArrangementRequest {
        operation,
        document_number: 100,
        document_date: doc_date(),
        asset_ids: asset_ids.to_vec(),
        operator_id: OPERATOR,
        employee_id,
        second_employee_id: None,
    }
}

fn transfer(from: DbId, to: DbId, asset_ids: &[DbId]) -> ArrangementRequest {
    ArrangementRequest {
        second_employee_id: Some(to),
        ..request(Operation::Transfer, from, asset_ids)
    }
}

async fn record(store: &InMemoryStore, asset_id: DbId) -> Option<CustodyRecord> {
    store
        .custody_snapshot()
        .await
        .into_iter()
        .find(|r| r.asset_id == asset_id)
}

async fn assert_invariant(store: &InMemoryStore) {
    for r in store.custody_snapshot().await {
        assert_eq!(
            r.status() == CustodyStatus::InUse,
            r.holder_id().is_some(),
            "invariant broken for asset {}",
            r.asset_id
        );
    }
}

// ---------------------------------------------------------------------------
// Scenario 1: ACCEPT success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_marks_free_assets_in_use() {
    let store = seeded_store().await;

    let outcome = engine(&store)
        .process(request(Operation::Accept, 5, &[10, 11]))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Ok);
    assert_eq!(outcome.severity, Severity::Success);
    assert_eq!(outcome.message, "Done.");
    for id in [10, 11] {
        let r = record(&store, id).await.unwrap();
        assert_eq!(r.state, CustodyState::InUse { holder_id: 5 });
        assert_eq!(r.document_number, Some(100));
        assert_eq!(r.document_date, Some(doc_date()));
        assert_eq!(r.operator_id, Some(OPERATOR));
    }
    assert_invariant(&store).await;
}

// ---------------------------------------------------------------------------
// Scenario 2: ACCEPT conflict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_rejects_batch_containing_in_use_asset() {
    let store = seeded_store().await;
    store.put_custody(CustodyRecord::vacant(10)).await;
    store.put_custody(held(11, 7, 50)).await;
    let before = store.custody_snapshot().await;

    let outcome = engine(&store)
        .process(request(Operation::Accept, 5, &[10, 11]))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(outcome.reason, Some(RejectionReason::InUse));
    assert_eq!(outcome.asset_ids, vec![11]);
    assert_eq!(outcome.severity, Severity::Error);
    assert_eq!(outcome.message, "Hardware [11] is in use");
    assert_eq!(store.custody_snapshot().await, before);
    assert!(store.journal_snapshot().await.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario 3: RETURN success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn return_frees_asset() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;

    let outcome = engine(&store)
        .process(request(Operation::Return, 5, &[10]))
        .await
        .unwrap();

    assert!(outcome.is_ok());
    let r = record(&store, 10).await.unwrap();
    assert_eq!(r.state, CustodyState::Free);
    assert_eq!(r.holder_id(), None);
    assert_eq!(r.document_number, Some(100));
    assert_invariant(&store).await;
}

// ---------------------------------------------------------------------------
// Scenario 4: RETURN ownership conflict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn return_by_non_holder_is_rejected() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;
    let before = store.custody_snapshot().await;

    let outcome = engine(&store)
        .process(request(Operation::Return, 6, &[10]))
        .await
        .unwrap();

    assert_eq!(outcome.reason, Some(RejectionReason::NotOwner));
    assert_eq!(outcome.asset_ids, vec![10]);
    assert_eq!(outcome.message, "Hardware [10] belongs to another worker");
    assert_eq!(store.custody_snapshot().await, before);
}

// ---------------------------------------------------------------------------
// Scenario 5: TRANSFER
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transfer_moves_holder() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;

    let outcome = engine(&store).process(transfer(5, 9, &[10])).await.unwrap();

    assert!(outcome.is_ok());
    let r = record(&store, 10).await.unwrap();
    assert_eq!(r.state, CustodyState::InUse { holder_id: 9 });
    assert_invariant(&store).await;
}

#[tokio::test]
async fn transfer_of_free_asset_is_rejected() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;

    let outcome = engine(&store)
        .process(transfer(5, 9, &[11, 10, 12]))
        .await
        .unwrap();

    assert_eq!(outcome.reason, Some(RejectionReason::NotOwner));
    assert_eq!(outcome.asset_ids, vec![11, 12]);
    assert_eq!(
        record(&store, 10).await.unwrap().state,
        CustodyState::InUse { holder_id: 5 }
    );
}

// ---------------------------------------------------------------------------
// Scenario 6: next document number
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prepare_offers_next_document_number() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 42)).await;
    store.put_custody(held(11, 5, 17)).await;

    let view = queries(&store).prepare(&[10]).await.unwrap();
    assert_eq!(view.next_document_number, 43);
}

#[tokio::test]
async fn prepare_on_empty_ledger_starts_at_one() {
    let store = seeded_store().await;

    let view = queries(&store).prepare(&[10]).await.unwrap();
    assert_eq!(view.next_document_number, 1);
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_request_is_idempotent() {
    let store = seeded_store().await;
    store.put_custody(held(11, 7, 50)).await;
    let engine = engine(&store);
    let req = request(Operation::Accept, 5, &[10, 11]);

    engine.process(req.clone()).await.unwrap();
    let after_first = store.custody_snapshot().await;
    let outcome = engine.process(req).await.unwrap();

    assert_eq!(outcome.asset_ids, vec![11]);
    assert_eq!(store.custody_snapshot().await, after_first);
}

#[tokio::test]
async fn rejection_materializes_default_records_only() {
    let store = seeded_store().await;
    store.put_custody(held(11, 7, 50)).await;

    engine(&store)
        .process(request(Operation::Accept, 5, &[10, 11]))
        .await
        .unwrap();

    assert_eq!(
        store.custody_snapshot().await,
        vec![CustodyRecord::vacant(10), held(11, 7, 50)]
    );
}

#[tokio::test]
async fn late_offender_blocks_whole_batch() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;
    store.put_custody(held(11, 5, 50)).await;
    store.put_custody(held(12, 5, 50)).await;
    store.put_custody(held(13, 7, 50)).await;
    let before = store.custody_snapshot().await;

    let outcome = engine(&store)
        .process(request(Operation::Return, 5, &[10, 11, 12, 13]))
        .await
        .unwrap();

    assert_eq!(outcome.asset_ids, vec![13]);
    assert_eq!(store.custody_snapshot().await, before);
}

#[tokio::test]
async fn full_lifecycle_keeps_invariant_and_journal() {
    let store = seeded_store().await;
    let engine = engine(&store);

    let steps = [
        request(Operation::Accept, 5, &[10, 11]),
        transfer(5, 9, &[11]),
        request(Operation::Return, 5, &[10]),
        request(Operation::Accept, 7, &[10]),
        request(Operation::Return, 9, &[11]),
    ];
    for (i, mut step) in steps.into_iter().enumerate() {
        step.document_number = 100 + i as i64;
        assert!(engine.process(step).await.unwrap().is_ok());
        assert_invariant(&store).await;
    }

    assert_eq!(
        record(&store, 10).await.unwrap().state,
        CustodyState::InUse { holder_id: 7 }
    );
    assert_eq!(record(&store, 11).await.unwrap().state, CustodyState::Free);

    let history = queries(&store).history(11).await.unwrap();
    let ops: Vec<Operation> = history.iter().map(|e| e.operation).collect();
    assert_eq!(
        ops,
        vec![Operation::Return, Operation::Transfer, Operation::Accept]
    );
    assert_eq!(history[1].second_employee_id, Some(9));
    assert_eq!(store.journal_snapshot().await.len(), 6);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_asset_is_not_found_and_nothing_changes() {
    let store = seeded_store().await;

    let err = engine(&store)
        .process(request(Operation::Accept, 5, &[10, 99, 98]))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        CustodyError::NotFound {
            entity: "hardware",
            id: 99
        }
    );
    assert!(store.custody_snapshot().await.is_empty());
}

#[tokio::test]
async fn unknown_receiver_is_not_found() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, 50)).await;

    let err = engine(&store)
        .process(transfer(5, 404, &[10]))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        CustodyError::NotFound {
            entity: "worker",
            id: 404
        }
    );
}

#[tokio::test]
async fn malformed_request_never_reaches_ledger() {
    let store = seeded_store().await;
    store
        .fail_next_commit(StoreError::Unavailable("down".into()))
        .await;

    let err = engine(&store)
        .process(request(Operation::Transfer, 5, &[10]))
        .await
        .unwrap_err();

    assert_matches!(err, CustodyError::Malformed(_));
    // The queued fault is still waiting for a commit.
    let err = engine(&store)
        .process(request(Operation::Accept, 5, &[10]))
        .await
        .unwrap_err();
    assert_matches!(err, CustodyError::Persistence(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn commit_failure_is_persistence_not_rejection() {
    let store = seeded_store().await;
    store
        .fail_next_commit(StoreError::Timeout("lock timeout".into()))
        .await;

    let err = engine(&store)
        .process(request(Operation::Accept, 5, &[10, 11]))
        .await
        .unwrap_err();

    assert!(err.is_persistence());
    assert_matches!(err, CustodyError::Persistence(StoreError::Timeout(_)));
    assert!(store.custody_snapshot().await.is_empty());
    assert!(store.journal_snapshot().await.is_empty());
}

#[tokio::test]
async fn conflicts_are_retried_within_budget() {
    let store = seeded_store().await;
    store
        .fail_next_commit(StoreError::Conflict("40001".into()))
        .await;
    store
        .fail_next_commit(StoreError::Conflict("40001".into()))
        .await;

    let outcome = engine(&store)
        .process(request(Operation::Accept, 5, &[10]))
        .await
        .unwrap();

    assert!(outcome.is_ok());
    assert_eq!(
        record(&store, 10).await.unwrap().state,
        CustodyState::InUse { holder_id: 5 }
    );
}

#[tokio::test]
async fn conflicts_beyond_budget_surface_as_persistence() {
    let store = seeded_store().await;
    for _ in 0..2 {
        store
            .fail_next_commit(StoreError::Conflict("40P01".into()))
            .await;
    }
    let config = CustodyConfig {
        max_conflict_retries: 1,
        ..CustodyConfig::default()
    };

    let err = engine_with(&store, config)
        .process(request(Operation::Accept, 5, &[10]))
        .await
        .unwrap_err();

    assert_matches!(err, CustodyError::Persistence(StoreError::Conflict(_)));
    assert!(store.custody_snapshot().await.is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_accepts_admit_exactly_one() {
    let store = seeded_store().await;
    let engine = Arc::new(engine(&store));

    let handles: Vec<_> = [5, 6, 7, 9]
        .into_iter()
        .map(|employee| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .process(request(Operation::Accept, employee, &[12, 10, 11]))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if outcome.is_ok() {
            accepted += 1;
        } else {
            assert_eq!(outcome.asset_ids, vec![12, 10, 11]);
        }
    }

    assert_eq!(accepted, 1);
    let holders: Vec<Option<DbId>> = store
        .custody_snapshot()
        .await
        .iter()
        .map(|r| r.holder_id())
        .collect();
    assert!(holders.iter().all(|h| h.is_some() && *h == holders[0]));
    assert_invariant(&store).await;
}

// ---------------------------------------------------------------------------
// Query service
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prepare_assembles_choice_sets_without_writing() {
    let store = seeded_store().await;
    store.put_custody(held(11, 5, 8)).await;

    let view = queries(&store).prepare(&[11, 77, 10]).await.unwrap();

    let asset_ids: Vec<DbId> = view.assets.iter().map(|a| a.id).collect();
    assert_eq!(asset_ids, vec![11, 10]);
    assert_eq!(view.missing_asset_ids, vec![77]);
    assert_eq!(view.custody, vec![held(11, 5, 8)]);

    let operators: Vec<DbId> = view.operators.iter().map(|w| w.id).collect();
    let employees: Vec<&str> = view.employees.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(operators, vec![OPERATOR]);
    assert_eq!(employees, vec!["Bella", "Carl", "Dan", "Eve"]);

    assert_eq!(view.next_document_number, 9);
    assert_eq!(view.operations.len(), 3);
    assert_eq!(view.operations[2].operation, Operation::Transfer);

    // Pure query: asset 10 still has no record.
    assert_eq!(store.custody_snapshot().await.len(), 1);
}

#[tokio::test]
async fn document_number_at_numeric_limit_is_refused_and_prepare_survives() {
    let store = seeded_store().await;
    let mut req = request(Operation::Accept, 5, &[10]);
    req.document_number = i64::MAX;

    let err = engine(&store).process(req).await.unwrap_err();
    assert_matches!(err, CustodyError::Malformed(_));
    assert!(store.custody_snapshot().await.is_empty());

    let mut req = request(Operation::Accept, 5, &[10]);
    req.document_number = i64::MAX - 1;
    assert!(engine(&store).process(req).await.unwrap().is_ok());
    let view = queries(&store).prepare(&[10]).await.unwrap();
    assert_eq!(view.next_document_number, i64::MAX);
}

#[tokio::test]
async fn prepare_reports_exhausted_numbering_as_error() {
    let store = seeded_store().await;
    store.put_custody(held(10, 5, i64::MAX)).await;

    assert_matches!(
        queries(&store).prepare(&[10]).await,
        Err(CustodyError::Persistence(StoreError::Backend(_)))
    );
}

#[tokio::test]
async fn prepare_lists_each_missing_id_once() {
    let store = seeded_store().await;

    let view = queries(&store).prepare(&[77, 10, 77, 10, 78]).await.unwrap();

    assert_eq!(view.missing_asset_ids, vec![77, 78]);
    assert_eq!(view.assets.len(), 1);
}

#[tokio::test]
async fn prepare_orders_custody_by_selection() {
    let store = seeded_store().await;
    for id in [10, 11, 12] {
        store.put_custody(held(id, 5, id)).await;
    }

    let view = queries(&store).prepare(&[12, 10, 11]).await.unwrap();

    let ids: Vec<DbId> = view.custody.iter().map(|r| r.asset_id).collect();
    assert_eq!(ids, vec![12, 10, 11]);
}

#[tokio::test]
async fn prepare_with_empty_selection_is_malformed() {
    let store = seeded_store().await;
    assert_matches!(
        queries(&store).prepare(&[]).await,
        Err(CustodyError::Malformed(_))
    );
}

#[tokio::test]
async fn holdings_lists_assets_of_worker() {
    let store = seeded_store().await;
    store.put_custody(held(12, 5, 1)).await;
    store.put_custody(held(10, 5, 2)).await;
    store.put_custody(held(11, 7, 3)).await;

    let holdings = queries(&store).holdings(5).await.unwrap();
    let ids: Vec<DbId> = holdings.iter().map(|r| r.asset_id).collect();
    assert_eq!(ids, vec![10, 12]);

    assert_matches!(
        queries(&store).holdings(404).await,
        Err(CustodyError::NotFound {
            entity: "worker",
            ..
        })
    );
}

#[tokio::test]
async fn history_of_unknown_asset_is_not_found() {
    let store = seeded_store().await;
    assert_matches!(
        queries(&store).history(99).await,
        Err(CustodyError::NotFound {
            entity: "hardware",
            id: 99
        })
    );
}
