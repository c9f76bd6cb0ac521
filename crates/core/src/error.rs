use crate::types::DbId;

/// Failure reported by a storage backend behind one of the ports.
///
/// Backends classify their native errors into these kinds so the engine can
/// decide whether a retry makes sense without knowing the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached (pool exhausted, connection lost).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A lock or statement timed out; the transaction was rolled back.
    #[error("Storage timed out: {0}")]
    Timeout(String),

    /// Serialization failure or deadlock. Safe to retry the whole transaction.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Anything else, including rows that break the custody invariant.
    #[error("Storage failure: {0}")]
    Backend(String),
}

/// Errors returned by the arrangement engine and the query service.
///
/// A business-rule rejection is not an error: it comes back as an
/// [`ArrangementOutcome`](crate::arrangement::ArrangementOutcome) with
/// status `Rejected`.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl CustodyError {
    /// `true` for infrastructure faults, `false` for caller mistakes.
    pub fn is_persistence(&self) -> bool {
        matches!(self, CustodyError::Persistence(_))
    }
}
