//! Mapping from `sqlx::Error` to the backend-neutral [`StoreError`].

use custody_core::error::StoreError;

/// SQLSTATE `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE `query_canceled`, raised when `statement_timeout` expires.
const QUERY_CANCELED: &str = "57014";
/// SQLSTATE `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Classify a database error so the engine knows whether to retry.
pub fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => classify_sqlstate(&code, err.to_string()),
            None => backend(err.to_string()),
        },
        _ => backend(err.to_string()),
    }
}

fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        LOCK_NOT_AVAILABLE | QUERY_CANCELED => StoreError::Timeout(message),
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED => StoreError::Conflict(message),
        _ => {
            tracing::error!(sqlstate = code, error = %message, "Unexpected database error");
            StoreError::Backend(message)
        }
    }
}

fn backend(message: String) -> StoreError {
    tracing::error!(error = %message, "Unexpected database error");
    StoreError::Backend(message)
}
