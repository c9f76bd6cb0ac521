//! Engine configuration loaded from environment variables.

use std::str::FromStr;

use crate::types::DbId;

/// Department id of the custodial (IT) department in the seed data.
pub const DEFAULT_OPERATOR_DEPARTMENT_ID: DbId = 1;

/// How many times a transaction that hit a serialization conflict is re-run.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Settings for the arrangement engine and the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyConfig {
    /// Workers in this department are operators; everyone else is an employee.
    pub operator_department_id: DbId,
    /// Retry budget for [`StoreError::Conflict`](crate::error::StoreError::Conflict).
    pub max_conflict_retries: u32,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            operator_department_id: DEFAULT_OPERATOR_DEPARTMENT_ID,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl CustodyConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `OPERATOR_DEPARTMENT_ID`       | `1`     |
    /// | `ARRANGE_MAX_CONFLICT_RETRIES` | `3`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            operator_department_id: parse_or(
                &lookup,
                "OPERATOR_DEPARTMENT_ID",
                DEFAULT_OPERATOR_DEPARTMENT_ID,
                "an integer department id",
            )?,
            max_conflict_retries: parse_or(
                &lookup,
                "ARRANGE_MAX_CONFLICT_RETRIES",
                DEFAULT_MAX_CONFLICT_RETRIES,
                "a non-negative integer",
            )?,
        })
    }
}

/// Parse `var` from `lookup`, falling back to `default` when it is unset or blank.
pub fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value: raw,
            })
        }
        _ => Ok(default),
    }
}
