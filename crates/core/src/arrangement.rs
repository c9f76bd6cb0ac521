//! Arrangement rules: request shape, validation against custody records, and
//! the transition table.
//!
//! Everything here is pure. [`crate::engine`] feeds it records read inside a
//! ledger transaction and writes back what it returns.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::custody::{CustodyRecord, CustodyState};
use crate::error::CustodyError;
use crate::journal::ArrangementEntry;
use crate::types::{DbId, DocDate, Timestamp};

/// Message shown after a successful arrangement.
pub const COMPLETED_MESSAGE: &str = "Done.";

/// Highest document number a request may carry. The next number offered
/// after it must still fit.
pub const MAX_DOCUMENT_NUMBER: i64 = i64::MAX - 1;

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Kind of custody document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Employee takes free hardware.
    Accept,
    /// Employee hands hardware back; it becomes free.
    Return,
    /// Employee passes hardware to another employee.
    Transfer,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Accept, Operation::Return, Operation::Transfer];

    /// Label used on documents and forms.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Accept => "Accepted",
            Operation::Return => "Returned",
            Operation::Transfer => "Transferred",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Accept => f.write_str("accept"),
            Operation::Return => f.write_str("return"),
            Operation::Transfer => f.write_str("transfer"),
        }
    }
}

/// One entry of the operation picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationOption {
    pub operation: Operation,
    pub label: &'static str,
}

/// The static list of operations, in document order.
pub fn operation_catalog() -> Vec<OperationOption> {
    Operation::ALL
        .iter()
        .map(|&operation| OperationOption {
            operation,
            label: operation.label(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A custody document as submitted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ArrangementRequest {
    pub operation: Operation,
    #[validate(range(min = 1, message = "document number must be positive"))]
    pub document_number: i64,
    pub document_date: DocDate,
    #[validate(length(min = 1, message = "no hardware selected"))]
    pub asset_ids: Vec<DbId>,
    /// Operator signing the document.
    pub operator_id: DbId,
    /// Employee accepting, returning, or handing over the hardware.
    pub employee_id: DbId,
    /// Receiving employee. Only read for [`Operation::Transfer`].
    #[serde(default)]
    pub second_employee_id: Option<DbId>,
}

/// What the document does, with exactly the workers each operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Accept {
        employee_id: DbId,
    },
    Return {
        employee_id: DbId,
    },
    Transfer {
        from_employee_id: DbId,
        to_employee_id: DbId,
    },
}

/// A request that passed the shape checks. Asset ids are de-duplicated,
/// first occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    pub directive: Directive,
    pub asset_ids: Vec<DbId>,
    pub document_number: i64,
    pub document_date: DocDate,
    pub operator_id: DbId,
}

impl TryFrom<ArrangementRequest> for Arrangement {
    type Error = CustodyError;

    fn try_from(request: ArrangementRequest) -> Result<Self, Self::Error> {
        request
            .validate()
            .map_err(|errors| CustodyError::Malformed(describe(&errors)))?;
        if request.document_number > MAX_DOCUMENT_NUMBER {
            return Err(CustodyError::Malformed(format!(
                "document number must not exceed {MAX_DOCUMENT_NUMBER}"
            )));
        }

        let directive = match request.operation {
            Operation::Accept => Directive::Accept {
                employee_id: request.employee_id,
            },
            Operation::Return => Directive::Return {
                employee_id: request.employee_id,
            },
            Operation::Transfer => {
                let to_employee_id = request.second_employee_id.ok_or_else(|| {
                    CustodyError::Malformed("transfer requires a receiving employee".into())
                })?;
                if to_employee_id == request.employee_id {
                    return Err(CustodyError::Malformed(
                        "transfer target must differ from the current holder".into(),
                    ));
                }
                Directive::Transfer {
                    from_employee_id: request.employee_id,
                    to_employee_id,
                }
            }
        };

        let mut seen = HashSet::with_capacity(request.asset_ids.len());
        let asset_ids = request
            .asset_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        Ok(Self {
            directive,
            asset_ids,
            document_number: request.document_number,
            document_date: request.document_date,
            operator_id: request.operator_id,
        })
    }
}

/// Flatten validator output into one line, sorted for stable messages.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Why a batch was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// ACCEPT targeted hardware that somebody holds.
    InUse,
    /// RETURN/TRANSFER targeted hardware the employee does not hold.
    NotOwner,
}

/// A failed validation: the reason plus the offending assets in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub asset_ids: Vec<DbId>,
}

impl Directive {
    pub fn operation(&self) -> Operation {
        match self {
            Directive::Accept { .. } => Operation::Accept,
            Directive::Return { .. } => Operation::Return,
            Directive::Transfer { .. } => Operation::Transfer,
        }
    }

    /// The employee named first on the document.
    pub fn employee_id(&self) -> DbId {
        match *self {
            Directive::Accept { employee_id } | Directive::Return { employee_id } => employee_id,
            Directive::Transfer {
                from_employee_id, ..
            } => from_employee_id,
        }
    }

    pub fn second_employee_id(&self) -> Option<DbId> {
        match *self {
            Directive::Transfer { to_employee_id, .. } => Some(to_employee_id),
            Directive::Accept { .. } | Directive::Return { .. } => None,
        }
    }

    /// Validate the whole batch. A single offender rejects everything.
    ///
    /// `records` must be in request order; offenders keep that order.
    pub fn check(&self, records: &[CustodyRecord]) -> Option<Rejection> {
        let (reason, offenders): (RejectionReason, Vec<DbId>) = match *self {
            Directive::Accept { .. } => (
                RejectionReason::InUse,
                records
                    .iter()
                    .filter(|r| !r.is_free())
                    .map(|r| r.asset_id)
                    .collect(),
            ),
            Directive::Return { employee_id }
            | Directive::Transfer {
                from_employee_id: employee_id,
                ..
            } => (
                RejectionReason::NotOwner,
                records
                    .iter()
                    .filter(|r| !r.is_held_by(employee_id))
                    .map(|r| r.asset_id)
                    .collect(),
            ),
        };

        if offenders.is_empty() {
            None
        } else {
            Some(Rejection {
                reason,
                asset_ids: offenders,
            })
        }
    }

    /// State every targeted record ends up in.
    pub fn target_state(&self) -> CustodyState {
        match *self {
            Directive::Accept { employee_id } => CustodyState::InUse {
                holder_id: employee_id,
            },
            Directive::Return { .. } => CustodyState::Free,
            Directive::Transfer { to_employee_id, .. } => CustodyState::InUse {
                holder_id: to_employee_id,
            },
        }
    }
}

impl Arrangement {
    pub fn operation(&self) -> Operation {
        self.directive.operation()
    }

    /// The record after this document is applied to `record`.
    pub fn apply(&self, record: &CustodyRecord) -> CustodyRecord {
        CustodyRecord {
            asset_id: record.asset_id,
            state: self.directive.target_state(),
            document_number: Some(self.document_number),
            document_date: Some(self.document_date),
            operator_id: Some(self.operator_id),
        }
    }

    /// One journal line per asset.
    pub fn journal_entries(&self, logged_at: Timestamp) -> Vec<ArrangementEntry> {
        self.asset_ids
            .iter()
            .map(|&asset_id| ArrangementEntry {
                asset_id,
                operation: self.operation(),
                employee_id: self.directive.employee_id(),
                second_employee_id: self.directive.second_employee_id(),
                operator_id: self.operator_id,
                document_number: self.document_number,
                document_date: self.document_date,
                logged_at,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Rejected,
}

/// Flash-message severity understood by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => f.write_str("success"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Result of processing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementOutcome {
    pub status: OutcomeStatus,
    pub reason: Option<RejectionReason>,
    /// Assets that caused the rejection; empty on success.
    pub asset_ids: Vec<DbId>,
    pub message: String,
    pub severity: Severity,
}

impl ArrangementOutcome {
    pub fn completed() -> Self {
        Self {
            status: OutcomeStatus::Ok,
            reason: None,
            asset_ids: Vec::new(),
            message: COMPLETED_MESSAGE.to_string(),
            severity: Severity::Success,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        let message = match rejection.reason {
            RejectionReason::InUse => format!("Hardware {:?} is in use", rejection.asset_ids),
            RejectionReason::NotOwner => {
                format!("Hardware {:?} belongs to another worker", rejection.asset_ids)
            }
        };
        Self {
            status: OutcomeStatus::Rejected,
            reason: Some(rejection.reason),
            asset_ids: rejection.asset_ids,
            message,
            severity: Severity::Error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
