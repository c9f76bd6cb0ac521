//! Workers and the operator/employee partition.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A row from the worker directory. `id` is the personnel number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: DbId,
    pub name: String,
    pub department_id: DbId,
}

/// Which side of a custody document a worker can appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    /// Member of the custodial department; signs documents on behalf of others.
    Operator,
    /// Everyone else; holds hardware.
    Employee,
}

impl Worker {
    pub fn role(&self, operator_department_id: DbId) -> WorkerRole {
        if self.department_id == operator_department_id {
            WorkerRole::Operator
        } else {
            WorkerRole::Employee
        }
    }
}

/// Workers split by role, each list ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerPartition {
    pub operators: Vec<Worker>,
    pub employees: Vec<Worker>,
}

/// Split `workers` into operators and employees.
///
/// Both lists are sorted by name ascending; equal names fall back to id so
/// the order is stable across calls.
pub fn partition_workers(workers: Vec<Worker>, operator_department_id: DbId) -> WorkerPartition {
    let (mut operators, mut employees): (Vec<_>, Vec<_>) = workers
        .into_iter()
        .partition(|w| w.role(operator_department_id) == WorkerRole::Operator);

    let by_name = |a: &Worker, b: &Worker| a.name.cmp(&b.name).then(a.id.cmp(&b.id));
    operators.sort_by(by_name);
    employees.sort_by(by_name);

    WorkerPartition {
        operators,
        employees,
    }
}
