//! Hardware catalog entries.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, DocDate};

/// A piece of hardware as registered in the catalog.
///
/// The arrangement engine only cares whether an id exists; the rest is
/// carried for the pre-arrange view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: DbId,
    pub name: String,
    pub type_id: DbId,
    pub brand_id: DbId,
    pub condition_id: DbId,
    pub serial_number: Option<String>,
    pub validation_date: DocDate,
    pub description: Option<String>,
}
