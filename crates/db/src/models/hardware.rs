//! Hardware catalog rows.

use custody_core::asset::Asset;
use custody_core::types::{DbId, DocDate};
use sqlx::FromRow;

/// A row from the `hardware` table.
#[derive(Debug, Clone, FromRow)]
pub struct Hardware {
    pub hardware_id: DbId,
    pub name: String,
    pub id_type: DbId,
    pub id_brand: DbId,
    pub id_condition: DbId,
    pub serial_num: Option<String>,
    pub descrip: Option<String>,
    pub validation_date: DocDate,
}

impl From<Hardware> for Asset {
    fn from(row: Hardware) -> Self {
        Asset {
            id: row.hardware_id,
            name: row.name,
            type_id: row.id_type,
            brand_id: row.id_brand,
            condition_id: row.id_condition,
            serial_number: row.serial_num,
            validation_date: row.validation_date,
            description: row.descrip,
        }
    }
}
