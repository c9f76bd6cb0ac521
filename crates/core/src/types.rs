/// All database primary keys are BIGINT. Asset and worker ids are assigned
/// externally (inventory number, personnel number), never generated here.
pub type DbId = i64;

/// Lookup table ids (statuses, operations) are SMALLINT.
pub type StatusId = i16;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date printed on a custody document.
pub type DocDate = chrono::NaiveDate;
