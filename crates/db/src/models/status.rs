//! Enums mapping to the SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed data of the corresponding
//! table (`hardware_statuses`, `operations`).

use custody_core::arrangement::Operation;
use custody_core::custody::CustodyStatus;
use custody_core::error::StoreError;

pub use custody_core::types::StatusId;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up the variant stored as `id`.
            pub fn from_id(id: StatusId) -> Result<Self, StoreError> {
                match id {
                    $( x if x == $val => Ok($name::$variant), )+
                    other => Err(StoreError::Backend(format!(
                        "unknown {} id {other}",
                        stringify!($name),
                    ))),
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Custody status of a `hardware_use` row.
    HardwareStatus {
        Free = 1,
        InUse = 2,
    }
}

define_status_enum! {
    /// Operation recorded on an `arranges` row.
    OperationCode {
        Accept = 1,
        Return = 2,
        Transfer = 3,
    }
}

impl From<CustodyStatus> for HardwareStatus {
    fn from(status: CustodyStatus) -> Self {
        match status {
            CustodyStatus::Free => HardwareStatus::Free,
            CustodyStatus::InUse => HardwareStatus::InUse,
        }
    }
}

impl From<HardwareStatus> for CustodyStatus {
    fn from(status: HardwareStatus) -> Self {
        match status {
            HardwareStatus::Free => CustodyStatus::Free,
            HardwareStatus::InUse => CustodyStatus::InUse,
        }
    }
}

impl From<Operation> for OperationCode {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Accept => OperationCode::Accept,
            Operation::Return => OperationCode::Return,
            Operation::Transfer => OperationCode::Transfer,
        }
    }
}

impl From<OperationCode> for Operation {
    fn from(code: OperationCode) -> Self {
        match code {
            OperationCode::Accept => Operation::Accept,
            OperationCode::Return => Operation::Return,
            OperationCode::Transfer => Operation::Transfer,
        }
    }
}
