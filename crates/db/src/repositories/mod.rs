//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads take
//! `&PgPool`; writes that must share an arrangement transaction take
//! `&mut PgConnection` (pass `&mut *tx`).

pub mod arrange_repo;
pub mod hardware_repo;
pub mod hardware_use_repo;
pub mod worker_repo;

pub use arrange_repo::ArrangeRepo;
pub use hardware_repo::HardwareRepo;
pub use hardware_use_repo::HardwareUseRepo;
pub use worker_repo::WorkerRepo;
