//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods take any `PgExecutor`, so the same query runs against the pool
//! or inside an open transaction.

pub mod booking_repo;
pub mod history_repo;
pub mod offering_repo;
pub mod receipt_repo;
pub mod role_repo;
pub mod session_repo;
pub mod taxi_repo;
pub mod trip_repo;
pub mod user_repo;

pub use booking_repo::BookingRepo;
pub use history_repo::HistoryRepo;
pub use offering_repo::OfferingRepo;
pub use receipt_repo::ReceiptRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use taxi_repo::TaxiRepo;
pub use trip_repo::TripRepo;
pub use user_repo::UserRepo;
