//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the table row, a
//! create DTO where rows are inserted outside the lifecycle, and the
//! conversion into the matching `radiotaxi-core` type.

pub mod booking;
pub mod catalog;
pub mod history;
pub mod receipt;
pub mod session;
pub mod trip;
pub mod user;
