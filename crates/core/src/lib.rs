//! Radiotaxi domain core.
//!
//! Pure domain logic for the booking lifecycle and the access guard in front
//! of it. Persistence and time are reached through the traits in [`ports`];
//! the database adapter lives in `radiotaxi-db` and an in-memory adapter in
//! [`memory`].

pub mod access;
pub mod booking;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod roles;
pub mod types;
