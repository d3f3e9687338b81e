//! Credential checking and session cookie helpers.

pub mod cookie;
pub mod password;
