//! Request extractors.
//!
//! - [`auth::SessionUser`] -- Resolves the session token to the acting user.

pub mod auth;
