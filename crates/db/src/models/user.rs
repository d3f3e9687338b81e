//! User entity model and DTOs.

use sqlx::FromRow;
use radiotaxi_core::types::{DbId, Timestamp};

/// A `users` row joined with its role name.
///
/// Contains the password hash. Never serialize it to API responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role_id: DbId,
    pub role_name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role_id: DbId,
}
