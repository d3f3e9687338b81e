//! Persistence, time and code-generation ports.
//!
//! The lifecycle and the access guard only see these traits. `radiotaxi-db`
//! implements them over PostgreSQL; [`crate::memory`] implements them in
//! memory for tests.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::access::{Session, UserAccount};
use crate::booking::{
    Booking, BookingFilter, HistoryEntry, NewHistoryEntry, NewReceipt, Offering, Receipt, Taxi,
    Trip,
};
use crate::error::CoreError;
use crate::types::{BookingCode, DbId, Timestamp};

/// Prefix of generated booking codes.
pub const BOOKING_CODE_PREFIX: &str = "RT-";

/// Number of random characters after the prefix.
pub const BOOKING_CODE_LENGTH: usize = 8;

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

/// Read access to bookings plus the entry point for write transactions.
#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    type Tx: BookingTx;

    /// Open a unit of work. Dropping the transaction without calling
    /// [`BookingTx::commit`] discards every write made through it.
    async fn begin(&self) -> Result<Self::Tx, CoreError>;

    async fn find_booking(&self, code: &str) -> Result<Option<Booking>, CoreError>;

    /// Bookings matching `filter`, newest requested time first.
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, CoreError>;

    /// History entries for a booking in insertion order.
    async fn history(&self, code: &str) -> Result<Vec<HistoryEntry>, CoreError>;
}

/// A single lifecycle transaction. Bookings, history, trips and receipts are
/// only written through this trait.
#[async_trait]
pub trait BookingTx: Send {
    /// Load a booking and hold an exclusive lock on it until commit or drop.
    async fn lock_booking(&mut self, code: &str) -> Result<Option<Booking>, CoreError>;

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), CoreError>;

    async fn update_booking(&mut self, booking: &Booking) -> Result<(), CoreError>;

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, CoreError>;

    async fn find_offering(
        &mut self,
        service_code: &str,
        rate_id: DbId,
    ) -> Result<Option<Offering>, CoreError>;

    async fn find_user(&mut self, user_id: DbId) -> Result<Option<UserAccount>, CoreError>;

    async fn find_taxi(&mut self, plate: &str) -> Result<Option<Taxi>, CoreError>;

    async fn insert_trip(&mut self, trip: &Trip) -> Result<(), CoreError>;

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<Receipt, CoreError>;

    async fn commit(self) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Users with their role and permissions.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn find_user_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, CoreError>;

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, CoreError>;
}

/// Session rows keyed by token hash.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn find_session(&self, id: &str) -> Result<Option<Session>, CoreError>;

    async fn insert_session(&self, session: &Session) -> Result<(), CoreError>;

    async fn extend_session(&self, id: &str, expires_at: Timestamp) -> Result<(), CoreError>;

    /// Returns `true` if a session was deleted.
    async fn delete_session(&self, id: &str) -> Result<bool, CoreError>;

    /// Delete every session expired at `now`. Returns the number removed.
    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, CoreError>;
}

// ---------------------------------------------------------------------------
// Clock and codes
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

/// Wall clock (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

pub trait CodeGenerator: Send + Sync + 'static {
    fn next_code(&self) -> BookingCode;
}

/// Generates codes like `RT-7KQ2M9XA`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn next_code(&self) -> BookingCode {
        let suffix: String = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(BOOKING_CODE_LENGTH)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        format!("{BOOKING_CODE_PREFIX}{suffix}")
    }
}
