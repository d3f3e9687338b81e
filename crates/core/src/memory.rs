//! In-memory adapter for the persistence ports, plus a manual clock and a
//! sequential code generator. Used by the core integration tests.
//!
//! A transaction takes the store's lock for its whole lifetime and works on
//! a copy of the data. Commit writes the copy back; dropping the transaction
//! discards it. Concurrent transactions are therefore serialized, matching
//! the row lock the PostgreSQL adapter takes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::access::{Session, UserAccount};
use crate::booking::{
    Booking, BookingFilter, HistoryEntry, NewHistoryEntry, NewReceipt, Offering, Receipt, Taxi,
    Trip,
};
use crate::error::CoreError;
use crate::ports::{
    BookingStore, BookingTx, Clock, CodeGenerator, SessionStore, UserDirectory,
    BOOKING_CODE_PREFIX,
};
use crate::types::{BookingCode, DbId, Timestamp};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    bookings: BTreeMap<BookingCode, Booking>,
    history: Vec<HistoryEntry>,
    trips: Vec<Trip>,
    receipts: Vec<Receipt>,
    offerings: Vec<Offering>,
    users: BTreeMap<DbId, UserAccount>,
    taxis: BTreeMap<String, Taxi>,
    sessions: BTreeMap<String, Session>,
    last_history_id: DbId,
    last_receipt_id: DbId,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
    fail_history: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserAccount) {
        self.data.lock().await.users.insert(user.id, user);
    }

    pub async fn set_user_active(&self, user_id: DbId, active: bool) {
        if let Some(user) = self.data.lock().await.users.get_mut(&user_id) {
            user.is_active = active;
        }
    }

    pub async fn add_taxi(&self, taxi: Taxi) {
        self.data.lock().await.taxis.insert(taxi.plate.clone(), taxi);
    }

    pub async fn add_offering(&self, offering: Offering) {
        self.data.lock().await.offerings.push(offering);
    }

    pub async fn trips(&self) -> Vec<Trip> {
        self.data.lock().await.trips.clone()
    }

    pub async fn receipts(&self) -> Vec<Receipt> {
        self.data.lock().await.receipts.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.data.lock().await.sessions.len()
    }

    /// Make the next history append fail with an infrastructure error.
    pub fn fail_next_history_append(&self) {
        self.fail_history.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryData>,
    work: MemoryData,
    fail_history: Arc<AtomicBool>,
}

#[async_trait]
impl BookingStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, CoreError> {
        let guard = Arc::clone(&self.data).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTx {
            guard,
            work,
            fail_history: Arc::clone(&self.fail_history),
        })
    }

    async fn find_booking(&self, code: &str) -> Result<Option<Booking>, CoreError> {
        Ok(self.data.lock().await.bookings.get(code).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, CoreError> {
        let data = self.data.lock().await;
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(bookings)
    }

    async fn history(&self, code: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        let data = self.data.lock().await;
        Ok(data
            .history
            .iter()
            .filter(|h| h.booking_code == code)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn lock_booking(&mut self, code: &str) -> Result<Option<Booking>, CoreError> {
        Ok(self.work.bookings.get(code).cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), CoreError> {
        if self.work.bookings.contains_key(&booking.code) {
            return Err(CoreError::Infrastructure(format!(
                "Duplicate booking code {}",
                booking.code
            )));
        }
        self.work
            .bookings
            .insert(booking.code.clone(), booking.clone());
        Ok(())
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<(), CoreError> {
        match self.work.bookings.get_mut(&booking.code) {
            Some(slot) => {
                *slot = booking.clone();
                Ok(())
            }
            None => Err(CoreError::not_found("Booking", &booking.code)),
        }
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, CoreError> {
        if self.fail_history.swap(false, Ordering::SeqCst) {
            return Err(CoreError::Infrastructure(
                "Injected history write failure".into(),
            ));
        }
        self.work.last_history_id += 1;
        let entry = HistoryEntry {
            id: self.work.last_history_id,
            booking_code: entry.booking_code,
            action: entry.action,
            status: entry.status,
            observation: entry.observation,
            recorded_at: entry.recorded_at,
        };
        self.work.history.push(entry.clone());
        Ok(entry)
    }

    async fn find_offering(
        &mut self,
        service_code: &str,
        rate_id: DbId,
    ) -> Result<Option<Offering>, CoreError> {
        Ok(self
            .work
            .offerings
            .iter()
            .find(|o| o.service_code == service_code && o.rate_id == rate_id)
            .cloned())
    }

    async fn find_user(&mut self, user_id: DbId) -> Result<Option<UserAccount>, CoreError> {
        Ok(self.work.users.get(&user_id).cloned())
    }

    async fn find_taxi(&mut self, plate: &str) -> Result<Option<Taxi>, CoreError> {
        Ok(self.work.taxis.get(plate).cloned())
    }

    async fn insert_trip(&mut self, trip: &Trip) -> Result<(), CoreError> {
        self.work.trips.push(trip.clone());
        Ok(())
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<Receipt, CoreError> {
        self.work.last_receipt_id += 1;
        let receipt = Receipt {
            id: self.work.last_receipt_id,
            booking_code: receipt.booking_code,
            total: receipt.total,
            payment_method: receipt.payment_method,
            issued_at: receipt.issued_at,
        };
        self.work.receipts.push(receipt.clone());
        Ok(receipt)
    }

    async fn commit(self) -> Result<(), CoreError> {
        let MemoryTx {
            mut guard, work, ..
        } = self;
        *guard = work;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, CoreError> {
        Ok(self.data.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, CoreError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, id: &str) -> Result<Option<Session>, CoreError> {
        Ok(self.data.lock().await.sessions.get(id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), CoreError> {
        self.data
            .lock()
            .await
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn extend_session(&self, id: &str, expires_at: Timestamp) -> Result<(), CoreError> {
        if let Some(session) = self.data.lock().await.sessions.get_mut(id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.data.lock().await.sessions.remove(id).is_some())
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, CoreError> {
        let mut data = self.data.lock().await;
        let before = data.sessions.len();
        data.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - data.sessions.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// Clock and codes
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<StdMutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(StdMutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Generates `RT-00000001`, `RT-00000002`, ...
#[derive(Debug, Default)]
pub struct SequentialCodes {
    next: AtomicU64,
}

impl CodeGenerator for SequentialCodes {
    fn next_code(&self) -> BookingCode {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{BOOKING_CODE_PREFIX}{n:08}")
    }
}
