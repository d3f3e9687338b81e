//! [`PgStore`]: the PostgreSQL adapter for the core ports.

use std::collections::BTreeSet;

use async_trait::async_trait;
use radiotaxi_core::access::{Session, UserAccount};
use radiotaxi_core::booking::{
    Booking, BookingFilter, HistoryEntry, NewHistoryEntry, NewReceipt, Offering, Receipt, Taxi,
    Trip,
};
use radiotaxi_core::error::CoreError;
use radiotaxi_core::ports::{BookingStore, BookingTx, SessionStore, UserDirectory};
use radiotaxi_core::roles::{Permission, Role};
use radiotaxi_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::models::user::User;
use crate::repositories::{
    BookingRepo, HistoryRepo, OfferingRepo, ReceiptRepo, RoleRepo, SessionRepo, TaxiRepo,
    TripRepo, UserRepo,
};

/// Map a driver error to the core's retryable infrastructure error.
fn infra(err: sqlx::Error) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Infrastructure(err.to_string())
}

/// Join a user row with its role's permissions.
async fn load_account(conn: &mut PgConnection, user: User) -> Result<UserAccount, CoreError> {
    let role = Role::from_name(&user.role_name).ok_or_else(|| {
        CoreError::Infrastructure(format!(
            "User {} has unknown role '{}'",
            user.id, user.role_name
        ))
    })?;

    let permissions: BTreeSet<Permission> = RoleRepo::permission_names(&mut *conn, user.role_id)
        .await
        .map_err(infra)?
        .iter()
        .filter_map(|name| {
            let parsed = Permission::from_name(name);
            if parsed.is_none() {
                tracing::warn!(permission = %name, "Ignoring unknown permission");
            }
            parsed
        })
        .collect();

    Ok(UserAccount {
        id: user.id,
        username: user.username,
        password_hash: user.password_hash,
        role,
        permissions,
        is_active: user.is_active,
    })
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

/// A lifecycle transaction. Dropping it without commit rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, CoreError> {
        let tx = self.pool.begin().await.map_err(infra)?;
        Ok(PgTx { tx })
    }

    async fn find_booking(&self, code: &str) -> Result<Option<Booking>, CoreError> {
        BookingRepo::find_by_code(&self.pool, code)
            .await
            .map_err(infra)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, CoreError> {
        BookingRepo::list(&self.pool, filter)
            .await
            .map_err(infra)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn history(&self, code: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        HistoryRepo::list_for_booking(&self.pool, code)
            .await
            .map_err(infra)?
            .into_iter()
            .map(HistoryEntry::try_from)
            .collect()
    }
}

#[async_trait]
impl BookingTx for PgTx {
    async fn lock_booking(&mut self, code: &str) -> Result<Option<Booking>, CoreError> {
        BookingRepo::lock(&mut *self.tx, code)
            .await
            .map_err(infra)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<(), CoreError> {
        BookingRepo::insert(&mut *self.tx, booking)
            .await
            .map_err(infra)
    }

    async fn update_booking(&mut self, booking: &Booking) -> Result<(), CoreError> {
        let updated = BookingRepo::update_state(&mut *self.tx, booking)
            .await
            .map_err(infra)?;
        if updated {
            Ok(())
        } else {
            Err(CoreError::not_found("Booking", &booking.code))
        }
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, CoreError> {
        HistoryRepo::append(&mut *self.tx, &entry)
            .await
            .map_err(infra)?
            .try_into()
    }

    async fn find_offering(
        &mut self,
        service_code: &str,
        rate_id: DbId,
    ) -> Result<Option<Offering>, CoreError> {
        Ok(OfferingRepo::find(&mut *self.tx, service_code, rate_id)
            .await
            .map_err(infra)?
            .map(Offering::from))
    }

    async fn find_user(&mut self, user_id: DbId) -> Result<Option<UserAccount>, CoreError> {
        match UserRepo::find_by_id(&mut *self.tx, user_id)
            .await
            .map_err(infra)?
        {
            Some(user) => Ok(Some(load_account(&mut *self.tx, user).await?)),
            None => Ok(None),
        }
    }

    async fn find_taxi(&mut self, plate: &str) -> Result<Option<Taxi>, CoreError> {
        Ok(TaxiRepo::find_by_plate(&mut *self.tx, plate)
            .await
            .map_err(infra)?
            .map(Taxi::from))
    }

    async fn insert_trip(&mut self, trip: &Trip) -> Result<(), CoreError> {
        TripRepo::insert(&mut *self.tx, trip).await.map_err(infra)
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<Receipt, CoreError> {
        ReceiptRepo::insert(&mut *self.tx, &receipt)
            .await
            .map_err(infra)?
            .try_into()
    }

    async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(infra)
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, CoreError> {
        let mut conn = self.pool.acquire().await.map_err(infra)?;
        match UserRepo::find_by_id(&mut *conn, user_id)
            .await
            .map_err(infra)?
        {
            Some(user) => Ok(Some(load_account(&mut *conn, user).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, CoreError> {
        let mut conn = self.pool.acquire().await.map_err(infra)?;
        match UserRepo::find_by_username(&mut *conn, username)
            .await
            .map_err(infra)?
        {
            Some(user) => Ok(Some(load_account(&mut *conn, user).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_session(&self, id: &str) -> Result<Option<Session>, CoreError> {
        Ok(SessionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(infra)?
            .map(Session::from))
    }

    async fn insert_session(&self, session: &Session) -> Result<(), CoreError> {
        SessionRepo::create(&self.pool, session).await.map_err(infra)
    }

    async fn extend_session(&self, id: &str, expires_at: Timestamp) -> Result<(), CoreError> {
        SessionRepo::extend(&self.pool, id, expires_at)
            .await
            .map_err(infra)?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<bool, CoreError> {
        SessionRepo::delete(&self.pool, id).await.map_err(infra)
    }

    async fn delete_expired_sessions(&self, now: Timestamp) -> Result<u64, CoreError> {
        SessionRepo::delete_expired(&self.pool, now)
            .await
            .map_err(infra)
    }
}
