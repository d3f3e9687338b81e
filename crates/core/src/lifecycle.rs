//! Booking lifecycle service.
//!
//! Every command runs the same sequence:
//!
//! 1. capability check against the acting user ([`authorize`]),
//! 2. field validation of the command input,
//! 3. open a transaction and lock the booking,
//! 4. state check through the [`BookingState`] transition methods,
//! 5. actor check (assigned driver, owning client),
//! 6. write the booking, append one history entry, commit.
//!
//! Any error before commit drops the transaction and leaves nothing behind.

use crate::access::{authorize, AuthenticatedUser, Requirement};
use crate::booking::{
    Assignment, Booking, BookingFilter, BookingState, Command, CompleteTrip, CompletedTrip,
    HistoryEntry, NewBooking, NewHistoryEntry, NewReceipt, OfferingRef, Trip, ValidateBooking,
    ValidationAction,
};
use crate::error::CoreError;
use crate::ports::{BookingStore, BookingTx, Clock, CodeGenerator};
use crate::roles::Role;
use crate::types::Timestamp;

pub struct BookingLifecycle<S, C, G> {
    store: S,
    clock: C,
    codes: G,
}

impl<S, C, G> BookingLifecycle<S, C, G>
where
    S: BookingStore,
    C: Clock,
    G: CodeGenerator,
{
    pub fn new(store: S, clock: C, codes: G) -> Self {
        Self {
            store,
            clock,
            codes,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /* --------------------------------------------------------------------
    Commands
    -------------------------------------------------------------------- */

    /// Register a new booking in EN_REVISION for the acting client.
    pub async fn create_booking(
        &self,
        actor: &AuthenticatedUser,
        input: NewBooking,
    ) -> Result<Booking, CoreError> {
        authorize(actor, &Requirement::CREATE_BOOKING)?;
        let now = self.clock.now();
        let requested_at = input.validate(now)?;

        let mut tx = self.store.begin().await?;
        if tx
            .find_offering(&input.service_code, input.rate_id)
            .await?
            .is_none()
        {
            return Err(CoreError::not_found(
                "Offering",
                format!("{}/{}", input.service_code, input.rate_id),
            ));
        }

        let booking = Booking {
            code: self.codes.next_code(),
            client_id: actor.user_id,
            origin: input.origin.trim().to_string(),
            destination: input.destination.trim().to_string(),
            requested_at,
            booking_type: input.booking_type,
            observation: input.observation,
            offering: OfferingRef {
                service_code: input.service_code,
                rate_id: input.rate_id,
            },
            state: BookingState::EnRevision,
            created_at: now,
        };

        tx.insert_booking(&booking).await?;
        tx.append_history(history_entry(
            &booking,
            Command::Create,
            format!("Booking requested by user {}", actor.user_id),
            now,
        ))
        .await?;
        tx.commit().await?;

        tracing::info!(
            booking_code = %booking.code,
            client_id = booking.client_id,
            booking_type = booking.booking_type.as_str(),
            "Booking created",
        );
        Ok(booking)
    }

    /// Approve (assigning driver and taxi), reassign or reject a booking.
    pub async fn validate_and_assign(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
        input: ValidateBooking,
    ) -> Result<Booking, CoreError> {
        authorize(actor, &Requirement::VALIDATE_BOOKING)?;
        let action = input.into_action()?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let mut booking = lock(&mut tx, code).await?;

        let (next, observation) = match &action {
            ValidationAction::Approve(a) => (
                booking.state.approve(a.clone())?,
                format!("Approved with driver {} and taxi {}", a.driver_id, a.taxi_plate),
            ),
            ValidationAction::Reassign(a) => (
                booking.state.reassign(a.clone())?,
                format!("Reassigned to driver {} and taxi {}", a.driver_id, a.taxi_plate),
            ),
            ValidationAction::Reject(reason) => (
                booking.state.reject(reason.clone())?,
                format!("Rejected: {reason}"),
            ),
        };

        if let Some(assignment) = next.assignment() {
            check_assignment(&mut tx, assignment).await?;
        }

        booking.state = next;
        tx.update_booking(&booking).await?;
        tx.append_history(history_entry(&booking, action.command(), observation, now))
            .await?;
        tx.commit().await?;

        tracing::info!(
            booking_code = %booking.code,
            admin_id = actor.user_id,
            command = %action.command(),
            status = %booking.status(),
            "Booking validated",
        );
        Ok(booking)
    }

    /// PENDIENTE -> EN_CAMINO, by the assigned driver.
    pub async fn start_trip(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
    ) -> Result<Booking, CoreError> {
        self.advance_trip(
            actor,
            code,
            &Requirement::MANAGE_TRIP,
            Command::StartTrip,
            BookingState::start,
        )
        .await
    }

    /// EN_CAMINO -> RECOGIDO, by the assigned driver.
    pub async fn mark_pickup(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
    ) -> Result<Booking, CoreError> {
        self.advance_trip(
            actor,
            code,
            &Requirement::MARK_PICKUP,
            Command::MarkPickup,
            BookingState::pick_up,
        )
        .await
    }

    /// RECOGIDO -> COMPLETADO. Records the trip and issues a receipt at the
    /// offering's fixed price.
    pub async fn complete_trip(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
        input: CompleteTrip,
    ) -> Result<CompletedTrip, CoreError> {
        authorize(actor, &Requirement::MANAGE_TRIP)?;
        input.validate()?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let mut booking = lock(&mut tx, code).await?;
        let next = booking.state.complete(now)?;
        ensure_assigned_driver(&booking, actor, Command::CompleteTrip)?;

        let offering = tx
            .find_offering(&booking.offering.service_code, booking.offering.rate_id)
            .await?
            .ok_or_else(|| {
                CoreError::InvalidBookingData(format!(
                    "Booking {} references a missing offering {}/{}",
                    booking.code, booking.offering.service_code, booking.offering.rate_id
                ))
            })?;
        let total = offering.fixed_price()?;

        booking.state = next;
        tx.update_booking(&booking).await?;

        let trip = Trip {
            booking_code: booking.code.clone(),
            driver_id: actor.user_id,
            duration_minutes: input.duration_minutes,
            observation: input.observation,
            realized_at: now,
        };
        tx.insert_trip(&trip).await?;

        let receipt = tx
            .insert_receipt(NewReceipt {
                booking_code: booking.code.clone(),
                total,
                payment_method: input.payment_method,
                issued_at: now,
            })
            .await?;

        tx.append_history(history_entry(
            &booking,
            Command::CompleteTrip,
            format!(
                "Trip completed in {} min, paid {} by {}",
                trip.duration_minutes,
                total,
                receipt.payment_method.as_str()
            ),
            now,
        ))
        .await?;
        tx.commit().await?;

        tracing::info!(
            booking_code = %booking.code,
            driver_id = actor.user_id,
            receipt_id = receipt.id,
            total = %receipt.total,
            "Trip completed",
        );
        Ok(CompletedTrip {
            booking,
            trip,
            receipt,
        })
    }

    /// EN_REVISION | PENDIENTE -> CANCELADO, by the owning client or an
    /// administrator. Sets the soft-delete timestamp.
    pub async fn cancel_booking(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
    ) -> Result<Booking, CoreError> {
        authorize(actor, &Requirement::CANCEL_BOOKING)?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let mut booking = lock(&mut tx, code).await?;
        let next = booking.state.cancel(now)?;

        if !actor.is_admin() && booking.client_id != actor.user_id {
            tracing::warn!(
                booking_code = %booking.code,
                user_id = actor.user_id,
                "Cancellation attempted by a user who does not own the booking",
            );
            return Err(CoreError::Unauthorized(format!(
                "Booking {} does not belong to user {}",
                booking.code, actor.user_id
            )));
        }

        booking.state = next;
        tx.update_booking(&booking).await?;
        tx.append_history(history_entry(
            &booking,
            Command::Cancel,
            format!("Cancelled by user {}", actor.user_id),
            now,
        ))
        .await?;
        tx.commit().await?;

        tracing::info!(booking_code = %booking.code, user_id = actor.user_id, "Booking cancelled");
        Ok(booking)
    }

    /* --------------------------------------------------------------------
    Queries
    -------------------------------------------------------------------- */

    /// List bookings. Users who cannot see every booking are restricted to
    /// the ones where they are the client or the assigned driver.
    pub async fn get_bookings(
        &self,
        actor: &AuthenticatedUser,
        mut filter: BookingFilter,
    ) -> Result<Vec<Booking>, CoreError> {
        if !actor.sees_all_bookings() {
            match filter.user_id {
                Some(user_id) if user_id != actor.user_id => {
                    return Err(CoreError::Forbidden(
                        "Only administrators may list other users' bookings".into(),
                    ));
                }
                _ => filter.user_id = Some(actor.user_id),
            }
        }
        self.store.list_bookings(&filter).await
    }

    pub async fn get_booking(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
    ) -> Result<Booking, CoreError> {
        let booking = self
            .store
            .find_booking(code)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", code))?;
        ensure_visible(&booking, actor)?;
        Ok(booking)
    }

    /// History ledger of one booking, oldest first.
    pub async fn history(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        let booking = self.get_booking(actor, code).await?;
        self.store.history(&booking.code).await
    }

    /* --------------------------------------------------------------------
    Internals
    -------------------------------------------------------------------- */

    async fn advance_trip<F>(
        &self,
        actor: &AuthenticatedUser,
        code: &str,
        requirement: &Requirement,
        command: Command,
        step: F,
    ) -> Result<Booking, CoreError>
    where
        F: FnOnce(&BookingState) -> Result<BookingState, CoreError> + Send,
    {
        authorize(actor, requirement)?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let mut booking = lock(&mut tx, code).await?;
        let next = step(&booking.state)?;
        ensure_assigned_driver(&booking, actor, command)?;

        booking.state = next;
        tx.update_booking(&booking).await?;
        tx.append_history(history_entry(
            &booking,
            command,
            format!("Driver {} executed {command}", actor.user_id),
            now,
        ))
        .await?;
        tx.commit().await?;

        tracing::info!(
            booking_code = %booking.code,
            driver_id = actor.user_id,
            status = %booking.status(),
            "Trip advanced",
        );
        Ok(booking)
    }
}

async fn lock<T: BookingTx>(tx: &mut T, code: &str) -> Result<Booking, CoreError> {
    tx.lock_booking(code)
        .await?
        .ok_or_else(|| CoreError::not_found("Booking", code))
}

/// Driver must exist, be active and hold CONDUCTOR; taxi must exist and be
/// active.
async fn check_assignment<T: BookingTx>(
    tx: &mut T,
    assignment: &Assignment,
) -> Result<(), CoreError> {
    match tx.find_user(assignment.driver_id).await? {
        Some(user) if user.is_active && user.role == Role::Conductor => {}
        _ => return Err(CoreError::not_found("Driver", assignment.driver_id)),
    }
    match tx.find_taxi(&assignment.taxi_plate).await? {
        Some(taxi) if taxi.is_active => Ok(()),
        _ => Err(CoreError::not_found("Taxi", &assignment.taxi_plate)),
    }
}

fn ensure_assigned_driver(
    booking: &Booking,
    actor: &AuthenticatedUser,
    command: Command,
) -> Result<(), CoreError> {
    if booking.driver_id() == Some(actor.user_id) {
        return Ok(());
    }
    tracing::warn!(
        booking_code = %booking.code,
        user_id = actor.user_id,
        command = %command,
        "Trip command by a driver not assigned to the booking",
    );
    Err(CoreError::Unauthorized(format!(
        "User {} is not the driver assigned to booking {}",
        actor.user_id, booking.code
    )))
}

fn ensure_visible(booking: &Booking, actor: &AuthenticatedUser) -> Result<(), CoreError> {
    if actor.sees_all_bookings() || booking.involves(actor.user_id) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized(format!(
            "User {} may not view booking {}",
            actor.user_id, booking.code
        )))
    }
}

fn history_entry(
    booking: &Booking,
    command: Command,
    observation: String,
    at: Timestamp,
) -> NewHistoryEntry {
    NewHistoryEntry {
        booking_code: booking.code.clone(),
        action: command.history_action(),
        status: booking.status(),
        observation,
        recorded_at: at,
    }
}
