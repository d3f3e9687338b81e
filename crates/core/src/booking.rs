//! Booking entity, state machine and transition table.
//!
//! A booking moves along
//!
//! ```text
//! EN_REVISION -> PENDIENTE -> EN_CAMINO -> RECOGIDO -> COMPLETADO
//!      |             |
//!      |             +-> CANCELADO
//!      +-> CANCELADO
//!      +-> RECHAZADO
//! ```
//!
//! [`BookingState`] carries the data each state requires (an assignment from
//! PENDIENTE onward, a reason for RECHAZADO), so a completed booking without
//! a driver cannot be constructed. The declarative table in
//! [`Command::allowed_from`] and the transition methods on [`BookingState`]
//! must agree; the tests below check that they do.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{BookingCode, DbId, Timestamp};

/// Maximum length for origin / destination addresses.
pub const MAX_ADDRESS_LENGTH: usize = 255;

/// Maximum length for free-text observations and rejection reasons.
pub const MAX_OBSERVATION_LENGTH: usize = 1_000;

/* --------------------------------------------------------------------------
Labels
-------------------------------------------------------------------------- */

/// Persisted state label (`bookings.status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    EnRevision,
    Pendiente,
    EnCamino,
    Recogido,
    Completado,
    Cancelado,
    Rechazado,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        Self::EnRevision,
        Self::Pendiente,
        Self::EnCamino,
        Self::Recogido,
        Self::Completado,
        Self::Cancelado,
        Self::Rechazado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnRevision => "EN_REVISION",
            Self::Pendiente => "PENDIENTE",
            Self::EnCamino => "EN_CAMINO",
            Self::Recogido => "RECOGIDO",
            Self::Completado => "COMPLETADO",
            Self::Cancelado => "CANCELADO",
            Self::Rechazado => "RECHAZADO",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| CoreError::BadRequest(format!("Unknown booking state '{name}'")))
    }

    /// COMPLETADO, CANCELADO and RECHAZADO accept no further commands.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completado | Self::Cancelado | Self::Rechazado)
    }

    /// States in which a driver and a taxi must be assigned.
    pub fn requires_assignment(self) -> bool {
        matches!(
            self,
            Self::Pendiente | Self::EnCamino | Self::Recogido | Self::Completado
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingType {
    Normal,
    Urgente,
    /// Scheduled ahead of time; needs a requested time in the future.
    Programado,
}

impl BookingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Urgente => "URGENTE",
            Self::Programado => "PROGRAMADO",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "NORMAL" => Ok(Self::Normal),
            "URGENTE" => Ok(Self::Urgente),
            "PROGRAMADO" => Ok(Self::Programado),
            other => Err(CoreError::BadRequest(format!(
                "Unknown booking type '{other}'. Must be one of: NORMAL, URGENTE, PROGRAMADO"
            ))),
        }
    }
}

/// History ledger action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Creacion,
    Confirmacion,
    Modificacion,
    Cancelacion,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creacion => "CREACION",
            Self::Confirmacion => "CONFIRMACION",
            Self::Modificacion => "MODIFICACION",
            Self::Cancelacion => "CANCELACION",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "CREACION" => Ok(Self::Creacion),
            "CONFIRMACION" => Ok(Self::Confirmacion),
            "MODIFICACION" => Ok(Self::Modificacion),
            "CANCELACION" => Ok(Self::Cancelacion),
            other => Err(CoreError::InvalidBookingData(format!(
                "Unknown history action '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Efectivo => "EFECTIVO",
            Self::Tarjeta => "TARJETA",
            Self::Transferencia => "TRANSFERENCIA",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "EFECTIVO" => Ok(Self::Efectivo),
            "TARJETA" => Ok(Self::Tarjeta),
            "TRANSFERENCIA" => Ok(Self::Transferencia),
            other => Err(CoreError::BadRequest(format!(
                "Unknown payment method '{other}'. Must be one of: EFECTIVO, TARJETA, TRANSFERENCIA"
            ))),
        }
    }
}

/// Administrator decision on a booking under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Aprobar,
    Rechazar,
}

/* --------------------------------------------------------------------------
Transition table
-------------------------------------------------------------------------- */

/// A lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create,
    /// First confirmation: APROBAR from EN_REVISION.
    Approve,
    /// APROBAR on an already confirmed booking, replacing driver and taxi.
    Reassign,
    Reject,
    StartTrip,
    MarkPickup,
    CompleteTrip,
    Cancel,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Self::Create,
        Self::Approve,
        Self::Reassign,
        Self::Reject,
        Self::StartTrip,
        Self::MarkPickup,
        Self::CompleteTrip,
        Self::Cancel,
    ];

    /// States from which the command is accepted. Empty for `Create`.
    pub fn allowed_from(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Self::Create => &[],
            Self::Approve => &[EnRevision],
            Self::Reassign => &[Pendiente],
            Self::Reject => &[EnRevision],
            Self::StartTrip => &[Pendiente],
            Self::MarkPickup => &[EnCamino],
            Self::CompleteTrip => &[Recogido],
            Self::Cancel => &[EnRevision, Pendiente],
        }
    }

    /// State the booking is in after the command is accepted.
    pub fn target(self) -> BookingStatus {
        use BookingStatus::*;
        match self {
            Self::Create => EnRevision,
            Self::Approve | Self::Reassign => Pendiente,
            Self::Reject => Rechazado,
            Self::StartTrip => EnCamino,
            Self::MarkPickup => Recogido,
            Self::CompleteTrip => Completado,
            Self::Cancel => Cancelado,
        }
    }

    /// Action tag written to the history ledger.
    pub fn history_action(self) -> HistoryAction {
        match self {
            Self::Create => HistoryAction::Creacion,
            Self::Approve => HistoryAction::Confirmacion,
            Self::Cancel => HistoryAction::Cancelacion,
            Self::Reassign
            | Self::Reject
            | Self::StartTrip
            | Self::MarkPickup
            | Self::CompleteTrip => HistoryAction::Modificacion,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Approve => "approve",
            Self::Reassign => "reassign",
            Self::Reject => "reject",
            Self::StartTrip => "start trip",
            Self::MarkPickup => "mark pickup",
            Self::CompleteTrip => "complete trip",
            Self::Cancel => "cancel",
        }
    }

    /// Whether a transition `from -> to` is produced by some command.
    pub fn connects(from: BookingStatus, to: BookingStatus) -> bool {
        Self::ALL
            .into_iter()
            .any(|c| c.target() == to && c.allowed_from().contains(&from))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Check that a sequence of recorded states is a valid walk through the
/// transition table starting at EN_REVISION.
pub fn is_valid_path(states: &[BookingStatus]) -> bool {
    match states.first() {
        None => true,
        Some(first) if *first != BookingStatus::EnRevision => false,
        Some(_) => states
            .windows(2)
            .all(|pair| Command::connects(pair[0], pair[1])),
    }
}

/* --------------------------------------------------------------------------
State
-------------------------------------------------------------------------- */

/// Driver and taxi assigned by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub driver_id: DbId,
    pub taxi_plate: String,
}

/// Booking state with the data each state requires.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    EnRevision,
    Pendiente {
        assignment: Assignment,
    },
    EnCamino {
        assignment: Assignment,
    },
    Recogido {
        assignment: Assignment,
    },
    Completado {
        assignment: Assignment,
        realized_at: Timestamp,
    },
    Rechazado {
        reason: String,
    },
    Cancelado {
        cancelled_at: Timestamp,
    },
}

impl BookingState {
    pub fn status(&self) -> BookingStatus {
        match self {
            Self::EnRevision => BookingStatus::EnRevision,
            Self::Pendiente { .. } => BookingStatus::Pendiente,
            Self::EnCamino { .. } => BookingStatus::EnCamino,
            Self::Recogido { .. } => BookingStatus::Recogido,
            Self::Completado { .. } => BookingStatus::Completado,
            Self::Rechazado { .. } => BookingStatus::Rechazado,
            Self::Cancelado { .. } => BookingStatus::Cancelado,
        }
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Pendiente { assignment }
            | Self::EnCamino { assignment }
            | Self::Recogido { assignment }
            | Self::Completado { assignment, .. } => Some(assignment),
            Self::EnRevision | Self::Rechazado { .. } | Self::Cancelado { .. } => None,
        }
    }

    /// Rebuild a state from its flat persisted columns.
    ///
    /// Fails with [`CoreError::InvalidBookingData`] when the columns violate
    /// the assignment invariant (e.g. PENDIENTE without a taxi).
    pub fn from_parts(
        status: BookingStatus,
        driver_id: Option<DbId>,
        taxi_plate: Option<String>,
        realized_at: Option<Timestamp>,
        rejection_reason: Option<String>,
        deleted_at: Option<Timestamp>,
    ) -> Result<Self, CoreError> {
        let assignment = match (driver_id, taxi_plate) {
            (Some(driver_id), Some(taxi_plate)) => Some(Assignment {
                driver_id,
                taxi_plate,
            }),
            (None, None) => None,
            _ => {
                return Err(CoreError::InvalidBookingData(format!(
                    "Booking in state {status} has a partial driver/taxi assignment"
                )))
            }
        };

        if status.requires_assignment() != assignment.is_some() {
            return Err(CoreError::InvalidBookingData(format!(
                "Booking in state {status} has an inconsistent driver/taxi assignment"
            )));
        }

        let missing = |column: &str| {
            CoreError::InvalidBookingData(format!("Booking in state {status} is missing {column}"))
        };

        Ok(match (status, assignment) {
            (BookingStatus::EnRevision, None) => Self::EnRevision,
            (BookingStatus::Pendiente, Some(assignment)) => Self::Pendiente { assignment },
            (BookingStatus::EnCamino, Some(assignment)) => Self::EnCamino { assignment },
            (BookingStatus::Recogido, Some(assignment)) => Self::Recogido { assignment },
            (BookingStatus::Completado, Some(assignment)) => Self::Completado {
                assignment,
                realized_at: realized_at.ok_or_else(|| missing("realized_at"))?,
            },
            (BookingStatus::Rechazado, None) => Self::Rechazado {
                reason: rejection_reason.ok_or_else(|| missing("rejection_reason"))?,
            },
            (BookingStatus::Cancelado, None) => Self::Cancelado {
                cancelled_at: deleted_at.ok_or_else(|| missing("deleted_at"))?,
            },
            // Every remaining combination was rejected by the invariant check above.
            (status, _) => {
                return Err(CoreError::InvalidBookingData(format!(
                    "Booking in state {status} has an inconsistent driver/taxi assignment"
                )))
            }
        })
    }

    fn rejects(&self, command: Command) -> CoreError {
        CoreError::InvalidStateTransition {
            command,
            from: self.status(),
        }
    }

    /// EN_REVISION -> PENDIENTE.
    pub fn approve(&self, assignment: Assignment) -> Result<Self, CoreError> {
        match self {
            Self::EnRevision => Ok(Self::Pendiente { assignment }),
            other => Err(other.rejects(Command::Approve)),
        }
    }

    /// PENDIENTE -> PENDIENTE with a new driver and taxi.
    pub fn reassign(&self, assignment: Assignment) -> Result<Self, CoreError> {
        match self {
            Self::Pendiente { .. } => Ok(Self::Pendiente { assignment }),
            other => Err(other.rejects(Command::Reassign)),
        }
    }

    /// EN_REVISION -> RECHAZADO.
    pub fn reject(&self, reason: String) -> Result<Self, CoreError> {
        match self {
            Self::EnRevision => Ok(Self::Rechazado { reason }),
            other => Err(other.rejects(Command::Reject)),
        }
    }

    /// PENDIENTE -> EN_CAMINO.
    pub fn start(&self) -> Result<Self, CoreError> {
        match self {
            Self::Pendiente { assignment } => Ok(Self::EnCamino {
                assignment: assignment.clone(),
            }),
            other => Err(other.rejects(Command::StartTrip)),
        }
    }

    /// EN_CAMINO -> RECOGIDO.
    pub fn pick_up(&self) -> Result<Self, CoreError> {
        match self {
            Self::EnCamino { assignment } => Ok(Self::Recogido {
                assignment: assignment.clone(),
            }),
            other => Err(other.rejects(Command::MarkPickup)),
        }
    }

    /// RECOGIDO -> COMPLETADO.
    pub fn complete(&self, realized_at: Timestamp) -> Result<Self, CoreError> {
        match self {
            Self::Recogido { assignment } => Ok(Self::Completado {
                assignment: assignment.clone(),
                realized_at,
            }),
            other => Err(other.rejects(Command::CompleteTrip)),
        }
    }

    /// EN_REVISION | PENDIENTE -> CANCELADO.
    pub fn cancel(&self, cancelled_at: Timestamp) -> Result<Self, CoreError> {
        match self {
            Self::EnRevision | Self::Pendiente { .. } => Ok(Self::Cancelado { cancelled_at }),
            other => Err(other.rejects(Command::Cancel)),
        }
    }
}

/* --------------------------------------------------------------------------
Entities
-------------------------------------------------------------------------- */

/// The service + rate pair a booking was priced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferingRef {
    pub service_code: String,
    pub rate_id: DbId,
}

/// A ride reservation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub code: BookingCode,
    pub client_id: DbId,
    pub origin: String,
    pub destination: String,
    pub requested_at: Timestamp,
    pub booking_type: BookingType,
    pub observation: Option<String>,
    pub offering: OfferingRef,
    #[serde(flatten)]
    pub state: BookingState,
    pub created_at: Timestamp,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        self.state.status()
    }

    pub fn driver_id(&self) -> Option<DbId> {
        self.state.assignment().map(|a| a.driver_id)
    }

    /// Soft-delete timestamp, set when the booking is cancelled.
    pub fn deleted_at(&self) -> Option<Timestamp> {
        match self.state {
            BookingState::Cancelado { cancelled_at } => Some(cancelled_at),
            _ => None,
        }
    }

    pub fn realized_at(&self) -> Option<Timestamp> {
        match self.state {
            BookingState::Completado { realized_at, .. } => Some(realized_at),
            _ => None,
        }
    }

    /// Whether `user_id` is the client or the assigned driver.
    pub fn involves(&self, user_id: DbId) -> bool {
        self.client_id == user_id || self.driver_id() == Some(user_id)
    }
}

/// An offering row: a service paired with a rate. The rate price may be
/// missing when the rate was retired after the booking was priced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offering {
    pub service_code: String,
    pub service_name: String,
    pub rate_id: DbId,
    pub rate_price: Option<Decimal>,
}

impl Offering {
    /// The fixed price billed at completion.
    pub fn fixed_price(&self) -> Result<Decimal, CoreError> {
        match self.rate_price {
            Some(price) if price > Decimal::ZERO => Ok(price),
            Some(price) => Err(CoreError::InvalidBookingData(format!(
                "Rate {} for service {} has non-positive price {price}",
                self.rate_id, self.service_code
            ))),
            None => Err(CoreError::InvalidBookingData(format!(
                "Service {} has no price for rate {}",
                self.service_code, self.rate_id
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxi {
    pub plate: String,
    pub is_active: bool,
}

/// An immutable audit record of one accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: DbId,
    pub booking_code: BookingCode,
    pub action: HistoryAction,
    pub status: BookingStatus,
    pub observation: String,
    pub recorded_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub booking_code: BookingCode,
    pub action: HistoryAction,
    pub status: BookingStatus,
    pub observation: String,
    pub recorded_at: Timestamp,
}

/// The realized ride recorded at completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub booking_code: BookingCode,
    pub driver_id: DbId,
    pub duration_minutes: i32,
    pub observation: Option<String>,
    pub realized_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub id: DbId,
    pub booking_code: BookingCode,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub issued_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub booking_code: BookingCode,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub issued_at: Timestamp,
}

/// Result of `complete_trip`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTrip {
    pub booking: Booking,
    pub trip: Trip,
    pub receipt: Receipt,
}

/* --------------------------------------------------------------------------
Command inputs
-------------------------------------------------------------------------- */

/// Input for `create_booking`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub origin: String,
    pub destination: String,
    /// Defaults to "now" for NORMAL and URGENTE bookings.
    pub requested_at: Option<Timestamp>,
    pub booking_type: BookingType,
    pub observation: Option<String>,
    pub service_code: String,
    pub rate_id: DbId,
}

impl NewBooking {
    /// Validate addresses and scheduling, returning the effective requested time.
    pub fn validate(&self, now: Timestamp) -> Result<Timestamp, CoreError> {
        validate_address("origin", &self.origin)?;
        validate_address("destination", &self.destination)?;
        validate_observation(self.observation.as_deref())?;

        if self.service_code.trim().is_empty() {
            return Err(CoreError::BadRequest("service_code is required".into()));
        }

        match (self.booking_type, self.requested_at) {
            (BookingType::Programado, None) => Err(CoreError::BadRequest(
                "A PROGRAMADO booking requires a requested time".into(),
            )),
            (BookingType::Programado, Some(at)) if at <= now => Err(CoreError::BadRequest(
                "A PROGRAMADO booking must be requested for a future time".into(),
            )),
            (_, Some(at)) => Ok(at),
            (_, None) => Ok(now),
        }
    }
}

/// Input for `validate_and_assign`.
#[derive(Debug, Clone)]
pub struct ValidateBooking {
    pub decision: Decision,
    pub driver_id: Option<DbId>,
    pub taxi_plate: Option<String>,
    pub reason: Option<String>,
    /// APROBAR on a PENDIENTE booking must say so explicitly.
    pub reassign: bool,
}

/// A validated administrator decision.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationAction {
    Approve(Assignment),
    Reassign(Assignment),
    Reject(String),
}

impl ValidationAction {
    pub fn command(&self) -> Command {
        match self {
            Self::Approve(_) => Command::Approve,
            Self::Reassign(_) => Command::Reassign,
            Self::Reject(_) => Command::Reject,
        }
    }
}

impl ValidateBooking {
    /// Check required fields for the decision. Runs before any state check.
    pub fn into_action(self) -> Result<ValidationAction, CoreError> {
        match self.decision {
            Decision::Aprobar => {
                let driver_id = self.driver_id.ok_or_else(|| {
                    CoreError::BadRequest("APROBAR requires a driver_id".into())
                })?;
                let taxi_plate = self
                    .taxi_plate
                    .map(|p| p.trim().to_uppercase())
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| CoreError::BadRequest("APROBAR requires a taxi_plate".into()))?;
                let assignment = Assignment {
                    driver_id,
                    taxi_plate,
                };
                Ok(if self.reassign {
                    ValidationAction::Reassign(assignment)
                } else {
                    ValidationAction::Approve(assignment)
                })
            }
            Decision::Rechazar => {
                let reason = self
                    .reason
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        CoreError::BadRequest("RECHAZAR requires a non-empty reason".into())
                    })?;
                validate_observation(Some(&reason))?;
                Ok(ValidationAction::Reject(reason))
            }
        }
    }
}

/// Input for `complete_trip`.
#[derive(Debug, Clone)]
pub struct CompleteTrip {
    pub duration_minutes: i32,
    pub observation: Option<String>,
    pub payment_method: PaymentMethod,
}

impl CompleteTrip {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.duration_minutes <= 0 {
            return Err(CoreError::BadRequest(format!(
                "duration_minutes must be positive, got {}",
                self.duration_minutes
            )));
        }
        validate_observation(self.observation.as_deref())
    }
}

/// Filters for `get_bookings`.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    /// Calendar day (UTC) of the requested time.
    pub date: Option<NaiveDate>,
    /// Bookings where this user is the client or the assigned driver.
    pub user_id: Option<DbId>,
}

impl BookingFilter {
    /// Whether a booking passes the filter. Cancelled (soft-deleted)
    /// bookings only match when CANCELADO is requested explicitly.
    pub fn matches(&self, booking: &Booking) -> bool {
        let status_ok = match self.status {
            Some(status) => booking.status() == status,
            None => booking.deleted_at().is_none(),
        };
        let date_ok = self
            .date
            .is_none_or(|d| booking.requested_at.date_naive() == d);
        let user_ok = self.user_id.is_none_or(|u| booking.involves(u));
        status_ok && date_ok && user_ok
    }
}

/* --------------------------------------------------------------------------
Validation helpers
-------------------------------------------------------------------------- */

fn validate_address(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > MAX_ADDRESS_LENGTH {
        return Err(CoreError::BadRequest(format!(
            "{field} exceeds maximum length of {MAX_ADDRESS_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_observation(value: Option<&str>) -> Result<(), CoreError> {
    match value {
        Some(text) if text.chars().count() > MAX_OBSERVATION_LENGTH => {
            Err(CoreError::BadRequest(format!(
                "Observation exceeds maximum length of {MAX_OBSERVATION_LENGTH} characters"
            )))
        }
        _ => Ok(()),
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    fn assignment() -> Assignment {
        Assignment {
            driver_id: 7,
            taxi_plate: "T1".into(),
        }
    }

    /// One representative state per status.
    fn sample(status: BookingStatus) -> BookingState {
        match status {
            BookingStatus::EnRevision => BookingState::EnRevision,
            BookingStatus::Pendiente => BookingState::Pendiente {
                assignment: assignment(),
            },
            BookingStatus::EnCamino => BookingState::EnCamino {
                assignment: assignment(),
            },
            BookingStatus::Recogido => BookingState::Recogido {
                assignment: assignment(),
            },
            BookingStatus::Completado => BookingState::Completado {
                assignment: assignment(),
                realized_at: at(10),
            },
            BookingStatus::Rechazado => BookingState::Rechazado {
                reason: "no taxis".into(),
            },
            BookingStatus::Cancelado => BookingState::Cancelado {
                cancelled_at: at(9),
            },
        }
    }

    fn apply(state: &BookingState, command: Command) -> Result<BookingState, CoreError> {
        match command {
            Command::Create => unreachable!("create has no source state"),
            Command::Approve => state.approve(assignment()),
            Command::Reassign => state.reassign(assignment()),
            Command::Reject => state.reject("reason".into()),
            Command::StartTrip => state.start(),
            Command::MarkPickup => state.pick_up(),
            Command::CompleteTrip => state.complete(at(11)),
            Command::Cancel => state.cancel(at(11)),
        }
    }

    #[test]
    fn transition_methods_agree_with_table() {
        for command in Command::ALL.into_iter().filter(|c| *c != Command::Create) {
            for status in BookingStatus::ALL {
                let result = apply(&sample(status), command);
                if command.allowed_from().contains(&status) {
                    let next = result.expect("allowed transition must succeed");
                    assert_eq!(next.status(), command.target(), "{command} from {status}");
                } else {
                    assert_matches!(
                        result,
                        Err(CoreError::InvalidStateTransition { command: c, from })
                            if c == command && from == status
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for status in BookingStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for command in Command::ALL {
                assert!(
                    !command.allowed_from().contains(&status),
                    "{command} must not be accepted from terminal {status}"
                );
            }
        }
    }

    #[test]
    fn assignment_present_exactly_when_required() {
        for status in BookingStatus::ALL {
            let state = sample(status);
            assert_eq!(state.assignment().is_some(), status.requires_assignment());
        }
    }

    #[test]
    fn history_actions_follow_table() {
        assert_eq!(Command::Create.history_action(), HistoryAction::Creacion);
        assert_eq!(Command::Approve.history_action(), HistoryAction::Confirmacion);
        assert_eq!(Command::Reassign.history_action(), HistoryAction::Modificacion);
        assert_eq!(Command::Reject.history_action(), HistoryAction::Modificacion);
        assert_eq!(Command::Cancel.history_action(), HistoryAction::Cancelacion);
    }

    #[test]
    fn valid_paths() {
        use BookingStatus::*;
        assert!(is_valid_path(&[EnRevision, Pendiente, EnCamino, Recogido, Completado]));
        assert!(is_valid_path(&[EnRevision, Pendiente, Pendiente, Cancelado]));
        assert!(is_valid_path(&[EnRevision, Rechazado]));
        assert!(!is_valid_path(&[EnRevision, EnCamino]));
        assert!(!is_valid_path(&[Pendiente, EnCamino]));
        assert!(!is_valid_path(&[EnRevision, Pendiente, EnCamino, Cancelado]));
        assert!(!is_valid_path(&[EnRevision, Cancelado, Pendiente]));
    }

    #[test]
    fn from_parts_rebuilds_each_state() {
        for status in BookingStatus::ALL {
            let state = sample(status);
            let a = state.assignment().cloned();
            let rebuilt = BookingState::from_parts(
                status,
                a.as_ref().map(|a| a.driver_id),
                a.map(|a| a.taxi_plate),
                Some(at(10)),
                Some("no taxis".into()),
                Some(at(9)),
            )
            .expect("consistent columns");
            assert_eq!(rebuilt, state);
        }
    }

    #[test]
    fn from_parts_rejects_partial_assignment() {
        let result = BookingState::from_parts(
            BookingStatus::Pendiente,
            Some(1),
            None,
            None,
            None,
            None,
        );
        assert_matches!(result, Err(CoreError::InvalidBookingData(_)));
    }

    #[test]
    fn from_parts_rejects_assignment_under_review() {
        let result = BookingState::from_parts(
            BookingStatus::EnRevision,
            Some(1),
            Some("T1".into()),
            None,
            None,
            None,
        );
        assert_matches!(result, Err(CoreError::InvalidBookingData(_)));
    }

    #[test]
    fn status_labels_parse() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_name(status.as_str()).unwrap(), status);
        }
        assert_matches!(
            BookingStatus::from_name("CONFIRMADO"),
            Err(CoreError::BadRequest(_))
        );
    }

    #[test]
    fn approve_requires_driver_and_taxi() {
        let input = ValidateBooking {
            decision: Decision::Aprobar,
            driver_id: Some(3),
            taxi_plate: None,
            reason: None,
            reassign: false,
        };
        assert_matches!(input.into_action(), Err(CoreError::BadRequest(_)));

        let input = ValidateBooking {
            decision: Decision::Aprobar,
            driver_id: None,
            taxi_plate: Some("T1".into()),
            reason: None,
            reassign: false,
        };
        assert_matches!(input.into_action(), Err(CoreError::BadRequest(_)));
    }

    #[test]
    fn approve_normalizes_plate() {
        let input = ValidateBooking {
            decision: Decision::Aprobar,
            driver_id: Some(3),
            taxi_plate: Some(" abc123 ".into()),
            reason: None,
            reassign: true,
        };
        assert_eq!(
            input.into_action().unwrap(),
            ValidationAction::Reassign(Assignment {
                driver_id: 3,
                taxi_plate: "ABC123".into()
            })
        );
    }

    #[test]
    fn reject_requires_reason() {
        let input = ValidateBooking {
            decision: Decision::Rechazar,
            driver_id: None,
            taxi_plate: None,
            reason: Some("   ".into()),
            reassign: false,
        };
        assert_matches!(input.into_action(), Err(CoreError::BadRequest(_)));
    }

    #[test]
    fn scheduled_booking_needs_future_time() {
        let now = at(12);
        let mut input = NewBooking {
            origin: "Av. Principal 1".into(),
            destination: "Terminal".into(),
            requested_at: None,
            booking_type: BookingType::Programado,
            observation: None,
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
        };
        assert_matches!(input.validate(now), Err(CoreError::BadRequest(_)));

        input.requested_at = Some(now - Duration::hours(1));
        assert_matches!(input.validate(now), Err(CoreError::BadRequest(_)));

        input.requested_at = Some(now + Duration::hours(1));
        assert_eq!(input.validate(now).unwrap(), now + Duration::hours(1));
    }

    #[test]
    fn immediate_booking_defaults_to_now() {
        let now = at(12);
        let input = NewBooking {
            origin: "Av. Principal 1".into(),
            destination: "Terminal".into(),
            requested_at: None,
            booking_type: BookingType::Urgente,
            observation: Some("two bags".into()),
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
        };
        assert_eq!(input.validate(now).unwrap(), now);
    }

    #[test]
    fn empty_origin_is_rejected() {
        let input = NewBooking {
            origin: "  ".into(),
            destination: "Terminal".into(),
            requested_at: None,
            booking_type: BookingType::Normal,
            observation: None,
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
        };
        assert_matches!(input.validate(at(12)), Err(CoreError::BadRequest(_)));
    }

    #[test]
    fn address_limit_counts_characters() {
        let mut input = NewBooking {
            origin: "ñ".repeat(MAX_ADDRESS_LENGTH),
            destination: "Terminal".into(),
            requested_at: None,
            booking_type: BookingType::Normal,
            observation: Some("é".repeat(MAX_OBSERVATION_LENGTH)),
            service_code: "EJECUTIVO".into(),
            rate_id: 1,
        };
        assert!(input.validate(at(12)).is_ok());

        input.origin.push('ñ');
        assert_matches!(
            input.validate(at(12)),
            Err(CoreError::BadRequest(msg)) if msg.contains("origin")
        );
    }

    #[test]
    fn offering_price_must_be_positive() {
        let mut offering = Offering {
            service_code: "EJECUTIVO".into(),
            service_name: "Ejecutivo".into(),
            rate_id: 1,
            rate_price: None,
        };
        assert_matches!(offering.fixed_price(), Err(CoreError::InvalidBookingData(_)));

        offering.rate_price = Some(Decimal::ZERO);
        assert_matches!(offering.fixed_price(), Err(CoreError::InvalidBookingData(_)));

        offering.rate_price = Some(Decimal::new(1250, 2));
        assert_eq!(offering.fixed_price().unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn completion_needs_positive_duration() {
        let input = CompleteTrip {
            duration_minutes: 0,
            observation: None,
            payment_method: PaymentMethod::Efectivo,
        };
        assert_matches!(input.validate(), Err(CoreError::BadRequest(_)));
    }
}
