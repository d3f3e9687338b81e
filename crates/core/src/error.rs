use crate::booking::{BookingStatus, Command};

/// Domain error raised by the access guard and the booking lifecycle.
///
/// Every variant leaves persisted state untouched: the lifecycle only
/// commits after all checks have passed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Session token absent, malformed, expired or invalidated.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Authenticated but lacking a required permission or role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Command not accepted from the booking's current state.
    #[error("Command '{command}' is not allowed from state {from}")]
    InvalidStateTransition { command: Command, from: BookingStatus },

    /// Actor does not match the booking (wrong driver, foreign client).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Required command field missing or malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Stored data that cannot support the requested operation
    /// (e.g. an offering without a positive rate at completion).
    #[error("Invalid booking data: {0}")]
    InvalidBookingData(String),

    /// Persistence or transport failure. Callers may retry.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transition_message_names_command_and_state() {
        let err = CoreError::InvalidStateTransition {
            command: Command::StartTrip,
            from: BookingStatus::EnRevision,
        };
        assert_eq!(
            err.to_string(),
            "Command 'start trip' is not allowed from state EN_REVISION"
        );
    }

    #[test]
    fn not_found_helper_formats_id() {
        let err = CoreError::not_found("Booking", "RT-AAAA");
        assert_eq!(err.to_string(), "Entity not found: Booking with id RT-AAAA");
    }
}
