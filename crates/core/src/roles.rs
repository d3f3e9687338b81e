//! Well-known role and permission names.
//!
//! These must match the seed data in `20260101000002_seed_roles_permissions.sql`.

use std::fmt;

use serde::Serialize;

pub const ROLE_ADMIN: &str = "ADMINISTRADOR";
pub const ROLE_CLIENT: &str = "CLIENTE";
pub const ROLE_DRIVER: &str = "CONDUCTOR";

pub const PERM_CREATE_BOOKING: &str = "crear_reserva";
pub const PERM_VALIDATE_BOOKING: &str = "validar_reserva";
pub const PERM_MANAGE_TRIPS: &str = "gestionar_viajes";
pub const PERM_CANCEL_BOOKING: &str = "cancelar_reserva";
pub const PERM_VIEW_BOOKINGS: &str = "ver_reservas";

/// A user's role. Every user holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Bypasses every permission check.
    Administrador,
    Cliente,
    Conductor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrador => ROLE_ADMIN,
            Self::Cliente => ROLE_CLIENT,
            Self::Conductor => ROLE_DRIVER,
        }
    }

    /// Parse from the `roles.name` column.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ROLE_ADMIN => Some(Self::Administrador),
            ROLE_CLIENT => Some(Self::Cliente),
            ROLE_DRIVER => Some(Self::Conductor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fine-grained capability granted to roles through `role_permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CrearReserva,
    ValidarReserva,
    GestionarViajes,
    CancelarReserva,
    VerReservas,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrearReserva => PERM_CREATE_BOOKING,
            Self::ValidarReserva => PERM_VALIDATE_BOOKING,
            Self::GestionarViajes => PERM_MANAGE_TRIPS,
            Self::CancelarReserva => PERM_CANCEL_BOOKING,
            Self::VerReservas => PERM_VIEW_BOOKINGS,
        }
    }

    /// Parse from the `permissions.name` column.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            PERM_CREATE_BOOKING => Some(Self::CrearReserva),
            PERM_VALIDATE_BOOKING => Some(Self::ValidarReserva),
            PERM_MANAGE_TRIPS => Some(Self::GestionarViajes),
            PERM_CANCEL_BOOKING => Some(Self::CancelarReserva),
            PERM_VIEW_BOOKINGS => Some(Self::VerReservas),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
