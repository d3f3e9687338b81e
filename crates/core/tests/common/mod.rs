//! Shared fixture for the core integration tests: an in-memory store seeded
//! with one user per role, two taxis and a few offerings.

#![allow(dead_code)]

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use radiotaxi_core::access::{AuthenticatedUser, UserAccount};
use radiotaxi_core::booking::{
    BookingType, CompleteTrip, Decision, NewBooking, Offering, PaymentMethod, Taxi,
    ValidateBooking,
};
use radiotaxi_core::guard::AccessGuard;
use radiotaxi_core::lifecycle::BookingLifecycle;
use radiotaxi_core::memory::{ManualClock, MemoryStore, SequentialCodes};
use radiotaxi_core::roles::{Permission, Role};
use radiotaxi_core::types::{DbId, Timestamp};

pub const CLIENT: DbId = 1;
pub const ADMIN: DbId = 2;
pub const DRIVER_1: DbId = 3;
pub const DRIVER_2: DbId = 4;
pub const OTHER_CLIENT: DbId = 5;

pub const TAXI_1: &str = "T1";
pub const TAXI_2: &str = "T2";
pub const RETIRED_TAXI: &str = "OLD1";

/// Offering with a positive price.
pub const PRICED_SERVICE: &str = "EJECUTIVO";
pub const PRICED_RATE: DbId = 1;
/// Offering whose rate price was removed.
pub const UNPRICED_SERVICE: &str = "ECONOMICO";
pub const UNPRICED_RATE: DbId = 2;

pub fn price() -> Decimal {
    Decimal::new(1250, 2)
}

pub fn start_time() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap()
}

pub type Lifecycle = BookingLifecycle<MemoryStore, ManualClock, SequentialCodes>;

pub struct Fixture {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub lifecycle: Lifecycle,
    pub guard: AccessGuard<MemoryStore, ManualClock>,
}

fn permissions_for(role: Role) -> BTreeSet<Permission> {
    match role {
        Role::Administrador => [
            Permission::CrearReserva,
            Permission::ValidarReserva,
            Permission::GestionarViajes,
            Permission::CancelarReserva,
            Permission::VerReservas,
        ]
        .into_iter()
        .collect(),
        Role::Cliente => [Permission::CrearReserva, Permission::CancelarReserva]
            .into_iter()
            .collect(),
        Role::Conductor => [Permission::GestionarViajes].into_iter().collect(),
    }
}

pub fn account(id: DbId, role: Role) -> UserAccount {
    UserAccount {
        id,
        username: format!("user{id}"),
        password_hash: String::new(),
        role,
        permissions: permissions_for(role),
        is_active: true,
    }
}

pub fn actor(id: DbId, role: Role) -> AuthenticatedUser {
    account(id, role).into()
}

pub fn client() -> AuthenticatedUser {
    actor(CLIENT, Role::Cliente)
}

pub fn admin() -> AuthenticatedUser {
    actor(ADMIN, Role::Administrador)
}

pub fn driver(id: DbId) -> AuthenticatedUser {
    actor(id, Role::Conductor)
}

pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    for (id, role) in [
        (CLIENT, Role::Cliente),
        (ADMIN, Role::Administrador),
        (DRIVER_1, Role::Conductor),
        (DRIVER_2, Role::Conductor),
        (OTHER_CLIENT, Role::Cliente),
    ] {
        store.add_user(account(id, role)).await;
    }
    for (plate, is_active) in [(TAXI_1, true), (TAXI_2, true), (RETIRED_TAXI, false)] {
        store
            .add_taxi(Taxi {
                plate: plate.into(),
                is_active,
            })
            .await;
    }
    store
        .add_offering(Offering {
            service_code: PRICED_SERVICE.into(),
            service_name: "Ejecutivo".into(),
            rate_id: PRICED_RATE,
            rate_price: Some(price()),
        })
        .await;
    store
        .add_offering(Offering {
            service_code: UNPRICED_SERVICE.into(),
            service_name: "Economico".into(),
            rate_id: UNPRICED_RATE,
            rate_price: None,
        })
        .await;

    let clock = ManualClock::new(start_time());
    let lifecycle = BookingLifecycle::new(store.clone(), clock.clone(), SequentialCodes::default());
    let guard = AccessGuard::new(store.clone(), clock.clone());
    Fixture {
        store,
        clock,
        lifecycle,
        guard,
    }
}

pub fn new_booking() -> NewBooking {
    NewBooking {
        origin: "Av. Amazonas N34-120".into(),
        destination: "Aeropuerto Mariscal Sucre".into(),
        requested_at: Some(start_time() + Duration::hours(1)),
        booking_type: BookingType::Normal,
        observation: Some("Two suitcases".into()),
        service_code: PRICED_SERVICE.into(),
        rate_id: PRICED_RATE,
    }
}

pub fn approve(driver_id: DbId, plate: &str) -> ValidateBooking {
    ValidateBooking {
        decision: Decision::Aprobar,
        driver_id: Some(driver_id),
        taxi_plate: Some(plate.into()),
        reason: None,
        reassign: false,
    }
}

pub fn reassign(driver_id: DbId, plate: &str) -> ValidateBooking {
    ValidateBooking {
        reassign: true,
        ..approve(driver_id, plate)
    }
}

pub fn reject(reason: &str) -> ValidateBooking {
    ValidateBooking {
        decision: Decision::Rechazar,
        driver_id: None,
        taxi_plate: None,
        reason: Some(reason.into()),
        reassign: false,
    }
}

pub fn complete(minutes: i32) -> CompleteTrip {
    CompleteTrip {
        duration_minutes: minutes,
        observation: Some("Smooth ride".into()),
        payment_method: PaymentMethod::Efectivo,
    }
}
