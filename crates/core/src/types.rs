/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Booking codes are short opaque strings (e.g. `RT-7K2P9QXA`).
pub type BookingCode = String;
