//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection`; callers own the
//! connection for the lifetime of one request.

mod appointment;
mod health_log;
mod lab_result;
mod message;
mod patient;
mod recommendation;
mod staff;

use chrono::{NaiveDate, NaiveDateTime};

use super::{DatabaseError, TIMESTAMP_FORMAT};

pub use appointment::*;
pub use health_log::*;
pub use lab_result::*;
pub use message::*;
pub use patient::*;
pub use recommendation::*;
pub use staff::*;

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        DatabaseError::InvalidTimestamp {
            field: field.into(),
            value: value.into(),
        }
    })
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DatabaseError::InvalidTimestamp {
        field: field.into(),
        value: value.into(),
    })
}
