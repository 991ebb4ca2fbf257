//! Route handlers, grouped by page.

pub mod appointments;
pub mod contact;
pub mod doctor;
pub mod labs;
pub mod login;
pub mod patient;
