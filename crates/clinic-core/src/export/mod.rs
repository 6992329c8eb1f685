//! Billing export for completed appointments.

mod billing;

pub use billing::*;
