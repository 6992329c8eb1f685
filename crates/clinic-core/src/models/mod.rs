//! Domain models for the clinic scheduling engine.

mod appointment;
mod medicine;
mod outcome;
mod prescription;
mod principal;
mod record;
mod replenishment;
pub mod slot_time;

pub use appointment::*;
pub use medicine::*;
pub use outcome::*;
pub use prescription::*;
pub use principal::*;
pub use record::*;
pub use replenishment::*;
