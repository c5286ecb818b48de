//! # Domain Models
//!
//! Canonical types flowing through the acquisition-and-alignment pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CalendarDate`] | Validated UTC calendar day |
//! | [`Observation`] | Dated value from a low-cadence series (CAPE) |
//! | [`PriceObservation`] | Dated close with exact epoch millisecond timestamp |
//! | [`MergedRecord`] | One aligned row on the primary timeline |
//!
//! Construction validates that numeric values are finite; dates are always
//! real calendar days.

mod date;
mod observation;

pub use date::CalendarDate;
pub use observation::{Dated, MergedRecord, Observation, PriceObservation};
