//! Data structures for the application.
//!
//! Includes structs for:
//! - Deserializing pollenrapporten.se API responses.
//! - The typed catalog and forecast values handed to the host layer
//!   (`PollenType`, `City`, `ForecastTable`, `Forecast`).
//! - The fixed severity ordinal scale.

mod pollen;

pub use pollen::*;
