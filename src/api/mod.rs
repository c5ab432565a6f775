//! Provides the client for interacting with the pollenrapporten.se API.
//!
//! Includes:
//! - `pollenrapporten`: the caching `PollenApi` client.

mod pollenrapporten;

pub use pollenrapporten::*;
