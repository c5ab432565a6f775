//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands, parsing arguments, handling user interaction
//! (prompts, menus), rendering tables, and wiring configuration into the
//! API client.

mod commands;

pub use commands::*;
