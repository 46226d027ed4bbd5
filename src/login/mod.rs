//! Venue login
//!
//! Idempotent authentication handshake, run once per session and skipped on
//! every later bid for the same account.

mod controller;

pub use controller::{LoginController, LoginSelectors};
