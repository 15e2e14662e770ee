//! Client core for an AI trade-signal desk.
//!
//! Trading math and indicators, display formatting, input validation,
//! a typed REST client with a normalized error taxonomy, and an explicit
//! session backed by a credential store.

pub mod api;
pub mod config;
pub mod format;
pub mod metrics;
pub mod models;
pub mod session;
pub mod trading;
pub mod validate;
