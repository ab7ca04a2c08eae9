//! HTTP surface of the Mintforge deployment service.
//!
//! The interesting invariants all live in `mintforge-core`; this crate is
//! request validation, wiring, and JSON glue around them.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod runner;
pub mod state;

pub use config::Config;
pub use state::AppState;
