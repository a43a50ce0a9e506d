//! Transport module - broker connection factory and live connections.
//!
//! One outbound identified connection to the broker at a time, created
//! fresh by the factory on startup and on every reconnect.

mod conn;

pub use conn::{Connection, Connector};
