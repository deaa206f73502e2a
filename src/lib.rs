//! # Electro Cars - fleet telemetry bridge
//!
//! Polls a vendor fleet API for vehicle telemetry and exposes it, together
//! with the vehicles' remote commands, to a home automation host.
//!
//! ## Architecture
//!
//! - `api`: auth gateway session (SMS login, token refresh) and the fleet
//!   client (cars, device commands) with one re-auth retry per call
//! - `coordinator`: adaptive poll scheduler publishing fleet snapshots
//! - `entities`: sensors, binary sensors, trackers and buttons derived from
//!   a snapshot
//! - `credentials`: durable phone and refresh token storage
//! - `config`: YAML configuration management and validation
//! - `logging`: structured logging and tracing
//! - `web`: HTTP API for the host

pub mod api;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod entities;
pub mod error;
pub mod logging;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use api::{AuthClient, FleetClient};
pub use config::Config;
pub use coordinator::FleetCoordinator;
pub use error::{ElectroCarsError, Result};
