//! Fleet API integration
//!
//! Split into the auth client (session and token pair), the fleet client
//! (cars and device commands) and the wire types they exchange.

pub mod auth;
pub mod endpoints;
pub mod fleet;
pub(crate) mod transport;
pub mod types;

pub use auth::{AuthClient, AuthState, Credential};
pub use endpoints::Endpoint;
pub use fleet::{FleetClient, MAX_REAUTH_RETRIES};
pub use types::{Car, CommandDescriptor, NamedRef, Telemetry};
