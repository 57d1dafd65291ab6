//! Authentication decisions and session lifecycle.
//!
//! [`AuthEngine`] combines credential checks, the token codec and the
//! [`Store`](crate::store::Store) collaborator. It holds no mutable state, so
//! one instance is shared by every request.
//!
//! ## Principals
//!
//! - **Users** log in with Basic auth. Their tokens default to the configured
//!   user duration (one hour unless overridden).
//! - **Servers** log in with a name and the shared server secret. Their tokens
//!   default to 24 hours and unlock the privileged routes.
//!
//! ## Long-term sessions
//!
//! A login that presents the configured long-term key receives a 30 day
//! session. User tokens longer than two hours are not renewable: refresh hands
//! back the caller's identity without minting a replacement.
//!
//! ## Revocation
//!
//! Logout deletes the token record. Refresh and token checks require the record
//! to exist; the require-server gate only verifies signature, expiry and kind.

mod config;
mod credentials;
mod engine;
mod error;

pub use config::AuthConfig;
pub use credentials::{BasicCredentials, constant_time_eq, parse_basic_auth};
pub use engine::{
    AuthEngine, LONG_TERM_DURATION_SECS, NON_RENEWABLE_AFTER_SECS, RefreshOutcome,
};
pub use error::AuthError;
