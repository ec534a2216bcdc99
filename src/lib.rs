//! # Geokit
//!
//! Location permission negotiation, device settings checks and periodic
//! location updates for GUI apps, across Android-style hosts, Windows and
//! Linux.
//!
//! ## Features
//!
//! - `permission`: fine/coarse location permission queries and requests.
//! - `location`: fixes, settings checks and update subscriptions.
//! - `flow`: the screen-level state machine tying both to a presenter.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! geokit = { version = "0.1", features = ["flow"] }
//! ```

#[cfg(feature = "flow")]
pub use geokit_flow as flow;

#[cfg(feature = "location")]
pub use geokit_location as location;

#[cfg(feature = "permission")]
pub use geokit_permission as permission;
