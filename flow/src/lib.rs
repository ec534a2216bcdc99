//! Location permission, settings and update flow for a single screen.
//!
//! A [`LocationFlowController`] takes the user from "start" to a stream of
//! rendered coordinates:
//!
//! 1. query location permission, explaining or requesting it when missing,
//! 2. check that device settings can deliver the requested accuracy,
//!    prompting the user to change them when the platform allows it,
//! 3. re-verify permission and subscribe to periodic fixes,
//! 4. render every delivered fix until `stop` or a lifecycle `pause`.
//!
//! The flow itself is the pure [`machine::transition`] function; the
//! controller performs the effects it asks for against a
//! [`PermissionGateway`](geokit_permission::PermissionGateway), a
//! [`SettingsResolver`](geokit_location::SettingsResolver), a
//! [`LocationSource`](geokit_location::LocationSource) and a [`UiPresenter`].
//! Failures never escape: each one becomes a [`Message`] and the flow returns
//! to idle.

#![warn(missing_docs)]

pub mod machine;

mod controller;
mod message;

pub use controller::LocationFlowController;
pub use machine::{Controls, FlowState, Intent, Phase, SubscriptionState};
pub use message::{ActionKind, FlowError, Message, MessageAction};

/// The screen the flow reports to.
pub trait UiPresenter {
    /// Enable or disable the start and stop controls.
    fn set_controls_enabled(&self, start: bool, stop: bool);

    /// Show a transient message. If it carries an action, the host calls
    /// [`LocationFlowController::select_action`] when the user selects it.
    fn show_message(&self, message: &Message);

    /// Show the latest coordinates.
    fn render_coordinates(&self, latitude: f64, longitude: f64);
}
