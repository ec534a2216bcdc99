//! The permission → settings → subscription state machine.
//!
//! [`transition`] is a pure function of the current [`FlowState`] and an
//! [`Event`]. It never talks to a platform: everything it wants done comes
//! back as a list of [`Effect`]s, and effects that produce an answer (a
//! permission result, a settings check) are fed back in as new events by the
//! driver.

use geokit_location::{
    Fix, LocationError, ResolutionHandle, ResolutionOutcome, SettingsCheck, SettingsState,
    SubscriptionHandle,
};
use geokit_permission::{PermissionGrant, PermissionState};

use crate::{ActionKind, FlowError, Message};

/// Where the flow currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing in progress and no subscription.
    #[default]
    Idle,
    /// Waiting for a permission query or the user's answer to a request.
    AwaitingPermission,
    /// Waiting for the settings check, the settings prompt, or the subscribe
    /// call that follows them.
    AwaitingSettingsResolution,
    /// Fixes are being delivered.
    Subscribed,
}

/// Whether the user wants updates, independent of lifecycle pauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Intent {
    /// The user has not started updates, or stopped them.
    #[default]
    Stopped,
    /// The user started updates and has not stopped them.
    Running,
}

/// Whether a subscription handle is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// No subscription.
    #[default]
    Inactive,
    /// Exactly one subscription.
    Active,
}

/// The single outstanding subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSubscription {
    /// Serial minted by the flow; deliveries carry it so late fixes from an
    /// ended subscription can be told apart.
    pub serial: u64,
    /// Handle returned by the location source.
    pub handle: SubscriptionHandle,
}

/// Enabled state of the start and stop controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Controls {
    /// The start control accepts input.
    pub start: bool,
    /// The stop control accepts input.
    pub stop: bool,
}

impl Controls {
    const IDLE: Self = Self {
        start: true,
        stop: false,
    };

    const RUNNING: Self = Self {
        start: false,
        stop: true,
    };
}

impl Default for Controls {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Everything the flow knows. Read-only outside of [`transition`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowState {
    phase: Phase,
    permission: PermissionState,
    settings: SettingsState,
    subscription: Option<ActiveSubscription>,
    intent: Intent,
    paused: bool,
    controls: Controls,
    last_fix: Option<Fix>,
    serial: u64,
}

impl FlowState {
    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Last known permission state.
    #[must_use]
    pub const fn permission(&self) -> PermissionState {
        self.permission
    }

    /// Last known settings state.
    #[must_use]
    pub const fn settings(&self) -> SettingsState {
        self.settings
    }

    /// Whether a subscription is outstanding.
    #[must_use]
    pub const fn subscription_state(&self) -> SubscriptionState {
        if self.subscription.is_some() {
            SubscriptionState::Active
        } else {
            SubscriptionState::Inactive
        }
    }

    /// The outstanding subscription, if any.
    #[must_use]
    pub const fn subscription(&self) -> Option<ActiveSubscription> {
        self.subscription
    }

    /// The user's intent.
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }

    /// Whether updates were suspended by a lifecycle pause.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Enabled state of the start/stop controls as last presented.
    #[must_use]
    pub const fn controls(&self) -> Controls {
        self.controls
    }

    /// The most recent delivered fix.
    #[must_use]
    pub const fn last_fix(&self) -> Option<&Fix> {
        self.last_fix.as_ref()
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user asked for updates.
    StartRequested,
    /// The user selected a message action.
    ActionSelected(ActionKind),
    /// Answer to [`Effect::QueryPermission`].
    PermissionQueried {
        /// What is granted right now.
        grant: PermissionGrant,
        /// Whether a rationale should precede a new request.
        show_rationale: bool,
    },
    /// Answer to [`Effect::RequestPermissions`].
    PermissionsRequested(PermissionGrant),
    /// Answer to [`Effect::CheckSettings`].
    SettingsChecked(SettingsCheck),
    /// Answer to [`Effect::ResolveSettings`].
    ResolutionFinished(ResolutionOutcome),
    /// Answer to [`Effect::VerifyPermission`].
    SubscribePermissionVerified(PermissionGrant),
    /// [`Effect::Subscribe`] succeeded.
    Subscribed {
        /// Serial from the effect.
        serial: u64,
        /// Handle from the location source.
        handle: SubscriptionHandle,
    },
    /// [`Effect::Subscribe`] failed.
    SubscribeFailed(LocationError),
    /// The user asked to stop updates.
    StopRequested,
    /// The host went to the background.
    Paused,
    /// The host came back to the foreground.
    Resumed,
    /// The location source delivered a fix.
    FixDelivered {
        /// Serial of the subscription the fix was delivered to.
        serial: u64,
        /// The fix.
        fix: Fix,
    },
}

/// Work requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Snapshot the permission gateway; answer with [`Event::PermissionQueried`].
    QueryPermission,
    /// Ask for fine and coarse location; answer with
    /// [`Event::PermissionsRequested`].
    RequestPermissions,
    /// Check device settings; answer with [`Event::SettingsChecked`].
    CheckSettings,
    /// Show the settings prompt; answer with [`Event::ResolutionFinished`].
    ResolveSettings(ResolutionHandle),
    /// Re-read permissions right before subscribing; answer with
    /// [`Event::SubscribePermissionVerified`].
    VerifyPermission,
    /// Subscribe to fixes; answer with [`Event::Subscribed`] or
    /// [`Event::SubscribeFailed`].
    Subscribe {
        /// Serial deliveries for this subscription must carry.
        serial: u64,
    },
    /// End a subscription.
    Unsubscribe(SubscriptionHandle),
    /// Update the start/stop controls.
    SetControls(Controls),
    /// Show a message.
    ShowMessage(Message),
    /// Show a failure to the user.
    Report(FlowError),
    /// Show new coordinates.
    RenderCoordinates {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
}

/// Compute the next state and the effects to perform for `event`.
///
/// Events that do not apply to the current phase (a late answer, a second
/// `start` while subscribed) leave the state untouched and produce no effects.
#[must_use]
pub fn transition(state: &FlowState, event: Event) -> (FlowState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();
    next.apply(event, &mut effects);
    (next, effects)
}

impl FlowState {
    fn apply(&mut self, event: Event, effects: &mut Vec<Effect>) {
        match (self.phase, event) {
            (Phase::Idle, Event::StartRequested | Event::ActionSelected(ActionKind::Retry)) => {
                self.paused = false;
                self.phase = Phase::AwaitingPermission;
                effects.push(Effect::QueryPermission);
            }
            (Phase::Idle, Event::ActionSelected(ActionKind::GrantPermission)) => {
                self.phase = Phase::AwaitingPermission;
                effects.push(Effect::RequestPermissions);
            }
            (
                Phase::AwaitingPermission,
                Event::PermissionQueried {
                    grant,
                    show_rationale,
                },
            ) => {
                self.permission = PermissionState::from_query(grant);
                if grant.fine {
                    self.check_settings(effects);
                } else if show_rationale {
                    self.phase = Phase::Idle;
                    self.intent = Intent::Stopped;
                    self.paused = false;
                    effects.push(Effect::ShowMessage(Message::rationale()));
                    self.set_controls(Controls::IDLE, effects);
                } else {
                    effects.push(Effect::RequestPermissions);
                }
            }
            (Phase::AwaitingPermission, Event::PermissionsRequested(grant)) => {
                self.permission = PermissionState::from_request(grant);
                match self.permission {
                    PermissionState::FineGranted => self.check_settings(effects),
                    PermissionState::CoarseOnlyGranted => {
                        self.fail(FlowError::CoarseOnlyGranted, effects);
                    }
                    _ => self.fail(FlowError::PermissionDenied, effects),
                }
            }
            (Phase::AwaitingSettingsResolution, Event::SettingsChecked(check)) => {
                self.settings = check.state();
                match check {
                    SettingsCheck::Satisfied => effects.push(Effect::VerifyPermission),
                    SettingsCheck::NeedsResolution(handle) => {
                        effects.push(Effect::ResolveSettings(handle));
                    }
                    SettingsCheck::Failed(err) => {
                        self.fail(FlowError::SettingsResolutionFailed(err), effects);
                    }
                }
            }
            (Phase::AwaitingSettingsResolution, Event::ResolutionFinished(outcome)) => {
                self.settings = outcome.state();
                match outcome {
                    ResolutionOutcome::Accepted => effects.push(Effect::VerifyPermission),
                    ResolutionOutcome::Declined => {
                        self.fail(FlowError::SettingsResolutionDeclined, effects);
                    }
                    ResolutionOutcome::Error(err) => {
                        self.fail(FlowError::SettingsResolutionFailed(err), effects);
                    }
                }
            }
            (Phase::AwaitingSettingsResolution, Event::SubscribePermissionVerified(grant)) => {
                if grant.any() {
                    self.permission = PermissionState::from_query(grant);
                    self.serial += 1;
                    effects.push(Effect::Subscribe {
                        serial: self.serial,
                    });
                } else {
                    // Revoked behind our back: tell the user, then ask again
                    self.permission = PermissionState::Denied;
                    self.phase = Phase::AwaitingPermission;
                    self.intent = Intent::Stopped;
                    effects.push(Effect::Report(FlowError::SubscriptionRevoked));
                    self.set_controls(Controls::IDLE, effects);
                    effects.push(Effect::QueryPermission);
                }
            }
            (Phase::AwaitingSettingsResolution, Event::Subscribed { serial, handle })
                if serial == self.serial =>
            {
                self.subscription = Some(ActiveSubscription { serial, handle });
                self.phase = Phase::Subscribed;
                self.intent = Intent::Running;
                self.paused = false;
                self.set_controls(Controls::RUNNING, effects);
            }
            (_, Event::Subscribed { handle, .. }) => {
                // Never keep a handle the flow did not ask for
                effects.push(Effect::Unsubscribe(handle));
            }
            (Phase::AwaitingSettingsResolution, Event::SubscribeFailed(err)) => {
                self.fail(FlowError::SubscribeFailed(err), effects);
            }
            (_, Event::StopRequested) => {
                self.intent = Intent::Stopped;
                self.paused = false;
                if let Some(active) = self.subscription.take() {
                    self.phase = Phase::Idle;
                    effects.push(Effect::Unsubscribe(active.handle));
                }
                self.set_controls(Controls::IDLE, effects);
            }
            (Phase::Subscribed, Event::Paused) => {
                if let Some(active) = self.subscription.take() {
                    effects.push(Effect::Unsubscribe(active.handle));
                }
                self.phase = Phase::Idle;
                self.paused = true;
            }
            (Phase::Idle, Event::Resumed) if self.paused && self.intent == Intent::Running => {
                self.paused = false;
                self.check_settings(effects);
            }
            (Phase::Subscribed, Event::FixDelivered { serial, fix })
                if self.subscription.is_some_and(|s| s.serial == serial) =>
            {
                effects.push(Effect::RenderCoordinates {
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                });
                self.last_fix = Some(fix);
            }
            _ => {}
        }
    }

    fn check_settings(&mut self, effects: &mut Vec<Effect>) {
        self.phase = Phase::AwaitingSettingsResolution;
        self.settings = SettingsState::Unchecked;
        effects.push(Effect::CheckSettings);
    }

    fn fail(&mut self, error: FlowError, effects: &mut Vec<Effect>) {
        self.phase = Phase::Idle;
        self.intent = Intent::Stopped;
        self.paused = false;
        effects.push(Effect::Report(error));
        self.set_controls(Controls::IDLE, effects);
    }

    fn set_controls(&mut self, controls: Controls, effects: &mut Vec<Effect>) {
        if self.controls != controls {
            self.controls = controls;
            effects.push(Effect::SetControls(controls));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: &FlowState, events: impl IntoIterator<Item = Event>) -> (FlowState, Vec<Effect>) {
        let mut state = state.clone();
        let mut all = Vec::new();
        for event in events {
            let (next, effects) = transition(&state, event);
            state = next;
            all.extend(effects);
        }
        (state, all)
    }

    fn subscribed() -> FlowState {
        let (state, _) = run(
            &FlowState::default(),
            [
                Event::StartRequested,
                Event::PermissionQueried {
                    grant: PermissionGrant::FINE,
                    show_rationale: false,
                },
                Event::SettingsChecked(SettingsCheck::Satisfied),
                Event::SubscribePermissionVerified(PermissionGrant::FINE),
                Event::Subscribed {
                    serial: 1,
                    handle: SubscriptionHandle::new(10),
                },
            ],
        );
        state
    }

    #[test]
    fn granted_start_walks_to_subscribed() {
        let state = FlowState::default();
        let (state, effects) = transition(&state, Event::StartRequested);
        assert_eq!(effects, [Effect::QueryPermission]);

        let (state, effects) = transition(
            &state,
            Event::PermissionQueried {
                grant: PermissionGrant::FINE,
                show_rationale: false,
            },
        );
        assert_eq!(effects, [Effect::CheckSettings]);
        assert_eq!(state.phase(), Phase::AwaitingSettingsResolution);

        let (state, effects) =
            transition(&state, Event::SettingsChecked(SettingsCheck::Satisfied));
        assert_eq!(effects, [Effect::VerifyPermission]);

        let (state, effects) = transition(
            &state,
            Event::SubscribePermissionVerified(PermissionGrant::FINE),
        );
        assert_eq!(effects, [Effect::Subscribe { serial: 1 }]);

        let (state, effects) = transition(
            &state,
            Event::Subscribed {
                serial: 1,
                handle: SubscriptionHandle::new(10),
            },
        );
        assert_eq!(effects, [Effect::SetControls(Controls::RUNNING)]);
        assert_eq!(state.phase(), Phase::Subscribed);
        assert_eq!(state.subscription_state(), SubscriptionState::Active);
        assert_eq!(state.permission(), PermissionState::FineGranted);
        assert_eq!(state.settings(), SettingsState::Satisfied);
        assert_eq!(state.intent(), Intent::Running);
    }

    #[test]
    fn start_while_subscribed_is_ignored() {
        let state = subscribed();
        let (next, effects) = transition(&state, Event::StartRequested);
        assert!(effects.is_empty());
        assert_eq!(next, state);
    }

    #[test]
    fn rationale_waits_for_the_user() {
        let (state, effects) = run(
            &FlowState::default(),
            [
                Event::StartRequested,
                Event::PermissionQueried {
                    grant: PermissionGrant::NONE,
                    show_rationale: true,
                },
            ],
        );
        assert_eq!(
            effects,
            [
                Effect::QueryPermission,
                Effect::ShowMessage(Message::rationale())
            ]
        );
        assert_eq!(state.phase(), Phase::Idle);

        let (state, effects) = transition(
            &state,
            Event::ActionSelected(ActionKind::GrantPermission),
        );
        assert_eq!(effects, [Effect::RequestPermissions]);
        assert_eq!(state.phase(), Phase::AwaitingPermission);
    }

    #[test]
    fn denial_reports_and_returns_to_idle() {
        let (state, effects) = run(
            &FlowState::default(),
            [
                Event::StartRequested,
                Event::PermissionQueried {
                    grant: PermissionGrant::NONE,
                    show_rationale: false,
                },
                Event::PermissionsRequested(PermissionGrant::NONE),
            ],
        );
        assert_eq!(
            effects,
            [
                Effect::QueryPermission,
                Effect::RequestPermissions,
                Effect::Report(FlowError::PermissionDenied),
            ]
        );
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.permission(), PermissionState::Denied);
    }

    #[test]
    fn revoked_permission_reenters_permission_flow() {
        let (state, effects) = run(
            &FlowState::default(),
            [
                Event::StartRequested,
                Event::PermissionQueried {
                    grant: PermissionGrant::FINE,
                    show_rationale: false,
                },
                Event::SettingsChecked(SettingsCheck::Satisfied),
                Event::SubscribePermissionVerified(PermissionGrant::NONE),
            ],
        );
        assert_eq!(
            &effects[effects.len() - 2..],
            [
                Effect::Report(FlowError::SubscriptionRevoked),
                Effect::QueryPermission
            ]
        );
        assert_eq!(state.phase(), Phase::AwaitingPermission);
        assert_eq!(state.subscription(), None);
    }

    #[test]
    fn resolution_error_is_reported() {
        let (state, effects) = run(
            &FlowState::default(),
            [
                Event::StartRequested,
                Event::PermissionQueried {
                    grant: PermissionGrant::FINE,
                    show_rationale: false,
                },
                Event::SettingsChecked(SettingsCheck::NeedsResolution(ResolutionHandle::new(3))),
                Event::ResolutionFinished(ResolutionOutcome::Error(LocationError::Timeout)),
            ],
        );
        assert!(effects.contains(&Effect::ResolveSettings(ResolutionHandle::new(3))));
        assert_eq!(
            effects.last(),
            Some(&Effect::Report(FlowError::SettingsResolutionFailed(
                LocationError::Timeout
            )))
        );
        assert_eq!(state.settings(), SettingsState::ResolutionFailed);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn pause_keeps_intent_and_resume_rechecks_settings() {
        let (state, effects) = transition(&subscribed(), Event::Paused);
        assert_eq!(effects, [Effect::Unsubscribe(SubscriptionHandle::new(10))]);
        assert!(state.is_paused());
        assert_eq!(state.intent(), Intent::Running);
        assert_eq!(state.controls(), Controls::RUNNING);

        let (state, effects) = transition(&state, Event::Resumed);
        assert_eq!(effects, [Effect::CheckSettings]);
        assert!(!state.is_paused());

        let (state, effects) = run(
            &state,
            [
                Event::SettingsChecked(SettingsCheck::Satisfied),
                Event::SubscribePermissionVerified(PermissionGrant::FINE),
            ],
        );
        assert_eq!(effects, [Effect::VerifyPermission, Effect::Subscribe { serial: 2 }]);
        assert_eq!(state.phase(), Phase::AwaitingSettingsResolution);
    }

    #[test]
    fn revoked_on_resume_resets_controls() {
        let (state, effects) = run(
            &subscribed(),
            [
                Event::Paused,
                Event::Resumed,
                Event::SettingsChecked(SettingsCheck::Satisfied),
                Event::SubscribePermissionVerified(PermissionGrant::NONE),
            ],
        );
        assert_eq!(
            &effects[effects.len() - 3..],
            [
                Effect::Report(FlowError::SubscriptionRevoked),
                Effect::SetControls(Controls::IDLE),
                Effect::QueryPermission,
            ]
        );
        assert_eq!(state.intent(), Intent::Stopped);

        // The re-query ends on the rationale: nothing is left running
        let (state, effects) = transition(
            &state,
            Event::PermissionQueried {
                grant: PermissionGrant::NONE,
                show_rationale: true,
            },
        );
        assert_eq!(effects, [Effect::ShowMessage(Message::rationale())]);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.controls(), Controls::IDLE);
        assert!(!state.is_paused());

        let (_, effects) = transition(&state, Event::Resumed);
        assert!(effects.is_empty());
    }

    #[test]
    fn stop_clears_intent_so_resume_does_nothing() {
        let (state, _) = run(&subscribed(), [Event::Paused, Event::StopRequested]);
        assert_eq!(state.intent(), Intent::Stopped);
        assert_eq!(state.controls(), Controls::IDLE);

        let (_, effects) = transition(&state, Event::Resumed);
        assert!(effects.is_empty());
    }

    #[test]
    fn stale_serial_is_not_rendered() {
        let state = subscribed();
        let (state, effects) = transition(
            &state,
            Event::FixDelivered {
                serial: 0,
                fix: Fix::new(9.0, 9.0),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.last_fix(), None);

        let (state, effects) = transition(
            &state,
            Event::FixDelivered {
                serial: 1,
                fix: Fix::new(1.5, 2.5),
            },
        );
        assert_eq!(
            effects,
            [Effect::RenderCoordinates {
                latitude: 1.5,
                longitude: 2.5
            }]
        );
        assert_eq!(state.last_fix(), Some(&Fix::new(1.5, 2.5)));
    }

    #[test]
    fn unexpected_handle_is_released() {
        let (state, effects) = transition(
            &FlowState::default(),
            Event::Subscribed {
                serial: 7,
                handle: SubscriptionHandle::new(70),
            },
        );
        assert_eq!(effects, [Effect::Unsubscribe(SubscriptionHandle::new(70))]);
        assert_eq!(state.subscription(), None);
    }
}
