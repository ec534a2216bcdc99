use geokit_location::LocationError;

const RATIONALE: &str = "Location permission is required to show your position.";
const FINE_REQUIRED: &str = "Precise location is required. Please allow fine accuracy.";
const DENIED: &str = "Location updates are disabled without location permission.";
const DECLINED: &str = "Location settings were not changed; updates stay off.";
const REVOKED: &str = "Location permission was revoked.";

/// What selecting a message's action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Issue the permission request the rationale explained.
    GrantPermission,
    /// Run the permission flow again, as `start` does.
    Retry,
}

/// Button attached to a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAction {
    /// Button text.
    pub label: String,
    /// Intent sent back to the controller when the button is selected.
    pub kind: ActionKind,
}

/// A transient message for the user, e.g. a snackbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message body.
    pub text: String,
    /// Optional action button.
    pub action: Option<MessageAction>,
}

impl Message {
    /// A message without an action.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }

    /// Attach an action button.
    #[must_use]
    pub fn with_action(mut self, label: impl Into<String>, kind: ActionKind) -> Self {
        self.action = Some(MessageAction {
            label: label.into(),
            kind,
        });
        self
    }

    /// Explains why location permission is needed before asking again.
    #[must_use]
    pub fn rationale() -> Self {
        Self::new(RATIONALE).with_action("Ok", ActionKind::GrantPermission)
    }

    /// The action kind, if the message has a button.
    #[must_use]
    pub fn action_kind(&self) -> Option<ActionKind> {
        self.action.as_ref().map(|a| a.kind)
    }
}

/// Ways a start attempt can end without a subscription.
///
/// None of these are fatal: each is shown to the user as a [`Message`] and the
/// flow returns to idle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    /// The user declined both fine and coarse location.
    #[error("location permission denied")]
    PermissionDenied,
    /// The user granted approximate location only.
    #[error("only approximate location granted")]
    CoarseOnlyGranted,
    /// The user dismissed the settings prompt.
    #[error("location settings change declined")]
    SettingsResolutionDeclined,
    /// The settings check or prompt failed.
    #[error("location settings could not be resolved: {0}")]
    SettingsResolutionFailed(LocationError),
    /// Permission disappeared between the check and the subscribe call.
    #[error("location permission revoked before subscribing")]
    SubscriptionRevoked,
    /// The location source refused the subscription.
    #[error("location updates could not start: {0}")]
    SubscribeFailed(LocationError),
}

impl FlowError {
    /// The user-facing message for this failure.
    #[must_use]
    pub fn message(&self) -> Message {
        match self {
            Self::PermissionDenied => Message::new(DENIED),
            Self::CoarseOnlyGranted => {
                Message::new(FINE_REQUIRED).with_action("Retry", ActionKind::Retry)
            }
            Self::SettingsResolutionDeclined => Message::new(DECLINED),
            Self::SettingsResolutionFailed(err) => {
                Message::new(format!("Location settings could not be resolved: {err}"))
            }
            Self::SubscriptionRevoked => Message::new(REVOKED),
            Self::SubscribeFailed(err) => {
                Message::new(format!("Could not start location updates: {err}"))
            }
        }
    }
}
