//! Location fixes, device settings checks and periodic update subscriptions.
//!
//! This crate defines the contracts a location flow consumes:
//! [`SettingsResolver`] decides whether the device can satisfy a
//! [`LocationRequestConfig`], and [`LocationSource`] delivers periodic
//! [`Fix`]es to a subscriber. [`SystemSettings`] and [`PolledSource`]
//! implement both over the platform backends in [`sys`].

#![warn(missing_docs)]

/// Platform-specific implementations.
pub mod sys;

mod config;
mod settings;
mod source;

pub use config::{LocationRequestConfig, Priority};
pub use settings::SystemSettings;
pub use source::PolledSource;

/// A single location sample delivered by the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Altitude in meters above sea level, if available.
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters, if available.
    pub accuracy: Option<f64>,
    /// Timestamp as Unix epoch milliseconds.
    pub timestamp: u64,
}

impl Fix {
    /// A fix carrying only coordinates.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            timestamp: 0,
        }
    }
}

/// Errors that can occur when accessing location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    /// Location permission was not granted.
    #[error("location permission denied")]
    PermissionDenied,
    /// Location services are disabled on the device.
    #[error("location services disabled")]
    ServiceDisabled,
    /// The device cannot provide the requested accuracy.
    #[error("accuracy level {available} is below the required level {required}")]
    InsufficientAccuracy {
        /// Accuracy level the platform offers.
        available: u32,
        /// Accuracy level the request needs.
        required: u32,
    },
    /// Location request timed out.
    #[error("location request timed out")]
    Timeout,
    /// Location is not available.
    #[error("location not available")]
    NotAvailable,
    /// The operation is not supported on this platform.
    #[error("not supported on this platform")]
    NotSupported,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Result alias for location operations.
pub type LocationResult<T> = Result<T, LocationError>;

/// Whether the device settings meet the requested configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SettingsState {
    /// No check has been made yet.
    #[default]
    Unchecked,
    /// The settings satisfy the request.
    Satisfied,
    /// The settings can be fixed through a system prompt.
    NeedsResolution,
    /// The check or its resolution failed.
    ResolutionFailed,
}

/// Opaque token for a pending settings resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolutionHandle(u64);

impl ResolutionHandle {
    /// Wraps a resolver-specific id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The resolver-specific id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Outcome of [`SettingsResolver::check`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsCheck {
    /// The settings already satisfy the request.
    Satisfied,
    /// The user can fix the settings through the given resolution.
    NeedsResolution(ResolutionHandle),
    /// The settings cannot satisfy the request.
    Failed(LocationError),
}

impl SettingsCheck {
    /// Settings state this outcome leads to.
    #[must_use]
    pub const fn state(&self) -> SettingsState {
        match self {
            Self::Satisfied => SettingsState::Satisfied,
            Self::NeedsResolution(_) => SettingsState::NeedsResolution,
            Self::Failed(_) => SettingsState::ResolutionFailed,
        }
    }
}

/// Outcome of [`SettingsResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// The user changed the settings.
    Accepted,
    /// The user dismissed the prompt.
    Declined,
    /// The prompt could not be shown or resolved.
    Error(LocationError),
}

impl ResolutionOutcome {
    /// Settings state this outcome leads to.
    #[must_use]
    pub const fn state(&self) -> SettingsState {
        match self {
            Self::Accepted => SettingsState::Satisfied,
            Self::Declined | Self::Error(_) => SettingsState::ResolutionFailed,
        }
    }
}

/// Checks device location settings and drives the system prompt that fixes them.
#[allow(async_fn_in_trait)]
pub trait SettingsResolver {
    /// Check whether the device settings satisfy `config`.
    async fn check(&self, config: &LocationRequestConfig) -> SettingsCheck;

    /// Show the system prompt for a resolution returned by [`check`](Self::check).
    async fn resolve(&self, handle: ResolutionHandle) -> ResolutionOutcome;
}

/// Opaque token for an active update subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Wraps a source-specific id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The source-specific id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Callback invoked for every delivered fix. Platform backends may call it
/// from any thread.
pub type FixCallback = Box<dyn Fn(Fix) + Send + Sync>;

/// Producer of periodic location fixes.
pub trait LocationSource {
    /// Start delivering fixes to `on_fix` at the cadence in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to start updates.
    fn subscribe(
        &self,
        config: &LocationRequestConfig,
        on_fix: FixCallback,
    ) -> LocationResult<SubscriptionHandle>;

    /// Stop the subscription identified by `handle`.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}
