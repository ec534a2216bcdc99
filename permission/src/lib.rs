//! Location permission queries and requests.
//!
//! This crate provides a unified API for checking and requesting the two
//! location permission granularities (fine and coarse) across platforms, and
//! the [`PermissionGateway`] contract consumed by the location flow.

#![warn(missing_docs)]

/// Platform-specific implementations.
pub mod sys;

mod system;

pub use system::SystemPermissions;

/// Location permissions that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Precise location access.
    FineLocation,
    /// Approximate location access.
    CoarseLocation,
}

impl Permission {
    /// The permission set requested by the location flow, fine first.
    pub const LOCATION: [Self; 2] = [Self::FineLocation, Self::CoarseLocation];
}

/// The current status of a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., by device policy).
    Restricted,
    /// Permission has not been requested yet.
    NotDetermined,
}

impl PermissionStatus {
    /// Returns `true` if the permission is granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Errors that can occur when requesting permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// The permission type is not supported on this platform.
    #[error("permission not supported on this platform")]
    NotSupported,
    /// An unknown error occurred.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Which location granularities are currently granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionGrant {
    /// Fine (precise) location is granted.
    pub fine: bool,
    /// Coarse (approximate) location is granted.
    pub coarse: bool,
}

impl PermissionGrant {
    /// Nothing granted.
    pub const NONE: Self = Self {
        fine: false,
        coarse: false,
    };

    /// Both granularities granted.
    pub const FINE: Self = Self {
        fine: true,
        coarse: true,
    };

    /// Only approximate location granted.
    pub const COARSE_ONLY: Self = Self {
        fine: false,
        coarse: true,
    };

    /// Returns `true` if at least one granularity is granted.
    #[must_use]
    pub const fn any(self) -> bool {
        self.fine || self.coarse
    }
}

/// Location permission as tracked by the flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// Not queried yet, or queried before the user answered any request.
    #[default]
    Unknown,
    /// Fine location is granted.
    FineGranted,
    /// Only coarse location is granted.
    CoarseOnlyGranted,
    /// The user declined both granularities.
    Denied,
}

impl PermissionState {
    /// State after querying the gateway. An empty grant stays `Unknown`,
    /// since a query alone does not tell a refusal from a first launch.
    #[must_use]
    pub const fn from_query(grant: PermissionGrant) -> Self {
        match grant {
            PermissionGrant { fine: true, .. } => Self::FineGranted,
            PermissionGrant { coarse: true, .. } => Self::CoarseOnlyGranted,
            _ => Self::Unknown,
        }
    }

    /// State after the user answered a permission request.
    #[must_use]
    pub const fn from_request(grant: PermissionGrant) -> Self {
        match grant {
            PermissionGrant { fine: true, .. } => Self::FineGranted,
            PermissionGrant { coarse: true, .. } => Self::CoarseOnlyGranted,
            _ => Self::Denied,
        }
    }

    /// Returns `true` if at least coarse location is granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::FineGranted | Self::CoarseOnlyGranted)
    }
}

/// Source of truth for location permissions.
///
/// Queries are synchronous snapshots of what the platform reports right now.
/// [`request_permissions`](Self::request_permissions) completes once the user
/// has answered the system dialog.
#[allow(async_fn_in_trait)]
pub trait PermissionGateway {
    /// Returns `true` if fine location is granted.
    fn has_fine_permission(&self) -> bool;

    /// Returns `true` if coarse location is granted.
    fn has_coarse_permission(&self) -> bool;

    /// Returns `true` if an explanation should be shown before asking again,
    /// typically because the user declined once before.
    fn should_show_rationale(&self) -> bool;

    /// Ask the user for the given permissions.
    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionGrant;

    /// Snapshot of both granularities.
    fn grant(&self) -> PermissionGrant {
        PermissionGrant {
            fine: self.has_fine_permission(),
            coarse: self.has_coarse_permission(),
        }
    }
}

/// Check the current status of a permission without requesting it.
pub async fn check(permission: Permission) -> PermissionStatus {
    sys::check(permission).await
}

/// Request a permission from the user.
///
/// If the permission has already been granted or denied, this returns
/// the current status without showing a prompt.
///
/// # Errors
/// Returns a `PermissionError` if:
/// - The permission type is not supported on this platform.
/// - An underlying platform error occurs.
pub async fn request(permission: Permission) -> Result<PermissionStatus, PermissionError> {
    sys::request(permission).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_without_grant_stays_unknown() {
        assert_eq!(
            PermissionState::from_query(PermissionGrant::NONE),
            PermissionState::Unknown
        );
        assert_eq!(
            PermissionState::from_request(PermissionGrant::NONE),
            PermissionState::Denied
        );
    }

    #[test]
    fn fine_wins_over_coarse() {
        let grant = PermissionGrant {
            fine: true,
            coarse: false,
        };
        assert_eq!(
            PermissionState::from_request(grant),
            PermissionState::FineGranted
        );
        assert_eq!(
            PermissionState::from_query(PermissionGrant::COARSE_ONLY),
            PermissionState::CoarseOnlyGranted
        );
        assert!(PermissionState::CoarseOnlyGranted.is_granted());
        assert!(!PermissionState::Denied.is_granted());
    }
}
