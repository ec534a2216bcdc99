//! Windows permission implementation using WinRT.
//!
//! Windows has a single location switch, so fine and coarse share one status.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};

use crate::{Permission, PermissionError, PermissionStatus};

pub(crate) async fn check(_permission: Permission) -> PermissionStatus {
    access_status().unwrap_or(PermissionStatus::NotDetermined)
}

pub(crate) async fn request(_permission: Permission) -> Result<PermissionStatus, PermissionError> {
    // RequestAccessAsync both checks and prompts if needed
    access_status()
}

fn access_status() -> Result<PermissionStatus, PermissionError> {
    let status = Geolocator::RequestAccessAsync()
        .and_then(|op| op.get())
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?;

    Ok(match status {
        GeolocationAccessStatus::Allowed => PermissionStatus::Granted,
        GeolocationAccessStatus::Denied => PermissionStatus::Denied,
        _ => PermissionStatus::NotDetermined,
    })
}
