//! Windows location implementation using WinRT Geolocator.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator, PositionAccuracy};

use crate::{Fix, LocationError, LocationResult, Priority};

/// Windows has no graded accuracy switch: once access is allowed the
/// Geolocator can deliver exact fixes.
const EXACT: u32 = 8;

/// 100ns ticks between 1601-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 116_444_736_000_000_000;

/// Accuracy level the platform currently offers, on the GeoClue2 scale.
///
/// # Errors
///
/// Returns an error if location access is denied or cannot be queried.
pub async fn accuracy_level() -> LocationResult<u32> {
    ensure_access()?;
    Ok(EXACT)
}

/// Read a single fix from the Geolocator.
///
/// # Errors
///
/// Returns an error if access is denied or the platform has no position.
pub async fn current_fix(priority: Priority) -> LocationResult<Fix> {
    ensure_access()?;

    let geolocator = Geolocator::new().map_err(|e| LocationError::Unknown(e.message().to_string()))?;
    let accuracy = match priority {
        Priority::HighAccuracy => PositionAccuracy::High,
        _ => PositionAccuracy::Default,
    };
    geolocator
        .SetDesiredAccuracy(accuracy)
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?;

    let position = geolocator
        .GetGeopositionAsync()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?
        .get()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?;

    let coord = position
        .Coordinate()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?;

    let pos = coord
        .Point()
        .and_then(|point| point.Position())
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?;

    let timestamp = coord
        .Timestamp()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?
        .UniversalTime;

    Ok(Fix {
        latitude: pos.Latitude,
        longitude: pos.Longitude,
        altitude: Some(pos.Altitude),
        accuracy: coord.Accuracy().ok(),
        timestamp: u64::try_from((timestamp - UNIX_EPOCH_TICKS) / 10_000).unwrap_or(0),
    })
}

fn ensure_access() -> LocationResult<()> {
    // RequestAccessAsync also serves as the permission check on Windows
    let access = Geolocator::RequestAccessAsync()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?
        .get()
        .map_err(|e| LocationError::Unknown(e.message().to_string()))?;

    match access {
        GeolocationAccessStatus::Allowed => Ok(()),
        GeolocationAccessStatus::Denied => Err(LocationError::PermissionDenied),
        _ => Err(LocationError::ServiceDisabled),
    }
}
