//! Linux location implementation using the GeoClue2 D-Bus service.

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use zbus::zvariant::OwnedObjectPath;
use zbus::{Connection, Proxy};

use crate::{Fix, LocationError, LocationResult, Priority};

const SERVICE: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_INTERFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_INTERFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_INTERFACE: &str = "org.freedesktop.GeoClue2.Location";
const DESKTOP_ID: &str = "geokit";

/// Accuracy level GeoClue2 currently offers (0 when location is switched off).
///
/// # Errors
///
/// Returns an error if the system bus or the GeoClue2 service is unreachable.
pub async fn accuracy_level() -> LocationResult<u32> {
    let connection = system_bus().await?;
    let manager = proxy(&connection, MANAGER_PATH, MANAGER_INTERFACE).await?;

    let level = manager
        .get_property::<u32>("AvailableAccuracyLevel")
        .await
        .map_err(|e| LocationError::Unknown(format!("GeoClue2 not available: {e}")))?;
    debug!("GeoClue2 available accuracy level: {level}");
    Ok(level)
}

/// Read a single fix from GeoClue2 at the accuracy `priority` asks for.
///
/// # Errors
///
/// Returns an error if GeoClue2 is unreachable or has no location yet.
pub async fn current_fix(priority: Priority) -> LocationResult<Fix> {
    let connection = system_bus().await?;
    let manager = proxy(&connection, MANAGER_PATH, MANAGER_INTERFACE).await?;

    let client_path: OwnedObjectPath = manager
        .call("GetClient", &())
        .await
        .map_err(|e| LocationError::Unknown(format!("GeoClue2 not available: {e}")))?;
    let client = proxy(&connection, client_path.as_str(), CLIENT_INTERFACE).await?;

    // GeoClue2 refuses to start clients without a desktop ID
    client
        .set_property("DesktopId", DESKTOP_ID)
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to set desktop ID: {e}")))?;
    client
        .set_property("RequestedAccuracyLevel", priority.min_accuracy_level())
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to set accuracy level: {e}")))?;

    client
        .call::<_, _, ()>("Start", &())
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to start GeoClue client: {e}")))?;

    let fix = read_fix(&connection, &client).await;

    // Stopping is best effort, the fix is already read
    if let Err(e) = client.call::<_, _, ()>("Stop", &()).await {
        debug!("failed to stop GeoClue client: {e}");
    }

    fix
}

async fn read_fix(connection: &Connection, client: &Proxy<'_>) -> LocationResult<Fix> {
    let location_path: OwnedObjectPath = client
        .get_property("Location")
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to get location: {e}")))?;

    // "/" until GeoClue2 has produced its first location
    if location_path.as_str() == "/" {
        return Err(LocationError::NotAvailable);
    }

    let location = proxy(connection, location_path.as_str(), LOCATION_INTERFACE).await?;
    let latitude = location
        .get_property::<f64>("Latitude")
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to get latitude: {e}")))?;
    let longitude = location
        .get_property::<f64>("Longitude")
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to get longitude: {e}")))?;
    let altitude = location.get_property::<f64>("Altitude").await.ok();
    let accuracy = location.get_property::<f64>("Accuracy").await.ok();

    Ok(Fix {
        latitude,
        longitude,
        altitude,
        accuracy,
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0),
    })
}

async fn system_bus() -> LocationResult<Connection> {
    Connection::system()
        .await
        .map_err(|e| LocationError::Unknown(format!("D-Bus connection failed: {e}")))
}

async fn proxy<'a>(
    connection: &Connection,
    path: &'a str,
    interface: &'static str,
) -> LocationResult<Proxy<'a>> {
    Proxy::new(connection, SERVICE, path, interface)
        .await
        .map_err(|e| LocationError::Unknown(format!("Failed to create {interface} proxy: {e}")))
}
