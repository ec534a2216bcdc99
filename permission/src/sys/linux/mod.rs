//! Linux permission implementation.
//!
//! Traditional Linux desktops have no runtime location prompt. GeoClue2
//! applies its own per-application policy when a client connects, and
//! sandboxed apps (Flatpak/Snap) go through the location portal, so both
//! granularities are reported as granted here.

use crate::{Permission, PermissionError, PermissionStatus};

pub(crate) async fn check(_permission: Permission) -> PermissionStatus {
    PermissionStatus::Granted
}

pub(crate) async fn request(_permission: Permission) -> Result<PermissionStatus, PermissionError> {
    Ok(PermissionStatus::Granted)
}
