//! Platform-specific location implementations.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
pub use windows::{accuracy_level, current_fix};

#[cfg(target_os = "linux")]
pub use linux::{accuracy_level, current_fix};

/// Accuracy level the platform currently offers, on the GeoClue2 scale.
///
/// # Errors
///
/// Always fails with [`LocationError::NotSupported`](crate::LocationError::NotSupported)
/// on platforms without a backend.
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub async fn accuracy_level() -> crate::LocationResult<u32> {
    Err(crate::LocationError::NotSupported)
}

/// Read a single fix from the platform.
///
/// # Errors
///
/// Always fails with [`LocationError::NotAvailable`](crate::LocationError::NotAvailable)
/// on platforms without a backend.
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub async fn current_fix(_priority: crate::Priority) -> crate::LocationResult<crate::Fix> {
    Err(crate::LocationError::NotAvailable)
}
