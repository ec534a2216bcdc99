use log::{debug, warn};

use crate::{
    LocationError, LocationRequestConfig, ResolutionHandle, ResolutionOutcome, SettingsCheck,
    SettingsResolver,
};

/// [`SettingsResolver`] over the platform accuracy level.
///
/// Desktop platforms have no in-app prompt for changing location settings, so
/// an insufficient level is reported as [`SettingsCheck::Failed`] and
/// [`resolve`](SettingsResolver::resolve) is never expected to succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSettings;

impl SystemSettings {
    /// Creates the resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Compare the platform's level against what `config` needs.
fn evaluate(level: u32, config: &LocationRequestConfig) -> SettingsCheck {
    let required = config.priority.min_accuracy_level();
    if level == 0 {
        SettingsCheck::Failed(LocationError::ServiceDisabled)
    } else if level < required {
        SettingsCheck::Failed(LocationError::InsufficientAccuracy {
            available: level,
            required,
        })
    } else {
        SettingsCheck::Satisfied
    }
}

impl SettingsResolver for SystemSettings {
    async fn check(&self, config: &LocationRequestConfig) -> SettingsCheck {
        match crate::sys::accuracy_level().await {
            Ok(level) => {
                let check = evaluate(level, config);
                debug!("settings check at level {level}: {check:?}");
                check
            }
            Err(err) => SettingsCheck::Failed(err),
        }
    }

    async fn resolve(&self, handle: ResolutionHandle) -> ResolutionOutcome {
        warn!("no settings prompt on this platform, dropping resolution {handle:?}");
        ResolutionOutcome::Error(LocationError::NotSupported)
    }
}
