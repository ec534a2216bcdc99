use std::cell::Cell;

use log::{debug, warn};

use crate::{Permission, PermissionGateway, PermissionGrant, PermissionStatus};

/// [`PermissionGateway`] backed by the platform implementation in [`crate::sys`].
///
/// Platform checks are asynchronous, so the gateway answers queries from a
/// cached snapshot. Call [`refresh`](Self::refresh) before handing it to a
/// flow, and again whenever the host regains focus.
#[derive(Debug, Default)]
pub struct SystemPermissions {
    grant: Cell<PermissionGrant>,
    declined_before: Cell<bool>,
}

impl SystemPermissions {
    /// Creates a gateway with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway and takes the first snapshot.
    pub async fn detect() -> Self {
        let gateway = Self::new();
        gateway.refresh().await;
        gateway
    }

    /// Re-reads both permission statuses from the platform.
    pub async fn refresh(&self) {
        let fine = crate::check(Permission::FineLocation).await;
        let coarse = crate::check(Permission::CoarseLocation).await;
        self.declined_before.set(
            self.declined_before.get()
                || fine == PermissionStatus::Denied
                || coarse == PermissionStatus::Denied,
        );
        self.grant.set(PermissionGrant {
            fine: fine.is_granted(),
            coarse: coarse.is_granted(),
        });
        debug!("permission snapshot: fine={fine:?} coarse={coarse:?}");
    }
}

impl PermissionGateway for SystemPermissions {
    fn has_fine_permission(&self) -> bool {
        self.grant.get().fine
    }

    fn has_coarse_permission(&self) -> bool {
        self.grant.get().coarse
    }

    fn should_show_rationale(&self) -> bool {
        self.declined_before.get()
    }

    async fn request_permissions(&self, permissions: &[Permission]) -> PermissionGrant {
        let mut grant = self.grant.get();

        for &permission in permissions {
            let granted = match crate::request(permission).await {
                Ok(status) => status.is_granted(),
                Err(err) => {
                    warn!("permission request for {permission:?} failed: {err}");
                    false
                }
            };

            match permission {
                Permission::FineLocation => grant.fine = granted,
                Permission::CoarseLocation => grant.coarse = granted,
            }
        }

        // Fine access always includes approximate access.
        grant.coarse |= grant.fine;

        if !grant.fine {
            self.declined_before.set(true);
        }
        self.grant.set(grant);
        grant
    }
}
