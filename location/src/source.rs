use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};

use crate::{
    Fix, FixCallback, LocationRequestConfig, LocationResult, LocationSource, Priority,
    SubscriptionHandle,
};

struct Subscriber {
    handle: SubscriptionHandle,
    priority: Priority,
    interval: Duration,
    on_fix: Arc<dyn Fn(Fix) + Send + Sync>,
}

#[derive(Default)]
struct PollState {
    next_id: u64,
    active: Option<Subscriber>,
}

/// [`LocationSource`] for platforms that only offer one-shot reads.
///
/// The host calls [`poll`](Self::poll) once per [`interval`](Self::interval);
/// each poll reads [`sys::current_fix`](crate::sys::current_fix) and hands the
/// result to the active subscriber. Clones share the same subscription.
#[derive(Clone, Default)]
pub struct PolledSource {
    state: Arc<Mutex<PollState>>,
}

impl fmt::Debug for PolledSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolledSource")
            .field("active", &self.active_handle())
            .finish()
    }
}

impl PolledSource {
    /// Creates a source with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the current subscription, if any.
    #[must_use]
    pub fn active_handle(&self) -> Option<SubscriptionHandle> {
        self.lock().active.as_ref().map(|s| s.handle)
    }

    /// Cadence the subscriber asked for, if any.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.lock().active.as_ref().map(|s| s.interval)
    }

    /// Read one fix and deliver it to the subscriber.
    ///
    /// Returns `Ok(false)` without touching the platform when nobody is
    /// subscribed, and also when the subscription ended while the read was in
    /// flight; such a fix is dropped.
    ///
    /// # Errors
    ///
    /// Returns the platform error if no fix could be read.
    pub async fn poll(&self) -> LocationResult<bool> {
        let Some((handle, priority)) = self
            .lock()
            .active
            .as_ref()
            .map(|s| (s.handle, s.priority))
        else {
            return Ok(false);
        };

        let fix = crate::sys::current_fix(priority).await.inspect_err(|err| {
            warn!("location poll failed: {err}");
        })?;

        Ok(self.deliver(handle, fix))
    }

    fn deliver(&self, handle: SubscriptionHandle, fix: Fix) -> bool {
        // Call outside the lock, the subscriber may unsubscribe from the callback
        let on_fix = match self.lock().active.as_ref() {
            Some(s) if s.handle == handle => Arc::clone(&s.on_fix),
            _ => {
                debug!("dropping fix for ended subscription {handle:?}");
                return false;
            }
        };
        on_fix(fix);
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PollState> {
        self.state.lock().expect("poll state mutex poisoned")
    }
}

impl LocationSource for PolledSource {
    fn subscribe(
        &self,
        config: &LocationRequestConfig,
        on_fix: FixCallback,
    ) -> LocationResult<SubscriptionHandle> {
        let mut state = self.lock();
        state.next_id += 1;
        let handle = SubscriptionHandle::new(state.next_id);

        if let Some(previous) = state.active.take() {
            warn!("replacing subscription {:?}", previous.handle);
        }
        state.active = Some(Subscriber {
            handle,
            priority: config.priority,
            interval: config.interval(),
            on_fix: Arc::from(on_fix),
        });
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|s| s.handle == handle) {
            state.active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting() -> (Arc<AtomicUsize>, FixCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (
            count,
            Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn stale_unsubscribe_keeps_new_subscription() {
        let source = PolledSource::new();
        let config = LocationRequestConfig::new().with_interval_ms(250);

        let (_, first_cb) = counting();
        let first = source.subscribe(&config, first_cb).unwrap();
        let (_, second_cb) = counting();
        let second = source.subscribe(&config, second_cb).unwrap();
        assert_ne!(first, second);

        source.unsubscribe(first);
        assert_eq!(source.active_handle(), Some(second));
        assert_eq!(source.interval(), Some(Duration::from_millis(250)));

        source.unsubscribe(second);
        assert_eq!(source.active_handle(), None);
    }

    #[test]
    fn delivery_only_reaches_current_subscriber() {
        let source = PolledSource::new();
        let (count, on_fix) = counting();
        let handle = source.subscribe(&LocationRequestConfig::new(), on_fix).unwrap();

        assert!(source.deliver(handle, Fix::new(1.0, 2.0)));
        source.unsubscribe(handle);
        assert!(!source.deliver(handle, Fix::new(1.0, 2.0)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poll_without_subscriber_is_idle() {
        let source = PolledSource::new();
        assert_eq!(futures::executor::block_on(source.poll()), Ok(false));
    }
}
