use std::collections::VecDeque;

use async_channel::{Receiver, Sender, unbounded};
use geokit_location::{Fix, LocationRequestConfig, LocationSource, SettingsResolver};
use geokit_permission::{Permission, PermissionGateway};
use log::{debug, error, warn};

use crate::machine::{Effect, Event, FlowState, transition};
use crate::{ActionKind, UiPresenter};

#[derive(Debug)]
struct Delivery {
    serial: u64,
    fix: Fix,
}

/// Drives the location flow against its collaborators.
///
/// All methods take `&mut self`, so the controller must live on the thread
/// that owns the UI. Fix callbacks from the [`LocationSource`] may run on any
/// thread: they only queue the fix, and the host hands queued fixes to the
/// flow with [`drain_fixes`](Self::drain_fixes) or [`next_fix`](Self::next_fix).
///
/// The queue is unbounded. A host whose source delivers through the callback
/// must keep draining it for as long as it is subscribed, otherwise queued
/// fixes pile up; [`pending_fixes`](Self::pending_fixes) reports the backlog.
/// Hosts that call [`on_fix`](Self::on_fix) directly never touch the queue.
#[derive(Debug)]
pub struct LocationFlowController<G, R, L, U> {
    gateway: G,
    resolver: R,
    source: L,
    presenter: U,
    config: LocationRequestConfig,
    state: FlowState,
    sender: Sender<Delivery>,
    receiver: Receiver<Delivery>,
}

impl<G, R, L, U> LocationFlowController<G, R, L, U>
where
    G: PermissionGateway,
    R: SettingsResolver,
    L: LocationSource,
    U: UiPresenter,
{
    /// Creates an idle controller using the default request configuration.
    pub fn new(gateway: G, resolver: R, source: L, presenter: U) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            gateway,
            resolver,
            source,
            presenter,
            config: LocationRequestConfig::default(),
            state: FlowState::default(),
            sender,
            receiver,
        }
    }

    /// Replaces the request configuration.
    #[must_use]
    pub fn with_config(mut self, config: LocationRequestConfig) -> Self {
        self.config = config;
        self
    }

    /// The request configuration.
    pub const fn config(&self) -> &LocationRequestConfig {
        &self.config
    }

    /// Read-only view of the flow state.
    pub const fn state(&self) -> &FlowState {
        &self.state
    }

    /// The permission gateway.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The settings resolver.
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The location source.
    pub const fn source(&self) -> &L {
        &self.source
    }

    /// The presenter.
    pub const fn presenter(&self) -> &U {
        &self.presenter
    }

    /// The user asked for updates. No-op while subscribed or while a previous
    /// start is still in progress.
    pub async fn start(&mut self) {
        self.drive(Event::StartRequested).await;
    }

    /// The user selected the action of a message shown by this controller.
    pub async fn select_action(&mut self, kind: ActionKind) {
        self.drive(Event::ActionSelected(kind)).await;
    }

    /// The user asked to stop updates. Unsubscribes before returning.
    pub fn stop(&mut self) {
        self.drive_now(Event::StopRequested);
    }

    /// The host went to the background. Unsubscribes before returning but
    /// remembers that updates should come back on [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.drive_now(Event::Paused);
    }

    /// The host came back to the foreground.
    pub async fn resume(&mut self) {
        self.drive(Event::Resumed).await;
    }

    /// Render a fix for the current subscription.
    ///
    /// Ignored when no subscription is active, which covers late deliveries
    /// after `stop` or `pause`.
    pub fn on_fix(&mut self, fix: Fix) {
        match self.state.subscription() {
            Some(active) => self.drive_now(Event::FixDelivered {
                serial: active.serial,
                fix,
            }),
            None => debug!("ignoring fix while unsubscribed"),
        }
    }

    /// Process every fix the source has queued so far. Returns how many were
    /// taken from the queue, including ignored late ones.
    pub fn drain_fixes(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(Delivery { serial, fix }) = self.receiver.try_recv() {
            self.drive_now(Event::FixDelivered { serial, fix });
            drained += 1;
        }
        drained
    }

    /// Number of fixes queued by the source and not yet drained.
    pub fn pending_fixes(&self) -> usize {
        self.receiver.len()
    }

    /// Wait for the next queued fix and process it.
    pub async fn next_fix(&mut self) {
        // The controller keeps a sender alive, so the channel never closes
        if let Ok(Delivery { serial, fix }) = self.receiver.recv().await {
            self.drive_now(Event::FixDelivered { serial, fix });
        }
    }

    fn step(&mut self, event: Event) -> Vec<Effect> {
        let (next, effects) = transition(&self.state, event);
        if next.phase() != self.state.phase() {
            debug!("{:?} -> {:?}", self.state.phase(), next.phase());
        }
        self.state = next;
        effects
    }

    async fn drive(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in self.step(event) {
                if let Some(next) = self.perform(effect).await {
                    pending.push_back(next);
                }
            }
        }
    }

    fn drive_now(&mut self, event: Event) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            for effect in self.step(event) {
                if let Some(next) = self.perform_now(effect) {
                    pending.push_back(next);
                }
            }
        }
    }

    async fn perform(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::RequestPermissions => {
                let grant = self
                    .gateway
                    .request_permissions(&Permission::LOCATION)
                    .await;
                Some(Event::PermissionsRequested(grant))
            }
            Effect::CheckSettings => {
                let check = self.resolver.check(&self.config).await;
                Some(Event::SettingsChecked(check))
            }
            Effect::ResolveSettings(handle) => {
                let outcome = self.resolver.resolve(handle).await;
                Some(Event::ResolutionFinished(outcome))
            }
            effect => self.perform_now(effect),
        }
    }

    fn perform_now(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::QueryPermission => {
                let grant = self.gateway.grant();
                let show_rationale = !grant.fine && self.gateway.should_show_rationale();
                Some(Event::PermissionQueried {
                    grant,
                    show_rationale,
                })
            }
            Effect::VerifyPermission => {
                Some(Event::SubscribePermissionVerified(self.gateway.grant()))
            }
            Effect::Subscribe { serial } => {
                let sender = self.sender.clone();
                let on_fix = Box::new(move |fix: Fix| {
                    if sender.try_send(Delivery { serial, fix }).is_err() {
                        debug!("controller gone, dropping fix");
                    }
                });
                match self.source.subscribe(&self.config, on_fix) {
                    Ok(handle) => Some(Event::Subscribed { serial, handle }),
                    Err(err) => Some(Event::SubscribeFailed(err)),
                }
            }
            Effect::Unsubscribe(handle) => {
                self.source.unsubscribe(handle);
                None
            }
            Effect::SetControls(controls) => {
                self.presenter
                    .set_controls_enabled(controls.start, controls.stop);
                None
            }
            Effect::ShowMessage(message) => {
                self.presenter.show_message(&message);
                None
            }
            Effect::Report(err) => {
                warn!("location flow stopped: {err}");
                self.presenter.show_message(&err.message());
                None
            }
            Effect::RenderCoordinates {
                latitude,
                longitude,
            } => {
                self.presenter.render_coordinates(latitude, longitude);
                None
            }
            effect @ (Effect::RequestPermissions
            | Effect::CheckSettings
            | Effect::ResolveSettings(_)) => {
                error!("{effect:?} needs an async context, dropping it");
                None
            }
        }
    }
}
