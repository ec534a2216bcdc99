//! Desktop harness for geokit-flow.
//!
//! Run with: cargo run -p geokit-flow-demo [updates]

use std::cell::Cell;

use futures_timer::Delay;
use geokit_flow::{ActionKind, LocationFlowController, Message, SubscriptionState, UiPresenter};
use geokit_location::{PolledSource, SystemSettings};
use geokit_permission::SystemPermissions;

/// Prints what a screen would show, and remembers the last offered action so
/// the harness can "tap" it.
#[derive(Debug, Default)]
struct ConsolePresenter {
    offered: Cell<Option<ActionKind>>,
}

impl UiPresenter for ConsolePresenter {
    fn set_controls_enabled(&self, start: bool, stop: bool) {
        println!("[controls] start={start} stop={stop}");
    }

    fn show_message(&self, message: &Message) {
        match &message.action {
            Some(action) => println!("[message] {} ({})", message.text, action.label),
            None => println!("[message] {}", message.text),
        }
        self.offered.set(message.action_kind());
    }

    fn render_coordinates(&self, latitude: f64, longitude: f64) {
        println!("[location] Lat: {latitude:.6}, Lon: {longitude:.6}");
    }
}

#[tokio::main]
async fn main() {
    println!("=== Geokit Location Flow Demo ===\n");

    let updates: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(3);

    let source = PolledSource::new();
    let mut controller = LocationFlowController::new(
        SystemPermissions::detect().await,
        SystemSettings::new(),
        source.clone(),
        ConsolePresenter::default(),
    );

    controller.start().await;

    // Accept whatever the flow offers, once, like a cooperative user would
    if let Some(kind) = controller.presenter().offered.take() {
        println!("Selecting offered action {kind:?}...");
        controller.select_action(kind).await;
    }

    if controller.state().subscription_state() != SubscriptionState::Active {
        println!("\n✗ Location updates did not start");
        return;
    }

    for _ in 0..updates {
        if let Some(interval) = source.interval() {
            Delay::new(interval).await;
        }
        if let Err(e) = source.poll().await {
            println!("✗ Failed to get location: {e}");
        }
        controller.drain_fixes();
    }

    controller.stop();
    println!("\n✓ Stopped after {updates} update(s)");
}
