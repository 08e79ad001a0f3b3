//! Single-consumer driver for the lifecycle manager.
//!
//! One `select!` loop owns every mutation of the manager: periodic refresh
//! ticks, inbound deletion notices, and shutdown. Processing them one at a
//! time is what makes the manager's transitions atomic with respect to each
//! other — a deletion notice can land between cycles, never inside one.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::platforms::discord::StatusBotEvent;
use crate::status::lifecycle::LifecycleManager;

/// Runs until shutdown is signalled or the event stream closes. The first
/// tick fires immediately, so startup restore is followed by an immediate
/// refresh rather than waiting out one full period.
pub async fn run_status_loop(
    manager: &mut LifecycleManager,
    mut events: UnboundedReceiver<StatusBotEvent>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    manager.restore().await;

    let mut ticker = interval(period);
    // A cycle slower than the period delays the next tick instead of
    // stacking overlapping cycles.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                manager.refresh().await;
            }
            event = events.recv() => {
                match event {
                    Some(StatusBotEvent::MessageDeleted { message_id, .. }) => {
                        manager.handle_deletion(&message_id);
                    }
                    None => {
                        warn!("(StatusLoop) Event stream closed; stopping.");
                        break;
                    }
                }
            }
            _ = shutdown_rx.changed() => {
                info!("(StatusLoop) Shutdown signal received; stopping.");
                break;
            }
        }
    }
}
