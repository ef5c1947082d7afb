// ── Notification synchronizer ──
//
// Bounded-lifetime live-event channel over polling. One background
// task per activation polls `{endpoint}/live-notifications` and is the
// single writer of the current-event and recent-log fields; explicit
// dismissals reach it over an mpsc channel so writes stay confined.
//
// States: Idle (no task), Polling (task running, nothing displayed),
// EventDisplayed (task running, display deadline armed). Polling
// continues unchanged while an event is displayed. The task is
// cancelled whenever scanning mode turns off or the connection test
// fails; cancellation discards the displayed event WITHOUT telling the
// peripheral, so the same event may be redelivered later -- an
// accepted limitation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use attendly_api::{DeviceClient, NotificationPoll};

use crate::session::Session;

/// Handle to a running notification poll task.
pub(crate) struct Poller {
    cancel: CancellationToken,
    ack_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Poller {
    pub(crate) async fn stop(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

impl Session {
    /// Dismiss the currently displayed live event.
    ///
    /// Performs the same exit action as the display timeout: clear the
    /// local display and send one best-effort acknowledgment to the
    /// peripheral. Dismissing when nothing is displayed (or dismissing
    /// twice) is a no-op.
    pub async fn dismiss_event(&self) {
        let poller = self.inner.poller.lock().await;
        if let Some(poller) = poller.as_ref() {
            let _ = poller.ack_tx.try_send(());
        }
    }

    /// Reconcile the poll task with the current state: running exactly
    /// when scanning mode is on and the peripheral is connected.
    ///
    /// Called after every mode toggle and connection test so the task
    /// follows connectivity flaps without accumulating instances.
    pub(crate) async fn sync_poller_state(&self) {
        let should_run = self.is_connected() && self.is_scanning();
        let mut slot = self.inner.poller.lock().await;

        if should_run {
            if slot.is_some() {
                return;
            }
            let Ok(device) = self.device().await else {
                // Connected but no usable endpoint; nothing to poll.
                return;
            };

            let cancel = self.inner.cancel.child_token();
            let (ack_tx, ack_rx) = mpsc::channel(4);
            let handle = tokio::spawn(poll_task(
                self.clone(),
                device,
                cancel.clone(),
                ack_rx,
            ));
            *slot = Some(Poller {
                cancel,
                ack_tx,
                handle,
            });
            debug!("notification polling started");
        } else if let Some(poller) = slot.take() {
            drop(slot);
            poller.stop().await;
            debug!("notification polling stopped");
        }
    }
}

// ── Poll task ────────────────────────────────────────────────────

async fn poll_task(
    session: Session,
    device: Arc<DeviceClient>,
    cancel: CancellationToken,
    mut ack_rx: mpsc::Receiver<()>,
) {
    let mut interval = tokio::time::interval(session.inner.config.poll_interval);
    // A new poll is never issued while one is outstanding; if a poll
    // overruns the interval, just resume ticking afterwards.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Armed while an event is displayed.
    let mut display_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                // Mode off or disconnect: discard the display without
                // acknowledgment and stop all timers.
                let _ = session.inner.current_event.send_replace(None);
                break;
            }

            Some(()) = ack_rx.recv() => {
                acknowledge(&session, &device, &mut display_deadline).await;
            }

            () = display_expiry(display_deadline) => {
                acknowledge(&session, &device, &mut display_deadline).await;
            }

            _ = interval.tick() => {
                match device.poll_notifications().await {
                    Ok(poll) => {
                        if cancel.is_cancelled() {
                            // This poll was in flight when the owning
                            // condition became false: discard its result.
                            continue;
                        }
                        apply_poll(&session, poll, &mut display_deadline);
                    }
                    // Transient by design: try again on the next tick.
                    Err(e) => debug!(error = %e, "notification poll failed"),
                }
            }
        }
    }
}

/// Resolves at the display deadline, or never while nothing is displayed.
async fn display_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn apply_poll(
    session: &Session,
    poll: NotificationPoll,
    display_deadline: &mut Option<Instant>,
) {
    // The recent log is always applied wholesale, new event or not --
    // the peripheral is the only ordering authority.
    if let Some(recent) = poll.recent_notifications {
        let _ = session.inner.recent_events.send_replace(recent);
    }

    if poll.has_new_notification {
        if let Some(event) = poll.notification {
            debug!(tag = %event.tag_id, status = ?event.status, "live event delivered");
            let _ = session.inner.current_event.send_replace(Some(event));
            *display_deadline = Some(Instant::now() + session.inner.config.display_window);
        }
    }
}

/// Shared exit action for the display timeout and explicit dismissal:
/// clear the local display, then send one best-effort acknowledgment
/// so the peripheral does not redeliver the event on the next poll.
async fn acknowledge(
    session: &Session,
    device: &DeviceClient,
    display_deadline: &mut Option<Instant>,
) {
    *display_deadline = None;

    let had_event = session.inner.current_event.send_replace(None).is_some();
    if !had_event {
        // Nothing displayed: repeated dismissals change nothing.
        return;
    }

    if let Err(e) = device.clear_notification().await {
        // The local display is already cleared; not retried. The
        // peripheral may redeliver the event on the next poll.
        warn!(error = %e, "failed to acknowledge live event");
    }
}
