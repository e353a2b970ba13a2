use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::controller::SyncStatusController;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Window focus changes, as delivered by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Gained,
    Lost,
}

/// The recurring timer and the focus listener of one controller.
///
/// Both triggers call the controller's coalesced `refresh`. Stopping (or
/// dropping) the subscription aborts both tasks together, whether or not a
/// refresh is in flight.
pub struct RefreshSubscription {
    timer: Option<JoinHandle<()>>,
    focus: Option<JoinHandle<()>>,
}

impl RefreshSubscription {
    /// Refresh immediately, then every `interval`, and on each
    /// [`FocusEvent::Gained`] received from `focus`.
    pub fn start(
        controller: SyncStatusController,
        interval: Duration,
        focus: Option<broadcast::Receiver<FocusEvent>>,
    ) -> Self {
        let interval = interval.max(MIN_REFRESH_INTERVAL);

        let timer = {
            let controller = controller.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    // The first tick completes immediately.
                    ticker.tick().await;
                    controller.refresh().await;
                }
            })
        };

        let focus = focus.map(|rx| tokio::spawn(listen_for_focus(controller, rx)));

        tracing::debug!("refresh subscription started (every {:?})", interval);

        Self {
            timer: Some(timer),
            focus,
        }
    }

    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let timer = self.timer.take();
        let focus = self.focus.take();
        if timer.is_none() && focus.is_none() {
            return;
        }
        for handle in [timer, focus].into_iter().flatten() {
            handle.abort();
        }
        tracing::debug!("refresh subscription stopped");
    }
}

impl Drop for RefreshSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

async fn listen_for_focus(
    controller: SyncStatusController,
    mut rx: broadcast::Receiver<FocusEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(FocusEvent::Gained) => {
                controller.refresh().await;
            }
            Ok(FocusEvent::Lost) => {}
            // Missed some events; one refresh covers all of them.
            Err(broadcast::error::RecvError::Lagged(_)) => {
                controller.refresh().await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
