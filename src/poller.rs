use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::page_service::StatusPage;
use crate::services::trigger_service::{NotificationTrigger, TriggerOutcome};

/// Fetch the page once and feed the heading to the trigger.
///
/// Returns `None` when the page gave no signal (fetch or parse failure).
pub async fn check_once(
    page: &StatusPage,
    trigger: &NotificationTrigger,
) -> Option<TriggerOutcome> {
    match page.fetch_heading().await {
        Ok(heading) => {
            let outcome = trigger.on_heading(&heading).await;
            tracing::info!("Status check finished: {:?}", outcome);
            Some(outcome)
        }
        Err(e) => {
            tracing::warn!("Status check of {} failed: {}", page.url(), e);
            None
        }
    }
}

/// Background task: check immediately, then every `every`, until `cancel`
/// fires or its sender is dropped.
///
/// Cancellation is only observed between checks; a check in flight always
/// runs to completion.
pub async fn poll_loop(
    page: StatusPage,
    trigger: NotificationTrigger,
    every: Duration,
    mut cancel: oneshot::Receiver<()>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("Starting poll loop: url={}, interval={:?}", page.url(), every);

    loop {
        tokio::select! {
            _ = &mut cancel => break,
            _ = ticker.tick() => {
                check_once(&page, &trigger).await;
            }
        }
    }

    tracing::info!("Poll loop stopped");
}
