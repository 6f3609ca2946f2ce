use std::sync::Arc;

use tracing::{info, warn};

use crate::services::mail_service::Mailer;
use crate::state::SubscriberRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Unavailable,
    Available,
}

/// Exact, case-sensitive comparison. No trimming.
pub fn classify(heading: &str, unavailable_text: &str) -> Availability {
    if heading == unavailable_text {
        Availability::Unavailable
    } else {
        Availability::Available
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Heading still shows the sentinel.
    Unavailable,
    /// Available, but nobody to tell.
    NoSubscribers,
    /// Broadcast accepted for this many recipients; they are gone from the registry.
    Notified(usize),
    /// Broadcast failed; recipients were put back.
    SendFailed,
}

/// Turns a status heading into (at most) one broadcast.
///
/// There is no memory of the previous poll: every heading that differs from
/// the sentinel fires again, including back-to-back "available" polls.
pub struct NotificationTrigger {
    registry: Arc<SubscriberRegistry>,
    mailer: Arc<dyn Mailer>,
    unavailable_text: String,
}

impl NotificationTrigger {
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        mailer: Arc<dyn Mailer>,
        unavailable_text: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            mailer,
            unavailable_text: unavailable_text.into(),
        }
    }

    pub async fn on_heading(&self, heading: &str) -> TriggerOutcome {
        if classify(heading, &self.unavailable_text) == Availability::Unavailable {
            info!("Free trial still unavailable");
            return TriggerOutcome::Unavailable;
        }

        // Drained up front so a subscriber added during the send is neither
        // notified nor wiped.
        let recipients = self.registry.drain();
        if recipients.is_empty() {
            info!(heading, "Free trial looks available, but nobody is subscribed");
            return TriggerOutcome::NoSubscribers;
        }

        info!(
            heading,
            recipients = recipients.len(),
            "Free trial looks available, emailing subscribers"
        );

        match self.mailer.broadcast(&recipients).await {
            Ok(()) => {
                self.registry.settle(&recipients);
                TriggerOutcome::Notified(recipients.len())
            }
            Err(e) => {
                warn!("Error sending emails: {}", e);
                self.registry.restore(recipients);
                TriggerOutcome::SendFailed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::errors::WatchError;
    use crate::services::mail_service::Mailer;

    /// Records every broadcast; optionally fails them all.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Vec<String>>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<Vec<String>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn broadcast(&self, recipients: &[String]) -> Result<(), WatchError> {
            self.sent.lock().unwrap().push(recipients.to_vec());
            if self.fail {
                return Err(WatchError::MailRejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }
    }
}
