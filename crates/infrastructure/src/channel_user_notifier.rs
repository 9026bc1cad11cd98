//! Notice delivery over a broadcast channel.

use agora_application::{Notice, UserNotifier};
use tokio::sync::broadcast;
use tracing::debug;

/// Publishes notices to every subscribed rendering surface.
///
/// Notices raised while nobody is subscribed are dropped. Slow subscribers
/// lose the oldest notices once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct ChannelUserNotifier {
    sender: broadcast::Sender<Notice>,
}

impl ChannelUserNotifier {
    /// Creates a notifier buffering up to `capacity` notices per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to notices raised after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl UserNotifier for ChannelUserNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(broadcast::error::SendError(notice)) = self.sender.send(notice) {
            debug!(title = %notice.title, "dropped notice without subscribers");
        }
    }
}
