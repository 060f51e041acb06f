use async_trait::async_trait;
use domains::{Notification, Notifier, Result};

/// Writes notifications to the log instead of a chat channel. Used when no
/// webhook credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            username = %notification.username,
            colour = notification.colour.as_str(),
            thumb_url = notification.thumb_url.as_deref().unwrap_or(""),
            "{}",
            notification.text
        );
        Ok(())
    }
}
