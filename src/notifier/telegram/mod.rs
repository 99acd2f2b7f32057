pub mod sender;

use crate::model::NotifyError;
use crate::report::ReportSection;
use reqwest::Client;
use tracing::{info, warn};

pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: i64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token,
            chat_id,
            client,
        })
    }

    /// Builds a notifier only when both the token and the chat id are known.
    pub fn from_settings(
        bot_token: Option<&str>,
        chat_id: Option<i64>,
    ) -> Result<Self, NotifyError> {
        match (bot_token, chat_id) {
            (Some(token), Some(chat_id)) if !token.is_empty() => Self::new(token.to_string(), chat_id),
            _ => Err(NotifyError::NotConfigured),
        }
    }

    /// Sends one message of at most `sender::MAX_MESSAGE_CHARS` characters.
    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    /// Sends sections one by one; a failed section does not stop the rest.
    /// Returns how many sections were delivered.
    pub async fn send_sections(&self, sections: &[ReportSection]) -> usize {
        let mut delivered = 0;
        for (i, section) in sections.iter().enumerate() {
            info!("Sending report {} ({}) to Telegram...", i + 1, section.title);
            match sender::send_section(self, section).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Section '{}' failed: {}", section.title, e),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_token_and_chat() {
        assert!(matches!(
            TelegramNotifier::from_settings(None, Some(1)),
            Err(NotifyError::NotConfigured)
        ));
        assert!(matches!(
            TelegramNotifier::from_settings(Some("t"), None),
            Err(NotifyError::NotConfigured)
        ));
        assert!(matches!(
            TelegramNotifier::from_settings(Some(""), Some(1)),
            Err(NotifyError::NotConfigured)
        ));
        let notifier = TelegramNotifier::from_settings(Some("t"), Some(-5)).unwrap();
        assert_eq!(notifier.chat_id, -5);
    }
}
