use async_trait::async_trait;
use url::form_urlencoded;

use super::{DeliveryReport, DeliveryStatus, NotificationSink};
use crate::config::whatsapp::{Recipient, Transport};
use crate::error::NotifyError;
use crate::models::alert::AlertEvent;

/// Produces `wa.me` click-to-chat links; sending is left to whoever opens them.
pub struct DeepLinkSink {
    recipients: Vec<Recipient>,
}

impl DeepLinkSink {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }
}

pub fn whatsapp_link(recipient: &Recipient, message: &str) -> String {
    // form encoding turns spaces into '+', wa.me wants %20
    let text: String = form_urlencoded::byte_serialize(message.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("https://wa.me/{}?text={}", recipient.digits(), text)
}

#[async_trait]
impl NotificationSink for DeepLinkSink {
    fn transport(&self) -> Transport {
        Transport::DeepLink
    }

    async fn deliver(
        &self,
        _events: &[AlertEvent],
        message: &str,
    ) -> Result<Vec<DeliveryReport>, NotifyError> {
        if self.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        Ok(self
            .recipients
            .iter()
            .map(|recipient| DeliveryReport {
                recipient: recipient.clone(),
                status: DeliveryStatus::LinkGenerated {
                    url: whatsapp_link(recipient, message),
                },
            })
            .collect())
    }
}
