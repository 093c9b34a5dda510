//! WhatsApp notification transports behind one sink interface.

pub mod deep_link;
pub mod green_api;
pub mod local_client;

use async_trait::async_trait;
use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::whatsapp::{Recipient, Transport, WhatsAppConfig};
use crate::error::NotifyError;
use crate::models::alert::AlertEvent;

pub use deep_link::DeepLinkSink;
pub use green_api::GreenApiSink;
pub use local_client::LocalClientSink;

pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    /// Nothing was sent; a human has to open the link.
    LinkGenerated { url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub recipient: Recipient,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

/// Whether a transport can send right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PairingState {
    /// Transport needs no pairing.
    Ready,
    Authorized,
    NotAuthorized,
    NotConfigured,
    Other(String),
    Unreachable(String),
}

/// Pairing code a transport offers for linking a phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PairingQr {
    QrCode { png_base64: String },
    AlreadyLogged,
    AccountDeleted,
    NotSupported,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn transport(&self) -> Transport;

    /// Hand `message` (the rendering of `events`) to every recipient. One report per
    /// recipient; an `Err` means nothing could be attempted at all.
    async fn deliver(
        &self,
        events: &[AlertEvent],
        message: &str,
    ) -> Result<Vec<DeliveryReport>, NotifyError>;

    async fn status(&self) -> PairingState {
        PairingState::Ready
    }

    async fn pairing_qr(&self) -> Result<PairingQr, NotifyError> {
        Ok(PairingQr::NotSupported)
    }
}

/// Build the transport selected in `config`.
pub fn from_config(config: &WhatsAppConfig, http: reqwest::Client) -> Arc<dyn NotificationSink> {
    match config.transport {
        Transport::DeepLink => Arc::new(DeepLinkSink::new(config.recipients.clone())),
        Transport::GreenApi => Arc::new(GreenApiSink::from_config(config, http)),
        Transport::LocalClient => Arc::new(LocalClientSink::from_config(config, http)),
    }
}

pub(crate) fn retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(250))
        .with_max_delay(Duration::from_secs(4))
        .with_max_times(3)
}

pub(crate) fn report(recipient: &Recipient, outcome: Result<(), NotifyError>) -> DeliveryReport {
    DeliveryReport {
        recipient: recipient.clone(),
        status: match outcome {
            Ok(()) => DeliveryStatus::Sent,
            Err(e) => DeliveryStatus::Failed {
                error: e.to_string(),
            },
        },
    }
}
