//! Transport for a WhatsApp client running next to us and paired with a phone by QR code.

use async_trait::async_trait;
use backon::Retryable;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{report, retry_policy, DeliveryReport, NotificationSink, PairingQr, PairingState, SEND_TIMEOUT};
use crate::config::whatsapp::{Recipient, Transport, WhatsAppConfig};
use crate::error::NotifyError;
use crate::models::alert::AlertEvent;

pub struct LocalClientSink {
    http: reqwest::Client,
    base_url: String,
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    paired: bool,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QrResponse {
    #[serde(default)]
    paired: bool,
    #[serde(default)]
    qr: Option<String>,
}

impl LocalClientSink {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, recipients: Vec<Recipient>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            recipients,
        }
    }

    pub fn from_config(config: &WhatsAppConfig, http: reqwest::Client) -> Self {
        Self::new(http, config.local_client_url.clone(), config.recipients.clone())
    }

    async fn send_once(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(format!("{}/send", self.base_url))
            .timeout(SEND_TIMEOUT)
            .json(&json!({ "phone": phone, "message": message }))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl NotificationSink for LocalClientSink {
    fn transport(&self) -> Transport {
        Transport::LocalClient
    }

    async fn deliver(
        &self,
        _events: &[AlertEvent],
        message: &str,
    ) -> Result<Vec<DeliveryReport>, NotifyError> {
        if self.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let mut reports = Vec::with_capacity(self.recipients.len());
        for recipient in &self.recipients {
            let phone = recipient.digits();
            let outcome = (|| self.send_once(&phone, message))
                .retry(retry_policy())
                .when(NotifyError::is_transient)
                .await;
            match &outcome {
                Ok(()) => info!(recipient = %recipient.name, "LocalClient: alert sent"),
                Err(e) => warn!(recipient = %recipient.name, error = %e, "LocalClient: alert not delivered"),
            }
            reports.push(report(recipient, outcome));
        }
        Ok(reports)
    }

    async fn status(&self) -> PairingState {
        let response = match self
            .http
            .get(format!("{}/status", self.base_url))
            .timeout(SEND_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return PairingState::Unreachable(e.to_string()),
        };
        match response.json::<StatusResponse>().await {
            Ok(StatusResponse { paired: true, .. }) => PairingState::Authorized,
            Ok(StatusResponse { state: Some(state), .. }) if state != "unpaired" => {
                PairingState::Other(state)
            }
            Ok(_) => PairingState::NotAuthorized,
            Err(e) => PairingState::Unreachable(e.to_string()),
        }
    }

    async fn pairing_qr(&self) -> Result<PairingQr, NotifyError> {
        let response = self
            .http
            .get(format!("{}/qr", self.base_url))
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        let qr: QrResponse = response.json().await?;
        Ok(match qr {
            QrResponse { paired: true, .. } => PairingQr::AlreadyLogged,
            QrResponse { qr: Some(png_base64), .. } => PairingQr::QrCode { png_base64 },
            _ => PairingQr::NotSupported,
        })
    }
}
