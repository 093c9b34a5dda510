//! GREEN API cloud gateway transport.

use async_trait::async_trait;
use backon::Retryable;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{report, retry_policy, DeliveryReport, NotificationSink, PairingQr, PairingState, SEND_TIMEOUT};
use crate::config::whatsapp::{Recipient, Transport, WhatsAppConfig};
use crate::error::NotifyError;
use crate::models::alert::AlertEvent;

pub struct GreenApiSink {
    http: reqwest::Client,
    base_url: String,
    id_instance: String,
    api_token: String,
    recipients: Vec<Recipient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateResponse {
    state_instance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QrResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

/// `+44 7700 900000` -> `447700900000@c.us`
pub fn chat_id(recipient: &Recipient) -> String {
    format!("{}@c.us", recipient.digits())
}

impl GreenApiSink {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        id_instance: impl Into<String>,
        api_token: impl Into<String>,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            id_instance: id_instance.into().trim().to_string(),
            api_token: api_token.into().trim().to_string(),
            recipients,
        }
    }

    pub fn from_config(config: &WhatsAppConfig, http: reqwest::Client) -> Self {
        Self::new(
            http,
            config.green_api_url.clone(),
            config.id_instance.clone(),
            config.api_token.clone(),
            config.recipients.clone(),
        )
    }

    fn is_configured(&self) -> bool {
        !self.id_instance.is_empty() && !self.api_token.is_empty()
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/waInstance{}/{}/{}",
            self.base_url, self.id_instance, method, self.api_token
        )
    }

    async fn send_once(&self, chat_id: &str, message: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&json!({ "chatId": chat_id, "message": message }))
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
impl NotificationSink for GreenApiSink {
    fn transport(&self) -> Transport {
        Transport::GreenApi
    }

    async fn deliver(
        &self,
        _events: &[AlertEvent],
        message: &str,
    ) -> Result<Vec<DeliveryReport>, NotifyError> {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured("GREEN API"));
        }
        if self.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let mut reports = Vec::with_capacity(self.recipients.len());
        for recipient in &self.recipients {
            let chat_id = chat_id(recipient);
            let outcome = (|| self.send_once(&chat_id, message))
                .retry(retry_policy())
                .when(NotifyError::is_transient)
                .notify(|e, delay| {
                    warn!(chat_id = %chat_id, error = %e, ?delay, "GreenApi: send failed, retrying");
                })
                .await;
            match &outcome {
                Ok(()) => info!(recipient = %recipient.name, "GreenApi: alert sent"),
                Err(e) => warn!(recipient = %recipient.name, error = %e, "GreenApi: alert not delivered"),
            }
            reports.push(report(recipient, outcome));
        }
        Ok(reports)
    }

    async fn status(&self) -> PairingState {
        if !self.is_configured() {
            return PairingState::NotConfigured;
        }
        let response = match self
            .http
            .get(self.method_url("getStateInstance"))
            .timeout(SEND_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return PairingState::Unreachable(e.to_string()),
        };
        match response.json::<StateResponse>().await {
            Ok(StateResponse {
                state_instance: Some(state),
            }) => match state.as_str() {
                "authorized" => PairingState::Authorized,
                "notAuthorized" => PairingState::NotAuthorized,
                _ => PairingState::Other(state),
            },
            Ok(_) => PairingState::Other("error".to_string()),
            Err(e) => PairingState::Unreachable(e.to_string()),
        }
    }

    async fn pairing_qr(&self) -> Result<PairingQr, NotifyError> {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured("GREEN API"));
        }
        let response = self
            .http
            .get(self.method_url("qr"))
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        let qr: QrResponse = response.json().await?;
        Ok(match (qr.kind.as_str(), qr.message) {
            ("qrCode", Some(png_base64)) => PairingQr::QrCode { png_base64 },
            ("alreadyLogged", _) => PairingQr::AlreadyLogged,
            ("accountDeleted", _) => PairingQr::AccountDeleted,
            _ => PairingQr::NotSupported,
        })
    }
}
