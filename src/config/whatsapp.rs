//! WhatsApp delivery settings: which transport, its credentials and who gets alerts.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GREEN_API_URL: &str = "https://api.green-api.com";
pub const DEFAULT_LOCAL_CLIENT_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// wa.me click-to-open links, sent by a human.
    #[default]
    DeepLink,
    /// GREEN API cloud gateway.
    GreenApi,
    /// Locally running client paired with a phone by QR code.
    LocalClient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
}

impl Recipient {
    pub fn new(name: &str, phone: &str) -> Result<Self, ConfigError> {
        let (name, phone) = (name.trim(), phone.trim());
        if name.is_empty() || phone.is_empty() {
            return Err(ConfigError::InvalidRecipient);
        }
        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Phone number reduced to the digits WhatsApp addresses by (`+44 7700-900000` -> `447700900000`).
    pub fn digits(&self) -> String {
        self.phone
            .chars()
            .filter(|c| !matches!(c, '+' | ' ' | '-'))
            .collect()
    }
}

/// Missing keys in a saved file fall back to these defaults one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub transport: Transport,
    pub id_instance: String,
    pub api_token: String,
    pub green_api_url: String,
    pub local_client_url: String,
    pub recipients: Vec<Recipient>,
    pub auto_send: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            id_instance: String::new(),
            api_token: String::new(),
            green_api_url: DEFAULT_GREEN_API_URL.to_string(),
            local_client_url: DEFAULT_LOCAL_CLIENT_URL.to_string(),
            recipients: Vec::new(),
            auto_send: true,
        }
    }
}

impl WhatsAppConfig {
    pub fn has_green_api_credentials(&self) -> bool {
        !self.id_instance.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn add_recipient(&mut self, name: &str, phone: &str) -> Result<&Recipient, ConfigError> {
        self.recipients.push(Recipient::new(name, phone)?);
        let index = self.recipients.len() - 1;
        Ok(&self.recipients[index])
    }

    pub fn remove_recipient(&mut self, index: usize) -> Result<Recipient, ConfigError> {
        if index >= self.recipients.len() {
            return Err(ConfigError::IndexOutOfRange(index));
        }
        Ok(self.recipients.remove(index))
    }
}
