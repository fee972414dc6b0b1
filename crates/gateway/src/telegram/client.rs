use std::time::Duration;

use async_trait::async_trait;
use midas_core::UserId;
use midas_ports::{Messenger, SendError};
use reqwest::Client;
use serde::Serialize;

use super::wire::{ApiResponse, Update};
use crate::error::GatewayError;

const API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Minimal Bot API client: `sendMessage` out, `getUpdates` in.
pub struct TelegramClient {
    http: Client,
    base: String,
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct GetUpdatesParams {
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base(API_BASE, token)
    }

    /// Point at a different API host (tests, local bot-api servers)
    pub fn with_base(base: &str, token: &str) -> Self {
        Self {
            http: Client::new(),
            base: format!("{base}/bot{token}"),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, GatewayError> {
        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| GatewayError::Malformed("ok response without result".into()))
        } else {
            Err(GatewayError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            })
        }
    }

    /// Long-poll for inbound updates. `offset` acknowledges everything
    /// below it.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, GatewayError> {
        let response = self
            .http
            .post(self.method_url("getUpdates"))
            .json(&GetUpdatesParams {
                timeout: timeout_secs,
                offset,
            })
            // leave headroom over the server-side long-poll window
            .timeout(Duration::from_secs(timeout_secs + 10))
            .send()
            .await?;
        let envelope: ApiResponse<Vec<Update>> = response
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;
        Self::unwrap_envelope(envelope)
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessageParams { chat_id, text })
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;
        let envelope: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;
        Self::unwrap_envelope(envelope).map(|_| ())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, user: UserId, text: &str) -> Result<(), SendError> {
        self.send_message(user, text)
            .await
            .map_err(GatewayError::into_send_error)
    }
}
