//! Telegram 渠道 - 通过 Bot API 发送

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::model::{CallType, ChannelKind, DeliveryResult};
use crate::notification::channel::MessageChannel;

const BASE_URL: &str = "https://api.telegram.org/bot";
const TIMEOUT_SECONDS: u64 = 30;

/// Telegram 渠道配置
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// 接收消息的 chat ID
    pub chat_id: String,
    /// API 地址（测试时可替换）
    pub base_url: String,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            base_url: BASE_URL.to_string(),
            timeout_secs: TIMEOUT_SECONDS,
        }
    }
}

/// Telegram 渠道
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::blocking::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// 拼装带来电上下文的消息正文
    fn format_text(phone_number: &str, message: &str, call_type: CallType) -> String {
        format!("📞 Call from {} ({}):\n{}", phone_number, call_type, message)
    }
}

impl MessageChannel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    fn credential_error(&self) -> Option<String> {
        if self.config.bot_token.trim().is_empty() {
            Some("Telegram bot token is required".to_string())
        } else if self.config.chat_id.trim().is_empty() {
            Some("Telegram chat ID is required".to_string())
        } else {
            None
        }
    }

    fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult {
        if let Some(err) = self.credential_error() {
            return DeliveryResult::failed(phone_number, call_type, self.kind(), message, err);
        }

        debug!(chat_id = %self.config.chat_id, "Sending Telegram message");

        let payload = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": Self::format_text(phone_number, message, call_type),
            "parse_mode": "HTML",
        });

        let response = self
            .client
            .post(format!("{}{}/sendMessage", self.config.base_url, self.config.bot_token))
            .json(&payload)
            .send();

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(chat_id = %self.config.chat_id, "Telegram message sent");
                DeliveryResult::success(phone_number, call_type, self.kind(), message)
            }
            Ok(response) => {
                let code = response.status().as_u16();
                let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
                error!(chat_id = %self.config.chat_id, code, body = %body, "Telegram API error");
                DeliveryResult::failed(
                    phone_number,
                    call_type,
                    self.kind(),
                    message,
                    format!("API Error: {} - {}", code, body),
                )
            }
            Err(e) => {
                error!(chat_id = %self.config.chat_id, error = %e, "Failed to send Telegram message");
                DeliveryResult::failed(phone_number, call_type, self.kind(), message, e.to_string())
            }
        }
    }
}
