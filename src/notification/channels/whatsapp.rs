//! WhatsApp 渠道 - 通过 360messenger HTTP API 发送

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error};

use crate::model::{CallType, ChannelKind, DeliveryResult};
use crate::notification::channel::MessageChannel;

const BASE_URL: &str = "https://api.360messenger.com/v1";
const TIMEOUT_SECONDS: u64 = 30;

/// WhatsApp 渠道配置
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// API key（Bearer 认证）
    pub api_key: String,
    /// API 地址（测试时可替换）
    pub base_url: String,
    /// 超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: BASE_URL.to_string(),
            timeout_secs: TIMEOUT_SECONDS,
        }
    }
}

/// WhatsApp 渠道
pub struct WhatsAppChannel {
    config: WhatsAppConfig,
    client: reqwest::blocking::Client,
}

impl WhatsAppChannel {
    pub fn new(config: WhatsAppConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }
}

impl MessageChannel for WhatsAppChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::WhatsApp
    }

    fn credential_error(&self) -> Option<String> {
        if self.config.api_key.trim().is_empty() {
            Some("WhatsApp API key is required".to_string())
        } else {
            None
        }
    }

    fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult {
        if let Some(err) = self.credential_error() {
            return DeliveryResult::failed(phone_number, call_type, self.kind(), message, err);
        }

        debug!(phone = %phone_number, "Sending WhatsApp message");

        let payload = serde_json::json!({
            "to": phone_number,
            "type": "text",
            "text": { "body": message },
        });

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send();

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(phone = %phone_number, "WhatsApp message sent");
                DeliveryResult::success(phone_number, call_type, self.kind(), message)
            }
            Ok(response) => {
                let code = response.status().as_u16();
                let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
                error!(phone = %phone_number, code, body = %body, "WhatsApp API error");
                DeliveryResult::failed(
                    phone_number,
                    call_type,
                    self.kind(),
                    message,
                    format!("API Error: {} - {}", code, body),
                )
            }
            Err(e) => {
                error!(phone = %phone_number, error = %e, "Failed to send WhatsApp message");
                DeliveryResult::failed(phone_number, call_type, self.kind(), message, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeliveryStatus;

    #[test]
    fn test_config_default() {
        let config = WhatsAppConfig::default();
        assert_eq!(config.base_url, "https://api.360messenger.com/v1");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_blank_api_key_reports_credential_error() {
        let channel = WhatsAppChannel::new(WhatsAppConfig::default()).unwrap();
        let err = channel.credential_error().unwrap();
        assert!(err.contains("API key"));
        assert!(!channel.is_supported());
    }

    #[test]
    fn test_send_without_credentials_fails_locally() {
        // 凭据缺失时不发起网络请求，直接返回 FAILED
        let channel = WhatsAppChannel::new(WhatsAppConfig::default()).unwrap();
        let result = channel.send("+15551234567", "hello", CallType::Missed);

        assert_eq!(result.status, DeliveryStatus::Failed);
        assert_eq!(result.channel, ChannelKind::WhatsApp);
        assert!(result.error_detail.unwrap().contains("API key"));
    }

    #[test]
    fn test_transport_failure_becomes_failed_result() {
        // 指向不可达地址：send 不应 panic，失败编码进结果
        let channel = WhatsAppChannel::new(WhatsAppConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let result = channel.send("+15551234567", "hello", CallType::Incoming);
        assert_eq!(result.status, DeliveryStatus::Failed);
        assert!(result.error_detail.is_some());
    }
}
