//! SMS 渠道 - 调用外部短信网关命令发送
//!
//! 短信射频层由外部网关程序负责（如 mmcli / gammu 的封装脚本），
//! 渠道以 `<cmd> <号码> <正文>` 的约定调用它并解析退出状态。

use std::path::Path;
use std::process::Command;

use tracing::{debug, error};

use crate::model::{CallType, ChannelKind, DeliveryResult};
use crate::notification::channel::MessageChannel;

/// SMS 渠道配置
#[derive(Debug, Clone, Default)]
pub struct SmsConfig {
    /// 网关命令路径
    pub send_cmd: String,
}

/// SMS 渠道
pub struct SmsChannel {
    config: SmsConfig,
}

impl SmsChannel {
    pub fn new(config: SmsConfig) -> Self {
        Self { config }
    }
}

impl MessageChannel for SmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    fn credential_error(&self) -> Option<String> {
        if self.config.send_cmd.trim().is_empty() {
            Some("SMS gateway command is not configured".to_string())
        } else {
            None
        }
    }

    fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult {
        if let Some(err) = self.credential_error() {
            return DeliveryResult::failed(phone_number, call_type, self.kind(), message, err);
        }

        debug!(phone = %phone_number, cmd = %self.config.send_cmd, "Sending SMS");

        let output = Command::new(&self.config.send_cmd)
            .args([phone_number, message])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                debug!(phone = %phone_number, "SMS sent");
                DeliveryResult::success(phone_number, call_type, self.kind(), message)
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let detail = if stderr.is_empty() {
                    format!("SMS gateway exited with {}", output.status)
                } else {
                    stderr
                };
                error!(phone = %phone_number, error = %detail, "SMS gateway failed");
                DeliveryResult::failed(phone_number, call_type, self.kind(), message, detail)
            }
            Err(e) => {
                error!(phone = %phone_number, error = %e, "Failed to run SMS gateway");
                DeliveryResult::failed(phone_number, call_type, self.kind(), message, e.to_string())
            }
        }
    }

    fn is_supported(&self) -> bool {
        let cmd = self.config.send_cmd.trim();
        if cmd.is_empty() {
            return false;
        }
        // 绝对/相对路径直接检查存在性；裸命令名留给 PATH 解析
        if cmd.contains('/') {
            Path::new(cmd).exists()
        } else {
            true
        }
    }
}
