//! 消息渠道 trait 定义

use crate::model::{CallType, ChannelKind, DeliveryResult};

/// 出站消息渠道
///
/// 三个实现（SMS / WhatsApp / Telegram）通过 `kind()` 标签区分，
/// 调度器按标签匹配启用集合，不做任何子类型判断。
pub trait MessageChannel: Send + Sync {
    /// 渠道类型标签
    fn kind(&self) -> ChannelKind;

    /// 检查发送所需凭据；缺失时返回可读的说明
    ///
    /// 调度器在凭据缺失时本地合成 FAILED 结果，不会调用 `send`。
    fn credential_error(&self) -> Option<String>;

    /// 同步发送一条消息
    ///
    /// 绝不向调用方抛出错误：所有配置和传输失败都编码为
    /// FAILED 的 `DeliveryResult`，`error_detail` 带人类可读原因。
    fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult;

    /// 渠道前置条件是否满足（仅用于 UI 展示，调度器不会调用）
    fn is_supported(&self) -> bool {
        self.credential_error().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeliveryStatus;

    struct CannedChannel {
        kind: ChannelKind,
        credential_error: Option<String>,
    }

    impl MessageChannel for CannedChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn credential_error(&self) -> Option<String> {
            self.credential_error.clone()
        }

        fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult {
            DeliveryResult::success(phone_number, call_type, self.kind, message)
        }
    }

    #[test]
    fn test_is_supported_follows_credentials() {
        let ready = CannedChannel { kind: ChannelKind::Telegram, credential_error: None };
        assert!(ready.is_supported());

        let broken = CannedChannel {
            kind: ChannelKind::Telegram,
            credential_error: Some("Telegram bot token is required".to_string()),
        };
        assert!(!broken.is_supported());
    }

    #[test]
    fn test_send_produces_result_for_own_kind() {
        let channel = CannedChannel { kind: ChannelKind::Sms, credential_error: None };
        let result = channel.send("+15551234567", "hello", CallType::Missed);

        assert_eq!(result.channel, ChannelKind::Sms);
        assert_eq!(result.status, DeliveryStatus::Success);
        assert_eq!(result.message, "hello");
    }
}
