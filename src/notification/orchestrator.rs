//! 通知调度器 - 将一次通话结果扇出到所有启用渠道
//!
//! 调度流程：总开关 → 去重检查（一次性，全有或全无）→ 模板解析 →
//! 按固定优先级逐个渠道尝试。单个渠道失败不影响其余渠道，
//! 结果列表顺序与优先级一致，便于测试复现。调度器自身不做持久化。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::model::{CallOutcome, ChannelKind, DeliveryResult, DeliveryStatus};
use crate::notification::channel::MessageChannel;
use crate::notification::dedup::{DedupFilter, HistoryLookup};
use crate::notification::template::TemplateResolver;
use crate::settings::NotificationSettings;

/// 渠道尝试的固定优先级：高成本、高可靠渠道优先
pub const CHANNEL_PRIORITY: [ChannelKind; 3] =
    [ChannelKind::WhatsApp, ChannelKind::Sms, ChannelKind::Telegram];

/// 通知调度器 - 持有渠道实现并按设置快照扇出
pub struct NotificationOrchestrator {
    channels: Vec<Arc<dyn MessageChannel>>,
}

impl NotificationOrchestrator {
    pub fn new() -> Self {
        Self { channels: Vec::new() }
    }

    /// 注册渠道实现
    pub fn register_channel(&mut self, channel: Arc<dyn MessageChannel>) {
        info!(channel = %channel.kind(), "Registering message channel");
        self.channels.push(channel);
    }

    /// 已注册的渠道数量
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 已注册的渠道类型
    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        self.channels.iter().map(|c| c.kind()).collect()
    }

    /// 调度一次通话结果
    ///
    /// 返回按优先级排列的投递结果；总开关关闭或被去重抑制时返回空列表。
    pub fn dispatch(
        &self,
        outcome: &CallOutcome,
        settings: &NotificationSettings,
        history: &dyn HistoryLookup,
    ) -> Vec<DeliveryResult> {
        if !settings.enabled {
            debug!("App is disabled, skipping dispatch");
            return Vec::new();
        }

        // 去重在任何渠道尝试之前评估一次，不存在扇出中途抑制
        if DedupFilter::should_suppress(&outcome.phone_number, settings.dedup_hours, history) {
            info!(phone = %outcome.phone_number, "Notification suppressed by dedup window");
            return Vec::new();
        }

        let message = TemplateResolver::resolve(
            outcome.call_type,
            settings.language,
            &settings.templates,
        );

        let mut results = Vec::new();
        for kind in CHANNEL_PRIORITY {
            if !settings.is_channel_enabled(kind) {
                continue;
            }

            let Some(channel) = self.channels.iter().find(|c| c.kind() == kind) else {
                warn!(channel = %kind, "Channel enabled but no implementation registered");
                continue;
            };

            // 凭据缺失：本地合成 FAILED 结果，不触发传输，保证审计列表完整
            if let Some(err) = channel.credential_error() {
                warn!(channel = %kind, error = %err, "Channel misconfigured, skipping transport");
                results.push(DeliveryResult::failed(
                    &outcome.phone_number,
                    outcome.call_type,
                    kind,
                    &message,
                    err,
                ));
                continue;
            }

            let result = channel.send(&outcome.phone_number, &message, outcome.call_type);
            match result.status {
                DeliveryStatus::Success => {
                    info!(channel = %kind, phone = %outcome.phone_number, "Message sent")
                }
                _ => warn!(
                    channel = %kind,
                    phone = %outcome.phone_number,
                    error = ?result.error_detail,
                    "Message failed"
                ),
            }
            results.push(result);
        }

        results
    }
}

impl Default for NotificationOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallType;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 测试用的 mock 渠道：返回预设结果并统计调用次数
    struct MockChannel {
        kind: ChannelKind,
        credential_error: Option<String>,
        fail_with: Option<String>,
        send_count: AtomicUsize,
    }

    impl MockChannel {
        fn ok(kind: ChannelKind) -> Self {
            Self { kind, credential_error: None, fail_with: None, send_count: AtomicUsize::new(0) }
        }

        fn failing(kind: ChannelKind, detail: &str) -> Self {
            Self {
                kind,
                credential_error: None,
                fail_with: Some(detail.to_string()),
                send_count: AtomicUsize::new(0),
            }
        }

        fn misconfigured(kind: ChannelKind, error: &str) -> Self {
            Self {
                kind,
                credential_error: Some(error.to_string()),
                fail_with: None,
                send_count: AtomicUsize::new(0),
            }
        }

        fn sends(&self) -> usize {
            self.send_count.load(Ordering::SeqCst)
        }
    }

    impl MessageChannel for MockChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn credential_error(&self) -> Option<String> {
            self.credential_error.clone()
        }

        fn send(&self, phone_number: &str, message: &str, call_type: CallType) -> DeliveryResult {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(detail) => {
                    DeliveryResult::failed(phone_number, call_type, self.kind, message, detail.clone())
                }
                None => DeliveryResult::success(phone_number, call_type, self.kind, message),
            }
        }
    }

    struct FixedHistory(anyhow::Result<u64>);

    impl HistoryLookup for FixedHistory {
        fn count_since(&self, _phone: &str, _since: chrono::DateTime<Utc>) -> anyhow::Result<u64> {
            match &self.0 {
                Ok(n) => Ok(*n),
                Err(e) => Err(anyhow::anyhow!(e.to_string())),
            }
        }
    }

    fn outcome(call_type: CallType) -> CallOutcome {
        CallOutcome {
            phone_number: "+15551234567".to_string(),
            call_type,
            ended_at: Utc::now(),
            duration_ms: 3000,
        }
    }

    fn settings_with(channels: &[ChannelKind]) -> NotificationSettings {
        let mut settings = NotificationSettings::default();
        settings.enabled = true;
        settings.sms_enabled = channels.contains(&ChannelKind::Sms);
        settings.whatsapp_enabled = channels.contains(&ChannelKind::WhatsApp);
        settings.telegram_enabled = channels.contains(&ChannelKind::Telegram);
        settings
    }

    #[test]
    fn test_disabled_app_returns_empty_and_skips_dedup() {
        let mut orchestrator = NotificationOrchestrator::new();
        let channel = Arc::new(MockChannel::ok(ChannelKind::Sms));
        orchestrator.register_channel(channel.clone());

        let mut settings = settings_with(&[ChannelKind::Sms]);
        settings.enabled = false;

        // 去重抑制条件成立，但总开关关闭时根本不评估
        let history = FixedHistory(Ok(5));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert!(results.is_empty());
        assert_eq!(channel.sends(), 0);
    }

    #[test]
    fn test_suppressed_dispatch_returns_empty() {
        let mut orchestrator = NotificationOrchestrator::new();
        let channel = Arc::new(MockChannel::ok(ChannelKind::Sms));
        orchestrator.register_channel(channel.clone());

        let settings = settings_with(&[ChannelKind::Sms]);
        let history = FixedHistory(Ok(1));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert!(results.is_empty());
        assert_eq!(channel.sends(), 0);
    }

    #[test]
    fn test_missed_call_sends_default_template_over_sms() {
        let mut orchestrator = NotificationOrchestrator::new();
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));

        let settings = settings_with(&[ChannelKind::Sms]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].channel, ChannelKind::Sms);
        assert_eq!(results[0].status, DeliveryStatus::Success);
        assert_eq!(results[0].message, "I missed your call, will call back soon.");
    }

    #[test]
    fn test_results_follow_priority_order_not_registration_order() {
        let mut orchestrator = NotificationOrchestrator::new();
        // 注册顺序故意与优先级相反
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Telegram)));
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::WhatsApp)));

        let settings =
            settings_with(&[ChannelKind::Sms, ChannelKind::WhatsApp, ChannelKind::Telegram]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Incoming), &settings, &history);

        let order: Vec<ChannelKind> = results.iter().map(|r| r.channel).collect();
        assert_eq!(order, vec![ChannelKind::WhatsApp, ChannelKind::Sms, ChannelKind::Telegram]);
    }

    #[test]
    fn test_disabled_channel_produces_no_result() {
        let mut orchestrator = NotificationOrchestrator::new();
        let telegram = Arc::new(MockChannel::ok(ChannelKind::Telegram));
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));
        orchestrator.register_channel(telegram.clone());

        let settings = settings_with(&[ChannelKind::Sms]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].channel, ChannelKind::Sms);
        assert_eq!(telegram.sends(), 0);
    }

    #[test]
    fn test_missing_credentials_synthesize_failed_without_transport() {
        let mut orchestrator = NotificationOrchestrator::new();
        let whatsapp =
            Arc::new(MockChannel::misconfigured(ChannelKind::WhatsApp, "WhatsApp API key is required"));
        orchestrator.register_channel(whatsapp.clone());
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));

        let settings = settings_with(&[ChannelKind::WhatsApp, ChannelKind::Sms]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        // 两个启用渠道恰好两条结果：一条本地合成 FAILED，一条真实发送
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].channel, ChannelKind::WhatsApp);
        assert_eq!(results[0].status, DeliveryStatus::Failed);
        assert!(results[0].error_detail.as_deref().unwrap().contains("API key"));
        assert_eq!(results[1].channel, ChannelKind::Sms);
        assert_eq!(results[1].status, DeliveryStatus::Success);
        // 凭据缺失的渠道没有发起传输
        assert_eq!(whatsapp.sends(), 0);
    }

    #[test]
    fn test_one_channel_failure_does_not_stop_the_rest() {
        let mut orchestrator = NotificationOrchestrator::new();
        orchestrator
            .register_channel(Arc::new(MockChannel::failing(ChannelKind::WhatsApp, "API Error: 500 - boom")));
        let telegram = Arc::new(MockChannel::ok(ChannelKind::Telegram));
        orchestrator.register_channel(telegram.clone());

        let settings = settings_with(&[ChannelKind::WhatsApp, ChannelKind::Telegram]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Outgoing), &settings, &history);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, DeliveryStatus::Failed);
        assert_eq!(results[1].status, DeliveryStatus::Success);
        assert_eq!(telegram.sends(), 1);
    }

    #[test]
    fn test_history_failure_does_not_block_dispatch() {
        let mut orchestrator = NotificationOrchestrator::new();
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));

        let settings = settings_with(&[ChannelKind::Sms]);
        let history = FixedHistory(Err(anyhow::anyhow!("store unavailable")));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, DeliveryStatus::Success);
    }

    #[test]
    fn test_zero_dedup_window_never_suppresses() {
        let mut orchestrator = NotificationOrchestrator::new();
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));

        let mut settings = settings_with(&[ChannelKind::Sms]);
        settings.dedup_hours = 0;
        let history = FixedHistory(Ok(100));
        let results = orchestrator.dispatch(&outcome(CallType::Missed), &settings, &history);

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_unknown_outcome_uses_incoming_default_template() {
        let mut orchestrator = NotificationOrchestrator::new();
        orchestrator.register_channel(Arc::new(MockChannel::ok(ChannelKind::Sms)));

        let settings = settings_with(&[ChannelKind::Sms]);
        let history = FixedHistory(Ok(0));
        let results = orchestrator.dispatch(&outcome(CallType::Unknown), &settings, &history);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message, "Thanks for calling!");
    }
}
