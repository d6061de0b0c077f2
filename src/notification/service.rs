//! 呼叫结束处理 - 组合设置快照、调度与日志落盘
//!
//! 调度和落盘是两个独立的失败域：落盘失败只记日志，
//! 不会改变已经返回的投递结果。

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::model::{CallOutcome, DeliveryResult};
use crate::notification::channels::{
    SmsChannel, SmsConfig, TelegramChannel, TelegramConfig, WhatsAppChannel, WhatsAppConfig,
};
use crate::notification::orchestrator::NotificationOrchestrator;
use crate::settings::{NotificationSettings, SettingsStore};
use crate::store::CallLogStore;

/// 根据设置快照装配调度器（注册全部渠道实现）
///
/// 渠道是否启用、凭据是否齐全由调度时的快照判定，这里只负责构造。
pub fn build_orchestrator(settings: &NotificationSettings) -> Result<NotificationOrchestrator> {
    let mut orchestrator = NotificationOrchestrator::new();

    orchestrator.register_channel(Arc::new(WhatsAppChannel::new(WhatsAppConfig {
        api_key: settings.whatsapp_api_key.clone(),
        ..Default::default()
    })?));
    orchestrator.register_channel(Arc::new(SmsChannel::new(SmsConfig {
        send_cmd: settings.sms_cmd.clone(),
    })));
    orchestrator.register_channel(Arc::new(TelegramChannel::new(TelegramConfig {
        bot_token: settings.telegram_bot_token.clone(),
        chat_id: settings.telegram_chat_id.clone(),
        ..Default::default()
    })?));

    Ok(orchestrator)
}

/// 呼叫结束处理服务
pub struct DispatchService {
    settings_store: SettingsStore,
    log_store: CallLogStore,
}

impl DispatchService {
    pub fn new() -> Self {
        Self {
            settings_store: SettingsStore::new(),
            log_store: CallLogStore::new(),
        }
    }

    /// 使用自定义存储位置（测试用）
    pub fn with_stores(settings_store: SettingsStore, log_store: CallLogStore) -> Self {
        Self { settings_store, log_store }
    }

    pub fn log_store(&self) -> &CallLogStore {
        &self.log_store
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings_store
    }

    /// 处理一次通话结束：取设置快照 → 调度 → 落盘
    ///
    /// 返回调度产生的投递结果；落盘失败只记日志不传播。
    pub fn handle_call_ended(&self, outcome: &CallOutcome) -> Result<Vec<DeliveryResult>> {
        debug!(
            phone = %outcome.phone_number,
            call_type = %outcome.call_type,
            duration_ms = outcome.duration_ms,
            "Handling call ended"
        );

        // 每次调度取一份不可变快照，调度中途不感知设置变更
        let settings = self.settings_store.load()?;
        let orchestrator = build_orchestrator(&settings)?;
        let results = orchestrator.dispatch(outcome, &settings, &self.log_store);

        for result in &results {
            if let Err(e) = self.log_store.append(result) {
                warn!(
                    channel = %result.channel,
                    error = %e,
                    "Failed to persist delivery result"
                );
            }
        }

        info!(
            phone = %outcome.phone_number,
            results = results.len(),
            "Dispatch finished"
        );
        Ok(results)
    }
}

impl Default for DispatchService {
    fn default() -> Self {
        Self::new()
    }
}
