//! 通知抽象层 - 去重、模板与多渠道调度
//!
//! # 设计目标
//! 1. 统一接口：所有渠道实现 `MessageChannel` trait
//! 2. 渠道解耦：每个渠道独立实现，单渠道失败互不影响
//! 3. 确定性扇出：结果列表按固定优先级排列，便于测试复现
//! 4. 职责分离：调度器只发送，持久化由调用方完成

pub mod channel;
pub mod channels;
pub mod dedup;
pub mod orchestrator;
pub mod service;
pub mod template;

pub use channel::MessageChannel;
pub use channels::{SmsChannel, SmsConfig, TelegramChannel, TelegramConfig, WhatsAppChannel, WhatsAppConfig};
pub use dedup::{DedupFilter, HistoryLookup};
pub use orchestrator::{NotificationOrchestrator, CHANNEL_PRIORITY};
pub use service::{build_orchestrator, DispatchService};
pub use template::{TemplateResolver, TemplateSet};
