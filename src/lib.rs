//! AutoConnect SMS - 通话结束后自动发送 SMS / WhatsApp / Telegram 通知

pub mod cli;
pub mod model;
pub mod notification;
pub mod settings;
pub mod store;
pub mod telephony;

pub use model::{
    is_valid_phone_number, CallOutcome, CallType, ChannelKind, DeliveryResult, DeliveryStatus,
    Language,
};
pub use notification::{
    build_orchestrator, DedupFilter, DispatchService, HistoryLookup, MessageChannel,
    NotificationOrchestrator, TemplateResolver, TemplateSet, CHANNEL_PRIORITY,
};
pub use notification::{
    SmsChannel, SmsConfig, TelegramChannel, TelegramConfig, WhatsAppChannel, WhatsAppConfig,
};
pub use settings::{AutoCleanup, NotificationSettings, SettingsStore};
pub use store::{CallLogStore, ResultSink};
pub use telephony::{CallEventClassifier, CallSignal, CallState};
