//! 渠道实现

pub mod sms;
pub mod telegram;
pub mod whatsapp;

pub use sms::{SmsChannel, SmsConfig};
pub use telegram::{TelegramChannel, TelegramConfig};
pub use whatsapp::{WhatsAppChannel, WhatsAppConfig};
