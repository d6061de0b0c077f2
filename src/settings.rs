//! 应用设置 - JSON 文件读写与快照
//!
//! 调度器每次只拿一份不可变快照，核心逻辑从不回写设置。

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ChannelKind, Language};
use crate::notification::template::TemplateSet;

/// 日志自动清理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoCleanup {
    #[serde(rename = "DAILY")]
    Daily,
    #[serde(rename = "WEEKLY")]
    Weekly,
    #[serde(rename = "OFF")]
    Off,
}

impl AutoCleanup {
    /// 计算删除截止时刻；Off 返回 None
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AutoCleanup::Daily => Some(now - Duration::days(1)),
            AutoCleanup::Weekly => Some(now - Duration::days(7)),
            AutoCleanup::Off => None,
        }
    }
}

impl std::str::FromStr for AutoCleanup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(AutoCleanup::Daily),
            "WEEKLY" => Ok(AutoCleanup::Weekly),
            "OFF" => Ok(AutoCleanup::Off),
            other => Err(format!("unknown cleanup type: {}", other)),
        }
    }
}

/// 应用设置快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// 总开关
    pub enabled: bool,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
    pub telegram_enabled: bool,
    /// 去重窗口（小时），0 表示关闭去重
    pub dedup_hours: u32,
    pub auto_cleanup: AutoCleanup,
    pub language: Language,
    /// 各通话类型的消息模板覆盖，空串表示使用内置默认
    pub templates: TemplateSet,
    pub whatsapp_api_key: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    /// 短信网关命令路径
    pub sms_cmd: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sms_enabled: true,
            whatsapp_enabled: false,
            telegram_enabled: false,
            dedup_hours: 24,
            auto_cleanup: AutoCleanup::Daily,
            language: Language::English,
            templates: TemplateSet::default(),
            whatsapp_api_key: String::new(),
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            sms_cmd: String::new(),
        }
    }
}

impl NotificationSettings {
    /// 渠道是否启用
    pub fn is_channel_enabled(&self, kind: ChannelKind) -> bool {
        match kind {
            ChannelKind::Sms => self.sms_enabled,
            ChannelKind::WhatsApp => self.whatsapp_enabled,
            ChannelKind::Telegram => self.telegram_enabled,
        }
    }

    /// 启用的渠道集合（按调度优先级排列）
    pub fn channels_enabled(&self) -> Vec<ChannelKind> {
        [ChannelKind::WhatsApp, ChannelKind::Sms, ChannelKind::Telegram]
            .into_iter()
            .filter(|kind| self.is_channel_enabled(*kind))
            .collect()
    }

    /// 按键名更新单个设置项（CLI `settings set` 用）
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "enabled" => self.enabled = parse_bool(value)?,
            "sms_enabled" => self.sms_enabled = parse_bool(value)?,
            "whatsapp_enabled" => self.whatsapp_enabled = parse_bool(value)?,
            "telegram_enabled" => self.telegram_enabled = parse_bool(value)?,
            "dedup_hours" => {
                self.dedup_hours = value.parse().context("dedup_hours must be a number")?
            }
            "auto_cleanup" => {
                self.auto_cleanup = value.parse().map_err(|e: String| anyhow::anyhow!(e))?
            }
            "language" => self.language = value.parse().map_err(|e: String| anyhow::anyhow!(e))?,
            "message_incoming" => self.templates.incoming = value.to_string(),
            "message_outgoing" => self.templates.outgoing = value.to_string(),
            "message_missed" => self.templates.missed = value.to_string(),
            "whatsapp_api_key" => self.whatsapp_api_key = value.to_string(),
            "telegram_bot_token" => self.telegram_bot_token = value.to_string(),
            "telegram_chat_id" => self.telegram_chat_id = value.to_string(),
            "sms_cmd" => self.sms_cmd = value.to_string(),
            other => anyhow::bail!("unknown settings key: {}", other),
        }
        Ok(())
    }
}

/// 设置存储
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// 默认存储路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("autoconnect-sms")
            .join("settings.json")
    }

    pub fn new() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取设置快照；文件不存在时返回默认值
    pub fn load(&self) -> Result<NotificationSettings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Settings file missing, using defaults");
            return Ok(NotificationSettings::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", self.path.display()))
    }

    /// 保存设置
    pub fn save(&self, settings: &NotificationSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        other => anyhow::bail!("expected a boolean, got: {}", other),
    }
}
