//! 数据模型 - 通话结果与投递记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 通话类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    #[serde(rename = "INCOMING")]
    Incoming,
    #[serde(rename = "OUTGOING")]
    Outgoing,
    #[serde(rename = "MISSED")]
    Missed,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Incoming => "INCOMING",
            CallType::Outgoing => "OUTGOING",
            CallType::Missed => "MISSED",
            CallType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INCOMING" => Ok(CallType::Incoming),
            "OUTGOING" => Ok(CallType::Outgoing),
            "MISSED" => Ok(CallType::Missed),
            "UNKNOWN" => Ok(CallType::Unknown),
            other => Err(format!("unknown call type: {}", other)),
        }
    }
}

/// 消息渠道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    #[serde(rename = "SMS")]
    Sms,
    #[serde(rename = "WHATSAPP")]
    WhatsApp,
    #[serde(rename = "TELEGRAM")]
    Telegram,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Sms => "SMS",
            ChannelKind::WhatsApp => "WHATSAPP",
            ChannelKind::Telegram => "TELEGRAM",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 投递状态
///
/// `Pending` 仅为兼容旧日志格式保留，调度流程只会产生 Success / Failed。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "PENDING")]
    Pending,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Success => "SUCCESS",
            DeliveryStatus::Failed => "FAILED",
            DeliveryStatus::Pending => "PENDING",
        };
        write!(f, "{}", s)
    }
}

/// 消息语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ENGLISH")]
    English,
    #[serde(rename = "PERSIAN")]
    Persian,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENGLISH" | "EN" => Ok(Language::English),
            "PERSIAN" | "FA" => Ok(Language::Persian),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

/// 一次通话周期结束后的分类结果
///
/// 每个完整通话周期恰好产生一条，创建后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// 对端号码（无法获取时为空串，类型为 UNKNOWN）
    pub phone_number: String,
    /// 通话类型
    pub call_type: CallType,
    /// 通话结束时刻
    pub ended_at: DateTime<Utc>,
    /// 通话时长（毫秒，从第一个进入信号起算）
    pub duration_ms: u64,
}

/// 单渠道投递结果
///
/// 每个启用渠道每次调度最多产生一条；由调用方落盘，调度器本身不持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub phone_number: String,
    pub call_type: CallType,
    pub channel: ChannelKind,
    pub occurred_at: DateTime<Utc>,
    pub message: String,
    pub status: DeliveryStatus,
    /// 失败原因（HTTP 状态 + body，或传输层错误描述）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

/// 校验号码是否大致符合 E.164 形式（允许空格、连字符、括号）
pub fn is_valid_phone_number(number: &str) -> bool {
    let normalized: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    // 每次编译正则足够用，这里不追求性能
    match regex::Regex::new(r"^\+?[0-9]{5,15}$") {
        Ok(re) => re.is_match(&normalized),
        Err(_) => false,
    }
}

impl DeliveryResult {
    /// 创建成功结果
    pub fn success(
        phone_number: impl Into<String>,
        call_type: CallType,
        channel: ChannelKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            call_type,
            channel,
            occurred_at: Utc::now(),
            message: message.into(),
            status: DeliveryStatus::Success,
            error_detail: None,
        }
    }

    /// 创建失败结果
    pub fn failed(
        phone_number: impl Into<String>,
        call_type: CallType,
        channel: ChannelKind,
        message: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            call_type,
            channel,
            occurred_at: Utc::now(),
            message: message.into(),
            status: DeliveryStatus::Failed,
            error_detail: Some(error_detail.into()),
        }
    }
}
