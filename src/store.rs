//! 通话日志存储 - 本地 JSONL 文件读写
//!
//! 每条投递结果一行 JSON，追加和重写都在 fs2 排他锁内进行。
//! 存储实例持有自己的路径，测试可以指向临时目录。

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use tracing::debug;

use crate::model::{CallType, DeliveryResult, DeliveryStatus};
use crate::notification::dedup::HistoryLookup;

/// 结果落盘接口 - 调度返回后由调用方逐条追加
///
/// 落盘失败只记日志，绝不当作投递失败处理。
pub trait ResultSink {
    fn append(&self, record: &DeliveryResult) -> Result<()>;
}

/// 通话日志存储
pub struct CallLogStore {
    path: PathBuf,
}

impl CallLogStore {
    /// 默认存储路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("autoconnect-sms")
            .join("call_log.jsonl")
    }

    pub fn new() -> Self {
        Self::at(Self::default_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 追加一条记录（带文件锁）
    pub fn append(&self, record: &DeliveryResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        file.lock_exclusive()?;
        let mut file = file;
        let outcome = writeln!(file, "{}", serde_json::to_string(record)?);
        file.unlock()?;
        outcome?;

        debug!(
            phone = %record.phone_number,
            channel = %record.channel,
            status = %record.status,
            "Delivery result persisted"
        );
        Ok(())
    }

    /// 读取全部记录；文件缺失返回空，坏行跳过
    pub fn read_all(&self) -> Vec<DeliveryResult> {
        if !self.path.exists() {
            return Vec::new();
        }

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };

        let reader = BufReader::new(file);
        reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect()
    }

    /// 读取最近 N 条（按时间排序）
    pub fn read_recent(&self, n: usize) -> Vec<DeliveryResult> {
        let mut records = self.read_all();
        records.sort_by_key(|r| r.occurred_at);
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    /// 按通话类型筛选
    pub fn read_by_type(&self, call_type: CallType) -> Vec<DeliveryResult> {
        self.read_all()
            .into_iter()
            .filter(|r| r.call_type == call_type)
            .collect()
    }

    /// 统计 since 之后发往某号码的记录数（去重查询用）
    pub fn count_since(&self, phone_number: &str, since: DateTime<Utc>) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open call log {}", self.path.display()))?;

        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str::<DeliveryResult>(&line).ok())
            .filter(|r| r.phone_number == phone_number && r.occurred_at > since)
            .count();

        Ok(count as u64)
    }

    /// 统计时间区间内某状态的记录数
    pub fn count_by_status_between(
        &self,
        status: DeliveryStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> u64 {
        self.read_all()
            .iter()
            .filter(|r| r.status == status && r.occurred_at >= start && r.occurred_at <= end)
            .count() as u64
    }

    /// 删除早于 cutoff 的记录，返回删除条数
    pub fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)?;
        file.lock_exclusive()?;

        let reader = BufReader::new(&file);
        let records: Vec<DeliveryResult> = reader
            .lines()
            .filter_map(|line| line.ok())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();

        let total = records.len();
        let to_keep: Vec<&DeliveryResult> =
            records.iter().filter(|r| r.occurred_at >= cutoff).collect();
        let removed = total - to_keep.len();

        if removed == 0 {
            file.unlock()?;
            return Ok(0);
        }

        // 写入临时文件后原子替换
        let temp_path = self.path.with_extension("tmp");
        {
            let mut temp_file = File::create(&temp_path)?;
            for record in &to_keep {
                writeln!(temp_file, "{}", serde_json::to_string(record)?)?;
            }
        }
        fs::rename(&temp_path, &self.path)?;

        file.unlock()?;
        debug!(removed, "Old call log entries removed");
        Ok(removed)
    }

    /// 清空全部记录
    pub fn clear_all(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for CallLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for CallLogStore {
    fn append(&self, record: &DeliveryResult) -> Result<()> {
        CallLogStore::append(self, record)
    }
}

impl HistoryLookup for CallLogStore {
    fn count_since(&self, phone_number: &str, since: DateTime<Utc>) -> Result<u64> {
        CallLogStore::count_since(self, phone_number, since)
    }
}
