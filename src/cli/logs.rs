//! 投递日志查看与清理

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use crate::model::CallType;
use crate::settings::SettingsStore;
use crate::store::CallLogStore;

#[derive(Args)]
pub struct LogsArgs {
    /// 显示条数
    #[arg(long, short = 'n', default_value = "20")]
    pub count: usize,
    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
    /// 按通话类型筛选 (incoming/outgoing/missed/unknown)
    #[arg(long, short = 't')]
    pub call_type: Option<String>,
}

pub fn handle_logs(args: LogsArgs) -> Result<()> {
    let store = CallLogStore::new();

    let records = match &args.call_type {
        Some(t) => {
            let call_type: CallType = t.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let mut records = store.read_by_type(call_type);
            records.sort_by_key(|r| r.occurred_at);
            let start = records.len().saturating_sub(args.count);
            records[start..].to_vec()
        }
        None => store.read_recent(args.count),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("最近 {} 条投递记录:\n", records.len());
    for record in &records {
        println!(
            "  {} | {} | {} | {} | {}",
            record.occurred_at.format("%Y-%m-%d %H:%M:%S"),
            record.phone_number,
            record.call_type,
            record.channel,
            record.status
        );
        if let Some(detail) = &record.error_detail {
            println!("    错误: {}", detail);
        }
    }
    Ok(())
}

pub fn handle_cleanup(all: bool) -> Result<()> {
    let store = CallLogStore::new();

    if all {
        store.clear_all()?;
        println!("已清空全部日志");
        return Ok(());
    }

    let settings = SettingsStore::new().load()?;
    match settings.auto_cleanup.cutoff(Utc::now()) {
        Some(cutoff) => {
            let removed = store.delete_older_than(cutoff)?;
            println!("已删除 {} 条过期日志", removed);
        }
        None => println!("自动清理已关闭 (auto_cleanup = OFF)"),
    }
    Ok(())
}
