//! 手动触发一次调度（验证配置用）

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::warn;

use crate::model::{is_valid_phone_number, CallOutcome, CallType};
use crate::notification::DispatchService;

#[derive(Args)]
pub struct SendArgs {
    /// 对端号码
    #[arg(long, short)]
    pub number: String,
    /// 通话类型 (incoming/outgoing/missed/unknown)
    #[arg(long, short = 't', default_value = "missed")]
    pub call_type: String,
    /// 通话时长（毫秒）
    #[arg(long, default_value = "0")]
    pub duration_ms: u64,
}

pub fn handle_send(args: SendArgs) -> Result<()> {
    let call_type: CallType = args
        .call_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    if !is_valid_phone_number(&args.number) {
        warn!(number = %args.number, "Phone number does not look like E.164");
    }

    let outcome = CallOutcome {
        phone_number: args.number,
        call_type,
        ended_at: Utc::now(),
        duration_ms: args.duration_ms,
    };

    let service = DispatchService::new();
    let results = service.handle_call_ended(&outcome)?;

    if results.is_empty() {
        println!("没有渠道被调度（总开关关闭或命中去重窗口）");
        return Ok(());
    }

    println!("已尝试 {} 个渠道:", results.len());
    for result in &results {
        match &result.error_detail {
            None => println!("  {} -> {}", result.channel, result.status),
            Some(detail) => println!("  {} -> {} ({})", result.channel, result.status, detail),
        }
    }
    Ok(())
}
