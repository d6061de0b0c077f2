//! 信号监听 - 从标准输入读取电话信号并自动调度通知
//!
//! 信号经由通道送入单写者工作循环：分类器的会话状态只被这一个
//! 任务修改，乱序并发无从发生。渠道发送是阻塞 I/O，逐次移交给
//! 阻塞线程并顺序等待。

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::notification::DispatchService;
use crate::telephony::{CallEventClassifier, CallSignal};

/// 解析一行信号文本
///
/// 支持的形式：`ring <号码>`、`offhook [号码]`、`outgoing <号码>`、`idle`
pub fn parse_signal(line: &str) -> Option<CallSignal> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next()?.to_lowercase();
    let number = parts.next().map(|s| s.to_string());

    match keyword.as_str() {
        "ring" => Some(CallSignal::Ring { number: number.unwrap_or_default() }),
        "offhook" => Some(CallSignal::OffHook { number }),
        "outgoing" => Some(CallSignal::NewOutgoing { number: number.unwrap_or_default() }),
        "idle" => Some(CallSignal::Idle),
        _ => None,
    }
}

pub async fn handle_watch() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<CallSignal>();

    // 独立线程读取标准输入，逐行解析为信号
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_signal(trimmed) {
                Some(signal) => {
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
                None => warn!(line = %trimmed, "Unrecognized signal line"),
            }
        }
    });

    info!("Watching for call signals on stdin (ring / offhook / outgoing / idle)");

    let service = Arc::new(DispatchService::new());
    let mut classifier = CallEventClassifier::new();

    while let Some(signal) = rx.recv().await {
        debug!(signal = ?signal, "Signal received");

        let Some(outcome) = classifier.handle(signal) else {
            continue;
        };

        info!(
            phone = %outcome.phone_number,
            call_type = %outcome.call_type,
            duration_ms = outcome.duration_ms,
            "Call completed"
        );

        let service = service.clone();
        let results =
            tokio::task::spawn_blocking(move || service.handle_call_ended(&outcome)).await??;

        for result in &results {
            match &result.error_detail {
                None => println!("{} -> {}", result.channel, result.status),
                Some(detail) => println!("{} -> {} ({})", result.channel, result.status, detail),
            }
        }
    }

    Ok(())
}
