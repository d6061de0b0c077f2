//! AutoConnect SMS CLI
//!
//! 通话结束后自动发送 SMS / WhatsApp / Telegram 通知

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use autoconnect_sms::cli::{handle_cleanup, handle_logs, handle_send, handle_watch, LogsArgs, SendArgs};
use autoconnect_sms::SettingsStore;

#[derive(Parser)]
#[command(name = "acs")]
#[command(about = "AutoConnect SMS - 通话结束后自动发送通知消息")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从标准输入读取电话信号并自动调度通知
    Watch,
    /// 手动触发一次调度（验证配置用）
    Send(SendArgs),
    /// 查看最近的投递日志
    Logs(LogsArgs),
    /// 按设置清理过期日志
    Cleanup {
        /// 清空全部日志
        #[arg(long)]
        all: bool,
    },
    /// 查看或修改设置
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// 显示当前设置
    Show,
    /// 更新单个设置项
    Set {
        /// 设置键名（如 enabled / telegram_bot_token / message_missed）
        key: String,
        /// 新值
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化 tracing 日志系统
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug acs watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autoconnect_sms=info,acs=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch => {
            handle_watch().await?;
        }
        Commands::Send(args) => {
            // 渠道发送是阻塞 I/O，不能留在异步运行时线程上
            tokio::task::spawn_blocking(move || handle_send(args)).await??;
        }
        Commands::Logs(args) => {
            handle_logs(args)?;
        }
        Commands::Cleanup { all } => {
            handle_cleanup(all)?;
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = SettingsStore::new().load()?;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            SettingsAction::Set { key, value } => {
                let store = SettingsStore::new();
                let mut settings = store.load()?;
                settings.set_key(&key, &value)?;
                store.save(&settings)?;
                println!("已更新 {}", key);
            }
        },
    }

    Ok(())
}
