//! # Trajex CLI
//!
//! 驱动模拟执行器的命令行工具，用于演示与手动验证取消行为。
//!
//! ```bash
//! # 生成默认配置
//! trajex-cli config init trajex.toml
//!
//! # 沿 800 单位的路径以 100 单位/秒运行；Ctrl-C 取消并打印保持位置
//! trajex-cli simulate --length 800 --rate 100 --speed 50 --config trajex.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, SimulateCommand};

/// Trajex CLI - 轨迹执行命令行工具
#[derive(Parser, Debug)]
#[command(name = "trajex-cli")]
#[command(about = "Drive a simulated trajectory actuator under the cancellation supervisor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 在模拟执行器上运行一条轨迹
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    trajex_sdk::init_logging("trajex=info,trajex_cli=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Simulate { args } => args.execute().await,
    }
}
