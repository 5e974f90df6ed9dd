//! # Biped CLI
//!
//! 在仿真关节对象上运行双足控制状态机。
//!
//! ```bash
//! # 写出默认配置
//! biped-cli config init
//!
//! # 从 PASSIVE 启动，按脚本切换模式，运行 3000 个周期
//! biped-cli run --startup passive --script demo.script --ticks 3000
//!
//! # 列出模式
//! biped-cli modes
//! ```
//!
//! 日志级别通过 `RUST_LOG` 调整，例如 `RUST_LOG=biped_fsm=debug`。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod script;
mod sim;

use commands::{ConfigCommand, RunCommand};

/// Biped CLI - 双足控制状态机命令行工具
#[derive(Parser, Debug)]
#[command(name = "biped-cli")]
#[command(about = "Run the biped control FSM against a simulated plant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行控制循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出控制模式
    Modes,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("biped_cli=info".parse()?)
                .add_directive("biped_fsm=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
        Commands::Modes => {
            commands::modes::execute();
            Ok(())
        },
    }
}
