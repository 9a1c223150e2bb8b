//! 配置管理命令
//!
//! 生成与查看执行配置文件（TOML）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use trajex_sdk::tools::ExecutionConfig;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置
    Init {
        /// 目标文件
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 显示配置（未指定文件时显示默认值）
    Show {
        path: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => {
                init_config(&path, force)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },
            ConfigCommand::Show { path } => {
                print!("{}", show_config(path.as_deref())?);
                Ok(())
            },
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ExecutionConfig::default()
        .save_to_file(path)
        .context("写入配置文件失败")
}

fn show_config(path: Option<&Path>) -> Result<String> {
    let config = match path {
        Some(path) => ExecutionConfig::load_from_file(path)?,
        None => ExecutionConfig::default(),
    };
    config.to_toml_string()
}
