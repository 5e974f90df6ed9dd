//! 配置管理命令
//!
//! 控制参数以 TOML 保存，默认位于 `<config_dir>/biped/control.toml`。

use anyhow::{Context, Result, bail};
use biped_fsm::ControlParameters;
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("biped");
    path.push("control.toml");
    Ok(path)
}

/// 加载控制参数
///
/// - 显式给出路径：文件必须存在
/// - 未给出路径：默认路径存在则加载，否则使用内置默认值
pub fn load_params(path: Option<&Path>) -> Result<(ControlParameters, Option<PathBuf>)> {
    if let Some(path) = path {
        let params = ControlParameters::load_from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?;
        return Ok((params, Some(path.to_path_buf())));
    }

    let default_path = default_config_path()?;
    if default_path.exists() {
        let params = ControlParameters::load_from_file(&default_path)
            .with_context(|| format!("加载配置失败: {}", default_path.display()))?;
        Ok((params, Some(default_path)))
    } else {
        Ok((ControlParameters::default(), None))
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的控制参数
    Show {
        /// 配置文件路径（默认：用户配置目录）
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 写出默认控制参数
    Init {
        /// 目标路径（默认：用户配置目录）
        path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show { config } => Self::show(config.as_deref()),
            ConfigCommand::Init { path, force } => {
                let path = match path {
                    Some(path) => path,
                    None => default_config_path()?,
                };
                init_config(&path, force)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },
        }
    }

    fn show(path: Option<&Path>) -> Result<()> {
        let (params, source) = load_params(path)?;
        match source {
            Some(path) => println!("# 来源: {}", path.display()),
            None => println!("# 来源: 内置默认值"),
        }
        print!("{}", params.to_toml_string()?);
        Ok(())
    }
}

/// 写出默认配置文件
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("创建配置目录失败")?;
    }
    ControlParameters::default().save_to_file(path)?;
    Ok(())
}
