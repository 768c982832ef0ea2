//! CLI: 命令行接口和参数解析模块
//!
//! ## 支持的命令
//!
//! - 基本传输：`transer <source> <destination>`
//! - 编辑配置：`transer -e`
//! - 指定配置：`transer -c config.toml <source> <destination>`
//! - 分片大小：`transer -p 4096 <source> <destination>`
//! - 断点续传：`transer --resume-from 1048576 <source> <destination>`
//!
//! ## 平台支持
//!
//! - Windows: `%APPDATA%/transer/transer.toml`
//! - macOS: `~/Library/Application Support/transer/transer.toml`
//! - Linux: `~/.config/transer/transer.toml`

use clap::Parser;
use std::env;
use crate::config::Config;
use crate::core::error::TransferError;
use crate::utils::validator;

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/transer/transer.toml", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/transer/transer.toml", home)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/transer/transer.toml", home)
    }
}

/// 打开配置文件编辑器
pub fn open_config_in_editor(config_path: &str) {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("notepad").arg(config_path).status().ok();
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg("-e").arg(config_path).status().ok();
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // 优先 xdg-open，否则 nano
        if std::process::Command::new("xdg-open").arg(config_path).status().is_err() {
            let _ = std::process::Command::new("nano").arg(config_path).status();
        }
    }
}

/// transer 命令行参数
///
/// 示例用法：
///   transer ./big.iso /mnt/backup/big.iso
///   transer -e  # 编辑配置文件
///   transer -p 4096 --inline ./a.bin ./b.bin
#[derive(Parser, Debug, Clone)]
#[command(
    name = "transer",
    version = env!("CARGO_PKG_VERSION"),
    about = "可暂停、可续传的分片传输工具",
    long_about = "按分片传输文件，支持暂停、恢复、停止和从已确认的偏移续传。\n\n传输过程中按 p 暂停, r 恢复, s 停止, q 退出。\n"
)]
pub struct Args {
    /// 数据源路径
    #[arg(required_unless_present = "edit_config")]
    pub source: Option<String>,

    /// 目标路径
    #[arg(required_unless_present = "edit_config")]
    pub destination: Option<String>,

    /// 配置文件路径，默认为平台推荐路径
    #[arg(short = 'c', long, default_value_t = default_config_path())]
    pub config: String,

    /// 用系统默认编辑器打开配置文件并退出
    #[arg(short = 'e', long = "edit")]
    pub edit_config: bool,

    /// 分片大小（字节），覆盖配置文件中的设置
    #[arg(short = 'p', long)]
    pub piece_size: Option<usize>,

    /// 在引擎线程上直接执行传输，不使用工作线程池
    #[arg(long)]
    pub inline: bool,

    /// 将任务标记为上传
    #[arg(long)]
    pub upload: bool,

    /// 已确认的进度（字节），从这里续传
    #[arg(long, default_value_t = 0)]
    pub resume_from: u64,

    /// 输出调试日志
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Result<(Self, Config), TransferError> {
        let args = Args::parse();

        if args.edit_config {
            // 保证编辑器打开的是一个存在的文件
            Config::load(&args.config)?;
            open_config_in_editor(&args.config);
            std::process::exit(0);
        }

        let mut config = Config::load(&args.config)?;
        config.merge_from_args(&args);
        config.validate()?;
        args.validate().map_err(|e| TransferError::ConfigError(e.to_string()))?;

        Ok((args, config))
    }

    fn validate(&self) -> anyhow::Result<()> {
        let source = self.source.as_deref().unwrap_or_default();
        let destination = self.destination.as_deref().unwrap_or_default();
        validator::validate_source(source)?;
        validator::validate_destination(source, destination)?;
        validator::validate_resume_offset(source, self.resume_from)?;
        Ok(())
    }
}
