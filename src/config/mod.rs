use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use crate::core::error::TransferError;
use crate::core::task::TransferKind;

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 分片大小（字节）
    pub piece_size: usize,
    /// 是否在工作线程池中执行传输循环，false 时在引擎线程上直接执行
    pub use_worker_pool: bool,
    /// 日志级别：error / warn / info / debug / trace
    pub log_level: String,
    /// 日志文件路径，空字符串表示输出到标准错误
    pub log_file: String,
    /// 传输方向，仅作为任务元数据
    pub kind: TransferKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            piece_size: 64 * 1024,
            use_worker_pool: true,
            log_level: "info".to_string(),
            log_file: String::new(),
            kind: TransferKind::Download,
        }
    }
}

impl Config {
    /// 加载配置文件，不存在或格式错误时写入默认配置
    pub fn load(path: &str) -> Result<Self, TransferError> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            match toml::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    eprintln!("配置文件格式错误: {}，将使用默认配置", e);
                    let config = Config::default();
                    config.save_with_tutorial(path)?;
                    Ok(config)
                }
            }
        } else {
            let config = Config::default();
            config.save_with_tutorial(path)?;
            Ok(config)
        }
    }

    /// 保存带说明的配置文件（唯一写入方法）
    pub fn save_with_tutorial(&self, path: &str) -> Result<(), TransferError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| TransferError::ConfigError(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n{}", Config::generate_tutorial_content(), config_content);
        fs::write(path, full_content)?;
        Ok(())
    }

    fn generate_tutorial_content() -> String {
        r#"# transer 配置文件
# ====================
#
# TOML 格式。命令行参数会覆盖这里的设置，优先级：命令行 > 配置文件 > 默认值
#
# piece_size      每次读写的分片大小（字节），越大吞吐越高，暂停的响应越慢
# use_worker_pool 为 true 时传输在工作线程中进行，暂停/停止可以随时生效；
#                 为 false 时传输在引擎线程上执行，命令要等到本轮结束才会被处理
# log_level       error / warn / info / debug / trace
# log_file        日志文件路径，留空输出到标准错误
# kind            "Download" 或 "Upload"
"#.to_string()
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.piece_size == 0 {
            return Err(TransferError::ConfigError("分片大小必须大于0".to_string()));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(TransferError::ConfigError(format!("无效的日志级别: {}", self.log_level)));
        }
        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        if let Some(piece_size) = args.piece_size {
            self.piece_size = piece_size;
        }
        if args.inline {
            self.use_worker_pool = false;
        }
        if args.upload {
            self.kind = TransferKind::Upload;
        }
        if args.verbose {
            self.log_level = "debug".to_string();
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 分片大小: {} 字节\n\
            - 执行方式: {}\n\
            - 传输方向: {:?}\n\
            - 日志级别: {}\n\
            - 日志文件: {}",
            self.piece_size,
            if self.use_worker_pool { "工作线程池" } else { "引擎线程" },
            self.kind,
            self.log_level,
            if self.log_file.is_empty() { "标准错误" } else { self.log_file.as_str() },
        )
    }
}
