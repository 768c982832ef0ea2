use chrono::Local; // 用于获取本地时间
use log::LevelFilter; // 用于设置日志级别
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// 日志文件超过这个大小时在启动时轮转
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// 格式化一条日志
pub fn format_line(level: log::Level, message: &std::fmt::Arguments) -> String {
    format!("{} [{}] - {}", Local::now().format("%Y-%m-%d %H:%M:%S"), level, message)
}

/// 超过上限的日志文件重命名为 `.backup`，旧的备份被覆盖
pub fn rotate_if_needed(file_path: &str, max_size: u64) -> Result<(), std::io::Error> {
    let path = Path::new(file_path);
    if !path.exists() || std::fs::metadata(path)?.len() <= max_size {
        return Ok(());
    }
    let backup_path = format!("{}.backup", file_path);
    if Path::new(&backup_path).exists() {
        std::fs::remove_file(&backup_path)?;
    }
    std::fs::rename(file_path, &backup_path)
}

/// 初始化全局日志
///
/// `log_file` 为空时输出到标准错误，否则追加写入该文件。
/// 环境变量 `RUST_LOG` 优先于 `level`。
pub fn init_logger(level: LevelFilter, log_file: &str) -> Result<(), std::io::Error> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", format_line(record.level(), record.args())));

    if !log_file.is_empty() {
        if let Some(parent) = Path::new(log_file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        rotate_if_needed(log_file, MAX_LOG_SIZE)?;
        let file = OpenOptions::new().create(true).append(true).open(log_file)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    // 重复初始化时保留已有的 logger
    let _ = builder.try_init();
    Ok(())
}
