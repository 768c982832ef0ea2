use anyhow::Result;
use std::path::Path;

pub fn validate_source(source: &str) -> Result<()> {
    if source.is_empty() {
        anyhow::bail!("数据源路径不能为空");
    }
    if !Path::new(source).is_file() {
        anyhow::bail!("数据源不存在或不是文件: {}", source);
    }
    Ok(())
}

pub fn validate_destination(source: &str, destination: &str) -> Result<()> {
    if destination.is_empty() {
        anyhow::bail!("目标路径不能为空");
    }
    if Path::new(destination).is_dir() {
        anyhow::bail!("目标路径是一个目录: {}", destination);
    }
    if source == destination {
        anyhow::bail!("数据源和目标不能相同");
    }
    Ok(())
}

/// 续传偏移不能超过数据源大小
pub fn validate_resume_offset(source: &str, offset: u64) -> Result<()> {
    let len = std::fs::metadata(source)?.len();
    if offset > len {
        anyhow::bail!("续传偏移 {} 超过数据源大小 {}", offset, len);
    }
    Ok(())
}
