use thiserror::Error;
use std::io;
use serde::{Serialize, Deserialize};

/// 传输过程中可能出现的错误
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("IO错误: {0}")]
    IoError(#[from] io::Error),

    #[error("打开数据源失败: {0}")]
    OpenFailed(String),

    #[error("读取分片失败: {0}")]
    ReadFailed(String),

    #[error("写入分片失败: {0}")]
    WriteFailed(String),

    #[error("分片越界: 结束偏移 {end_offset} 超过总长度 {length}")]
    Overrun {
        end_offset: u64,
        length: u64,
    },

    #[error("传输线程异常退出: {0}")]
    Panicked(String),

    #[error("任务正在传输中，无法修改")]
    TaskBusy,

    #[error("配置错误: {0}")]
    ConfigError(String),
}

/// 通知给监听者的错误码（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskErrorCode {
    /// 分片已读写，但未通过协作者的分片校验
    PieceError,
    /// 数据源读完，但整体校验失败
    TaskError,
    /// open/read/write 抛出的任何失败
    UnexpectedFailure,
}

impl TaskErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            TaskErrorCode::PieceError => 1,
            TaskErrorCode::TaskError => 2,
            TaskErrorCode::UnexpectedFailure => 3,
        }
    }
}

impl std::fmt::Display for TaskErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskErrorCode::PieceError => "PIECE_ERROR",
            TaskErrorCode::TaskError => "TASK_ERROR",
            TaskErrorCode::UnexpectedFailure => "UNEXPECTED_FAILURE",
        };
        f.write_str(name)
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
