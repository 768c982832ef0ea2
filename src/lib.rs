//! # transer
//!
//! 可暂停、可续传的分片传输引擎。
//!
//! - 显式的生命周期状态机（开始、停止、暂停、恢复）
//! - 按字节偏移维护进度，恢复时不会重复传输已确认的数据
//! - 分片级与任务级的成功/失败判定
//! - 每次运行恰好一次终态通知
//!
//! 具体的数据源/目标由实现了 [`PieceHandler`] 的策略提供。

pub mod cli;
pub mod config;
pub mod core;
pub mod strategy;
pub mod utils;

pub use crate::core::{
    Command, PieceHandler, Task, TaskCommand, TaskErrorCode, TaskListener, TaskState,
    TransferEngine, TransferError, TransferKind,
};
