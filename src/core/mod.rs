//! Core: 传输引擎、命令状态机、传输循环与错误处理等核心逻辑模块

pub mod error;
pub mod listener;
pub mod task;

pub use error::{TaskErrorCode, TransferError, TransferResult};
pub use listener::{LogListener, NoopListener, SharedListener, TaskListener};
pub use task::{
    Command, PieceHandler, Task, TaskCommand, TaskState, TransferEngine, TransferKind
};
