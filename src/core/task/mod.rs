//! `task` 模块包含了单个传输任务的全部逻辑
//!
//! 主要包括：
//! - `actor`: `TransferEngine` 的定义与命令分发
//! - `state`: 任务状态 `TaskState` 与命令 `TaskCommand`
//! - `descriptor`: 任务描述 `Task`
//! - `messages`: 发给引擎的消息
//! - `handlers`: 消息处理器
//! - `transfer`: 传输循环与偏移维护
//! - `piece`: 分片读写能力 `PieceHandler`
//! - `executor`: 传输循环的执行上下文
//! - `util`: 工具类，如 `CancelToken`

pub mod actor;
pub mod state;
pub mod descriptor;
pub mod messages;
pub mod handlers;
pub mod transfer;
pub mod piece;
pub mod executor;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

// 导出核心组件，方便外部使用
pub use actor::TransferEngine;
pub use descriptor::{Task, TransferKind};
pub use executor::{BlockingPool, Executor, Inline, Job};
pub use messages::{Command, RawCommand, QueryState, QueryTask, QueryInFlight, SetParams, SetHeaders, Reset};
pub use piece::{PieceHandler, END_OF_SOURCE, piece_size_from_raw};
pub use state::{TaskCommand, TaskState};
pub use transfer::{Run, RunExit};
pub use util::CancelToken;
