use actix::Message;
use std::collections::HashMap;

use crate::core::error::TransferError;
use super::descriptor::Task;
use super::piece::PieceHandler;
use super::state::{TaskCommand, TaskState};
use super::transfer::{Run, RunExit};

/// 下发命令，返回处理后的状态
pub struct Command(pub TaskCommand);
impl Message for Command { type Result = TaskState; }

/// 以原始命令码下发，无法识别的命令被忽略并返回 None
pub struct RawCommand(pub i32);
impl Message for RawCommand { type Result = Option<TaskState>; }

/// 查询任务状态
pub struct QueryState;
impl Message for QueryState { type Result = TaskState; }

/// 查询任务描述快照
///
/// 运行期间返回的是最近一次移交时的偏移量，状态为引擎当前状态。
pub struct QueryTask;
impl Message for QueryTask { type Result = Task; }

/// 查询是否有一轮传输循环正持有任务描述
pub struct QueryInFlight;
impl Message for QueryInFlight { type Result = bool; }

/// 替换参数表，只能在两次运行之间修改
pub struct SetParams(pub HashMap<String, String>);
impl Message for SetParams { type Result = Result<(), TransferError>; }

/// 替换头部表，只能在两次运行之间修改
pub struct SetHeaders(pub HashMap<String, String>);
impl Message for SetHeaders { type Result = Result<(), TransferError>; }

/// 清除终态回到 Idle
pub struct Reset {
    pub clear_progress: bool,
}
impl Message for Reset { type Result = Result<(), TransferError>; }

/// 内部：传输循环结束，交还任务描述与协作者
pub struct RunExited<H: PieceHandler> {
    pub run: Run<H>,
    pub exit: RunExit,
}
impl<H: PieceHandler> Message for RunExited<H> { type Result = (); }
