use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use log::{debug, error, info, warn};

use crate::core::error::{TaskErrorCode, TransferError, TransferResult};
use crate::core::listener::TaskListener;
use super::descriptor::Task;
use super::piece::PieceHandler;
use super::state::TaskState;
use super::util::CancelToken;

/// 一次运行所需的全部独占数据，在引擎与传输循环之间整体移交
pub struct Run<H> {
    pub task: Task,
    pub handler: H,
}

/// 一次运行的结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Finished,
    TaskRejected,
    PieceRejected,
    Failed,
    /// 被外部 stop/pause 取消，不做整体判定
    Cancelled,
}

impl RunExit {
    /// 是否已经发出终态通知
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunExit::Cancelled)
    }
}

/// 循环体退出的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    EndOfSource,
    PieceRejected,
    Cancelled,
}

/// 作用域结束（含 panic 展开）时释放协作者资源
struct ReleaseGuard<'a, H: PieceHandler>(&'a mut H);

impl<H: PieceHandler> Deref for ReleaseGuard<'_, H> {
    type Target = H;
    fn deref(&self) -> &H {
        self.0
    }
}

impl<H: PieceHandler> DerefMut for ReleaseGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.0
    }
}

impl<H: PieceHandler> Drop for ReleaseGuard<'_, H> {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// 执行一次完整的传输循环，并保证恰好一次终态通知（被取消时没有终态通知）
pub fn run_transfer<H: PieceHandler>(
    run: &mut Run<H>,
    token: &CancelToken,
    listener: &dyn TaskListener,
) -> RunExit {
    let Run { task, handler } = run;

    let result = panic::catch_unwind(AssertUnwindSafe(|| drive(task, handler, token, listener)))
        .unwrap_or_else(|payload| Err(TransferError::Panicked(panic_message(payload.as_ref()))));

    match result {
        Ok(RunExit::Finished) => {
            task.state = TaskState::Finished;
            info!("任务 {} 传输完成, 共 {} 字节", task.id, task.complete_length);
            notify_terminal(|| listener.on_finished(task));
            RunExit::Finished
        }
        Ok(RunExit::TaskRejected) => {
            task.fail(format!(
                "整体校验失败: 已完成 {} 字节, 总长度 {:?}",
                task.complete_length, task.length
            ));
            warn!("任务 {} 整体校验失败", task.id);
            notify_terminal(|| listener.on_error(TaskErrorCode::TaskError, task));
            RunExit::TaskRejected
        }
        Ok(RunExit::PieceRejected) => {
            task.fail(format!("分片校验失败: 结束偏移 {}", task.end_offset));
            warn!("任务 {} 分片校验失败, 结束偏移 {}", task.id, task.end_offset);
            notify_terminal(|| listener.on_error(TaskErrorCode::PieceError, task));
            RunExit::PieceRejected
        }
        Ok(other) => {
            debug!("任务 {} 在偏移 {} 处被取消", task.id, task.complete_length);
            other
        }
        Err(e) => {
            error!("任务 {} 意外失败: {}", task.id, e);
            task.fail(e.to_string());
            notify_terminal(|| listener.on_error(TaskErrorCode::UnexpectedFailure, task));
            RunExit::Failed
        }
    }
}

/// 在释放守卫内完成循环与整体判定
fn drive<H: PieceHandler>(
    task: &mut Task,
    handler: &mut H,
    token: &CancelToken,
    listener: &dyn TaskListener,
) -> TransferResult<RunExit> {
    let mut handler = ReleaseGuard(handler);

    let exit = match transfer_pieces(task, &mut *handler, token, listener)? {
        LoopEnd::EndOfSource if handler.is_task_acceptable() => RunExit::Finished,
        LoopEnd::EndOfSource => RunExit::TaskRejected,
        LoopEnd::PieceRejected => RunExit::PieceRejected,
        LoopEnd::Cancelled => RunExit::Cancelled,
    };
    Ok(exit)
}

fn transfer_pieces<H: PieceHandler>(
    task: &mut Task,
    handler: &mut H,
    token: &CancelToken,
    listener: &dyn TaskListener,
) -> TransferResult<LoopEnd> {
    // 每次开始都从已确认的进度续传
    task.start_offset = task.complete_length;
    handler.open(task)?;
    task.length = handler.total_size();

    if let Some(length) = task.length {
        if task.complete_length > length {
            return Err(TransferError::Overrun { end_offset: task.complete_length, length });
        }
    }
    info!(
        "任务 {} 开始传输: length = {:?}, completeLength = {}, startOffset = {}, endOffset = {}",
        task.id, task.length, task.complete_length, task.start_offset, task.end_offset
    );

    while !token.is_cancelled() {
        let data = handler.read_piece(task)?;
        let real_size = match handler.piece_real_size() {
            Some(size) => size,
            None => return Ok(LoopEnd::EndOfSource),
        };

        let end_offset = task.start_offset + real_size as u64;
        if let Some(length) = task.length {
            if end_offset > length {
                return Err(TransferError::Overrun { end_offset, length });
            }
        }
        task.end_offset = end_offset;

        let payload = data.slice(..real_size.min(data.len()));
        handler.write_piece(&payload, task)?;
        task.commit_piece();
        debug!(
            "任务 {}: completeLength = {}, startOffset = {}, endOffset = {}",
            task.id, task.complete_length, task.start_offset, task.end_offset
        );

        if !handler.is_piece_acceptable() {
            return Ok(LoopEnd::PieceRejected);
        }
        listener.on_piece_progress(task);
    }

    Ok(LoopEnd::Cancelled)
}

/// 终态通知中的 panic 不能让引擎永远收不到运行结束事件
pub(crate) fn notify_terminal(f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!("监听者处理终态通知时 panic: {}", panic_message(payload.as_ref()));
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "未知 panic".to_string()
    }
}
