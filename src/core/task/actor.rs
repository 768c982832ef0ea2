use actix::prelude::*;
use std::sync::Arc;
use log::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};

use crate::config::Config;
use crate::core::error::{TaskErrorCode, TransferError};
use crate::core::listener::{NoopListener, SharedListener};
use super::descriptor::Task;
use super::executor::{BlockingPool, Inline, SharedExecutor};
use super::messages::RunExited;
use super::piece::PieceHandler;
use super::state::{TaskCommand, TaskState};
use super::transfer::{notify_terminal, panic_message, run_transfer, Run, RunExit};
use super::util::CancelToken;

/// 传输引擎 Actor
///
/// 所有命令和“运行结束”事件都经过同一个邮箱，按全序处理。
/// 任务描述与协作者在启动时整体移交给传输循环，结束时通过 `RunExited` 交还；
/// 移交期间引擎只保留一份快照用于通知和查询。
pub struct TransferEngine<H: PieceHandler> {
    /// 两次运行之间由引擎持有
    pub(crate) run: Option<Run<H>>,
    /// 运行期间的描述快照，状态字段由命令更新
    pub(crate) snapshot: Task,
    /// 当前运行的取消令牌
    pub(crate) token: CancelToken,
    pub(crate) listener: SharedListener,
    pub(crate) executor: SharedExecutor,
    /// 运行尚未交还时收到的 start/resume，值表示是否需要通知 RESUMED
    pub(crate) pending: Option<bool>,
}

impl<H: PieceHandler> Actor for TransferEngine<H> {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        debug!("传输引擎已启动, 任务 {}", self.snapshot.id);
    }
}

impl<H: PieceHandler> TransferEngine<H> {
    /// 默认在引擎线程上直接执行传输循环
    pub fn new(task: Task, handler: H) -> Self {
        Self {
            snapshot: task.clone(),
            run: Some(Run { task, handler }),
            token: CancelToken::new(),
            listener: Arc::new(NoopListener),
            executor: Arc::new(Inline),
            pending: None,
        }
    }

    /// 根据配置选择执行上下文，需要在运行时内调用
    pub fn from_config(task: Task, handler: H, config: &Config) -> Self {
        let engine = Self::new(task, handler);
        if !config.use_worker_pool {
            return engine;
        }
        match BlockingPool::try_current() {
            Some(pool) => engine.with_executor(Arc::new(pool)),
            None => {
                warn!("当前不在运行时内，传输循环将在引擎线程上执行");
                engine
            }
        }
    }

    pub fn with_listener(mut self, listener: SharedListener) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_executor(mut self, executor: SharedExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// 当前可见的任务描述
    pub fn view(&self) -> &Task {
        match &self.run {
            Some(run) => &run.task,
            None => &self.snapshot,
        }
    }

    pub fn state(&self) -> TaskState {
        self.view().state
    }

    fn set_state(&mut self, state: TaskState) {
        match &mut self.run {
            Some(run) => run.task.state = state,
            None => self.snapshot.state = state,
        }
    }

    pub(crate) fn dispatch(&mut self, command: TaskCommand, ctx: &mut Context<Self>) -> TaskState {
        match command {
            TaskCommand::Start => self.start(ctx, false),
            TaskCommand::Stop => self.stop(),
            TaskCommand::Pause => self.pause(),
            TaskCommand::Resume => self.resume(ctx),
        }
        self.state()
    }

    fn start(&mut self, ctx: &mut Context<Self>, resumed: bool) {
        let state = self.state();
        if !state.can_start() {
            warn!("任务 {} 当前状态 {} 不能开始", self.view().id, state);
            return;
        }
        self.launch(ctx, resumed);
    }

    fn stop(&mut self) {
        let state = self.state();
        if !state.can_stop() {
            debug!("任务 {} 已处于 {}，忽略 stop", self.view().id, state);
            return;
        }
        self.token.cancel();
        self.pending = None;
        self.set_state(TaskState::Stopped);
        info!("任务 {} 停止", self.view().id);
        self.listener.on_stop(self.view());
    }

    fn pause(&mut self) {
        let state = self.state();
        if !state.can_pause() {
            debug!("任务 {} 已处于 {}，忽略 pause", self.view().id, state);
            return;
        }
        self.token.cancel();
        self.pending = None;
        self.set_state(TaskState::Paused);
        let task = self.view();
        info!(
            "任务 {} 暂停: length = {:?}, completeLength = {}, startOffset = {}, endOffset = {}",
            task.id, task.length, task.complete_length, task.start_offset, task.end_offset
        );
        self.listener.on_pause(task);
    }

    fn resume(&mut self, ctx: &mut Context<Self>) {
        let state = self.state();
        if !state.can_resume() {
            debug!("任务 {} 已处于 {}，忽略 resume", self.view().id, state);
            return;
        }
        self.set_state(TaskState::Resuming);
        self.start(ctx, true);
    }

    /// 提交一次新的传输循环；描述仍在上一轮循环手中时推迟到其交还之后
    pub(crate) fn launch(&mut self, ctx: &mut Context<Self>, resumed: bool) {
        let Some(mut run) = self.run.take() else {
            debug!("任务 {} 上一轮传输尚未退出，推迟启动", self.snapshot.id);
            self.pending = Some(self.pending.unwrap_or(false) || resumed);
            self.snapshot.state = TaskState::Resuming;
            return;
        };
        self.pending = None;

        // 暂停后保留的句柄可能已经超时，统一释放后由 open 重新获取
        let released = panic::catch_unwind(AssertUnwindSafe(|| run.handler.release()));
        if let Err(payload) = released {
            let reason = panic_message(payload.as_ref());
            error!("任务 {} 释放协作者时 panic: {}", run.task.id, reason);
            run.task.fail(TransferError::Panicked(reason).to_string());
            self.snapshot = run.task.clone();
            let listener = self.listener.clone();
            notify_terminal(|| listener.on_error(TaskErrorCode::UnexpectedFailure, &run.task));
            self.run = Some(run);
            return;
        }
        run.task.state = TaskState::Running;
        run.task.last_error = None;
        self.snapshot = run.task.clone();
        self.token = CancelToken::new();

        info!("任务 {} 开始, 从偏移 {} 续传", self.snapshot.id, self.snapshot.complete_length);
        self.listener.on_start(&self.snapshot);
        if resumed {
            self.listener.on_resume(&self.snapshot);
        }

        if self.executor.is_inline() {
            // 循环已在当前处理函数内结束，立即收回，之后的命令看到的是最终状态
            let exit = run_transfer(&mut run, &self.token, self.listener.as_ref());
            self.reclaim(run, exit, ctx);
            return;
        }

        let token = self.token.clone();
        let listener = self.listener.clone();
        let addr = ctx.address();
        self.executor.execute(Box::new(move || {
            let exit = run_transfer(&mut run, &token, listener.as_ref());
            addr.do_send(RunExited { run, exit });
        }));
    }

    /// 收回运行结束后交还的描述与协作者
    pub(crate) fn reclaim(&mut self, mut run: Run<H>, exit: RunExit, ctx: &mut Context<Self>) {
        let commanded = self.snapshot.state;
        if exit.is_terminal() {
            // 循环已发出终态通知，以循环的结论为准
            if commanded != TaskState::Running {
                info!(
                    "任务 {} 在 {} 生效前已结束为 {}",
                    run.task.id, commanded, run.task.state
                );
            }
            if self.pending.take().is_some() {
                warn!("任务 {} 已结束，放弃推迟的启动", run.task.id);
            }
        } else {
            run.task.state = commanded;
        }
        debug!(
            "任务 {} 运行退出 {:?}, completeLength = {}",
            run.task.id, exit, run.task.complete_length
        );
        self.snapshot = run.task.clone();
        self.run = Some(run);

        if let Some(resumed) = self.pending.take() {
            self.launch(ctx, resumed);
        }
    }
}
