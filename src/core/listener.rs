//! Listener: 任务生命周期与错误通知
//!
//! ## 投递保证
//!
//! - 传输循环内的通知（分片进度、完成、错误）在循环所在的执行上下文中调用；
//!   命令相关的通知（开始、暂停、恢复、停止）在引擎 actor 线程上调用。
//! - 每次运行最多一个终态事件（`on_finished` 或 `on_error`），
//!   以及任意数量按循环顺序到达的 `on_piece_progress`。
//! - 配置了工作线程池时，`on_resume` 与循环真正开始之间没有先后保证，
//!   两者是竞争关系而不是顺序关系。

use std::sync::Arc;
use log::{debug, error, info};

use crate::core::error::TaskErrorCode;
use crate::core::task::Task;

/// 任务监听者，所有方法默认为空实现
pub trait TaskListener: Send + Sync {
    fn on_start(&self, _task: &Task) {}
    fn on_pause(&self, _task: &Task) {}
    fn on_resume(&self, _task: &Task) {}
    fn on_stop(&self, _task: &Task) {}
    fn on_piece_progress(&self, _task: &Task) {}
    fn on_error(&self, _code: TaskErrorCode, _task: &Task) {}
    fn on_finished(&self, _task: &Task) {}
}

pub type SharedListener = Arc<dyn TaskListener>;

/// 不做任何事的监听者
pub struct NoopListener;

impl TaskListener for NoopListener {}

/// 将所有事件写入日志的监听者
pub struct LogListener;

impl TaskListener for LogListener {
    fn on_start(&self, task: &Task) {
        info!("任务 {} 开始, 已完成 {} 字节", task.id, task.complete_length());
    }

    fn on_pause(&self, task: &Task) {
        info!("任务 {} 暂停", task.id);
    }

    fn on_resume(&self, task: &Task) {
        info!("任务 {} 恢复", task.id);
    }

    fn on_stop(&self, task: &Task) {
        info!("任务 {} 停止", task.id);
    }

    fn on_piece_progress(&self, task: &Task) {
        debug!("任务 {} 进度 {:.1}%", task.id, task.progress());
    }

    fn on_error(&self, code: TaskErrorCode, task: &Task) {
        error!("任务 {} 失败: {}({}) {}", task.id, code, code.code(), task.last_error().unwrap_or(""));
    }

    fn on_finished(&self, task: &Task) {
        info!("任务 {} 完成, 共 {} 字节", task.id, task.complete_length());
    }
}
