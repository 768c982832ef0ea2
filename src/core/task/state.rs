use serde::{Serialize, Deserialize};
use std::fmt;

/// 传输任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    Idle,
    Running,
    /// resume 调用 start 之前的过渡标记
    Resuming,
    Paused,
    Stopped,
    Finished,
    Error,
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::Idle
    }
}

impl TaskState {
    /// 正在运行或即将运行
    pub fn is_active(&self) -> bool {
        matches!(self, TaskState::Running | TaskState::Resuming)
    }

    /// 只能由传输循环的最终判定得出，且需 reset 才能离开
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Error)
    }

    pub fn can_start(&self) -> bool {
        !matches!(self, TaskState::Running | TaskState::Finished)
    }

    pub fn can_stop(&self) -> bool {
        !matches!(self, TaskState::Stopped | TaskState::Finished | TaskState::Error)
    }

    pub fn can_pause(&self) -> bool {
        !matches!(
            self,
            TaskState::Paused | TaskState::Finished | TaskState::Stopped | TaskState::Error
        )
    }

    /// 已成功完成的任务需要先 reset，不能借 resume 绕过 start 的检查
    pub fn can_resume(&self) -> bool {
        !self.is_active() && *self != TaskState::Finished
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "IDLE",
            TaskState::Running => "RUNNING",
            TaskState::Resuming => "RESUMING",
            TaskState::Paused => "PAUSED",
            TaskState::Stopped => "STOPPED",
            TaskState::Finished => "FINISHED",
            TaskState::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// 外部可下发的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCommand {
    Start,
    Stop,
    Pause,
    Resume,
}

impl TaskCommand {
    pub const START: i32 = 0;
    pub const STOP: i32 = 1;
    pub const PAUSE: i32 = 2;
    pub const RESUME: i32 = 3;

    /// 原始命令码转换，无法识别的返回 None
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::START => Some(TaskCommand::Start),
            Self::STOP => Some(TaskCommand::Stop),
            Self::PAUSE => Some(TaskCommand::Pause),
            Self::RESUME => Some(TaskCommand::Resume),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            TaskCommand::Start => Self::START,
            TaskCommand::Stop => Self::STOP,
            TaskCommand::Pause => Self::PAUSE,
            TaskCommand::Resume => Self::RESUME,
        }
    }
}
