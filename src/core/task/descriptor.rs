use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use super::state::TaskState;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    Download,
    Upload,
}

/// 任务描述：传输进度与状态的可变记录
///
/// 运行期间描述对象被移交给传输循环独占，运行结束后再交还给引擎，
/// 因此任意时刻只有一个写者。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: TransferKind,
    pub source: String,
    pub destination: String,
    pub(crate) state: TaskState,
    /// 总大小，打开数据源之前可能未知
    pub(crate) length: Option<u64>,
    /// 已确认的持久进度
    pub(crate) complete_length: u64,
    pub(crate) start_offset: u64,
    pub(crate) end_offset: u64,
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub(crate) last_error: Option<String>,
}

impl Task {
    pub fn new(kind: TransferKind, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source: source.into(),
            destination: destination.into(),
            state: TaskState::Idle,
            length: None,
            complete_length: 0,
            start_offset: 0,
            end_offset: 0,
            params: HashMap::new(),
            headers: HashMap::new(),
            last_error: None,
        }
    }

    /// 从已确认的进度恢复（例如调用方自行持久化后重建）
    pub fn with_progress(mut self, complete_length: u64) -> Self {
        self.complete_length = complete_length;
        self.start_offset = complete_length;
        self.end_offset = complete_length;
        self
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub fn complete_length(&self) -> u64 {
        self.complete_length
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 进度百分比，总大小未知时返回 0
    pub fn progress(&self) -> f32 {
        match self.length {
            Some(len) if len > 0 => (self.complete_length as f32 / len as f32) * 100.0,
            _ => 0.0,
        }
    }

    /// 将偏移窗口移到下一片的起点
    pub(crate) fn commit_piece(&mut self) {
        self.complete_length = self.end_offset;
        self.start_offset = self.end_offset;
    }

    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.state = TaskState::Error;
        self.last_error = Some(reason.into());
    }

    /// 清除终态，可选地清空进度
    pub(crate) fn reset(&mut self, clear_progress: bool) {
        self.state = TaskState::Idle;
        self.last_error = None;
        if clear_progress {
            self.length = None;
            self.complete_length = 0;
            self.start_offset = 0;
            self.end_offset = 0;
        }
    }
}
