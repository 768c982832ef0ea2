//! 测试用的脚本化协作者和记录型监听者
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use bytes::Bytes;

use crate::core::error::{TaskErrorCode, TransferError, TransferResult};
use crate::core::listener::TaskListener;
use super::descriptor::Task;
use super::piece::PieceHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    Pause,
    Resume,
    Stop,
    Progress(u64),
    Error(TaskErrorCode),
    Finished(u64),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
    window_violations: AtomicUsize,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_offsets(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(offset) => Some(offset),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    pub fn terminal_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Error(_) | Event::Finished(_)))
            .count()
    }

    pub fn window_violations(&self) -> usize {
        self.window_violations.load(Ordering::SeqCst)
    }
}

impl TaskListener for RecordingListener {
    fn on_start(&self, _task: &Task) {
        self.push(Event::Start);
    }

    fn on_pause(&self, _task: &Task) {
        self.push(Event::Pause);
    }

    fn on_resume(&self, _task: &Task) {
        self.push(Event::Resume);
    }

    fn on_stop(&self, _task: &Task) {
        self.push(Event::Stop);
    }

    fn on_piece_progress(&self, task: &Task) {
        if task.start_offset() != task.complete_length() || task.end_offset() != task.complete_length() {
            self.window_violations.fetch_add(1, Ordering::SeqCst);
        }
        self.push(Event::Progress(task.complete_length()));
    }

    fn on_error(&self, code: TaskErrorCode, _task: &Task) {
        self.push(Event::Error(code));
    }

    fn on_finished(&self, task: &Task) {
        self.push(Event::Finished(task.complete_length()));
    }
}

/// 协作者调用计数，可在协作者被移交给引擎后继续观察
#[derive(Default)]
pub struct HandlerStats {
    reads: AtomicUsize,
    written: AtomicUsize,
    opens: AtomicUsize,
    releases: AtomicUsize,
    open_offsets: Mutex<Vec<u64>>,
}

impl HandlerStats {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn open_offsets(&self) -> Vec<u64> {
        self.open_offsets.lock().unwrap().clone()
    }
}

/// 按脚本返回实际读取大小的协作者，`None` 表示读尽
pub struct ScriptedHandler {
    total: u64,
    script: VecDeque<Option<usize>>,
    last_size: Option<usize>,
    pieces: usize,
    stats: Arc<HandlerStats>,
    /// 超过 `free_reads` 次之后，每次读取都要先从闸门收到一个放行信号
    gate: Option<(usize, Receiver<()>)>,
    pub task_ok: bool,
    pub fail_open: bool,
    /// 以下序号均从 1 开始
    pub reject_piece_at: Option<usize>,
    pub fail_write_at: Option<usize>,
    pub fail_read_at: Option<usize>,
    pub panic_read_at: Option<usize>,
    pub panic_release_at: Option<usize>,
}

impl ScriptedHandler {
    pub fn new(total: u64, script: Vec<Option<usize>>) -> Self {
        Self {
            total,
            script: script.into(),
            last_size: None,
            pieces: 0,
            stats: Arc::new(HandlerStats::default()),
            gate: None,
            task_ok: true,
            fail_open: false,
            reject_piece_at: None,
            fail_write_at: None,
            fail_read_at: None,
            panic_read_at: None,
            panic_release_at: None,
        }
    }

    pub fn with_gate(mut self, free_reads: usize, gate: Receiver<()>) -> Self {
        self.gate = Some((free_reads, gate));
        self
    }

    pub fn stats(&self) -> Arc<HandlerStats> {
        self.stats.clone()
    }

    pub fn reads(&self) -> usize {
        self.stats.reads()
    }

    pub fn written(&self) -> usize {
        self.stats.written()
    }

    pub fn opens(&self) -> usize {
        self.stats.opens()
    }

    pub fn releases(&self) -> usize {
        self.stats.releases()
    }

    pub fn open_offsets(&self) -> Vec<u64> {
        self.stats.open_offsets()
    }
}

impl PieceHandler for ScriptedHandler {
    fn open(&mut self, task: &Task) -> TransferResult<()> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.stats.open_offsets.lock().unwrap().push(task.start_offset());
        if self.fail_open {
            return Err(TransferError::OpenFailed("scripted open failure".to_string()));
        }
        Ok(())
    }

    fn read_piece(&mut self, _task: &Task) -> TransferResult<Bytes> {
        let n = self.stats.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((free_reads, gate)) = &self.gate {
            if n > *free_reads && gate.recv().is_err() {
                return Err(TransferError::ReadFailed("gate closed".to_string()));
            }
        }
        if self.fail_read_at == Some(n) {
            return Err(TransferError::ReadFailed("scripted read failure".to_string()));
        }
        if self.panic_read_at == Some(n) {
            panic!("scripted panic at read {}", n);
        }
        self.last_size = self.script.pop_front().flatten();
        // 缓冲区故意比实际数据大
        Ok(Bytes::from(vec![0xAB; self.last_size.unwrap_or(0) + 3]))
    }

    fn piece_real_size(&self) -> Option<usize> {
        self.last_size
    }

    fn write_piece(&mut self, data: &[u8], task: &Task) -> TransferResult<()> {
        self.pieces += 1;
        if self.fail_write_at == Some(self.pieces) {
            return Err(TransferError::WriteFailed("scripted write failure".to_string()));
        }
        assert_eq!(data.len() as u64, task.end_offset() - task.start_offset());
        self.stats.written.fetch_add(data.len(), Ordering::SeqCst);
        Ok(())
    }

    fn is_piece_acceptable(&self) -> bool {
        self.reject_piece_at != Some(self.pieces)
    }

    fn is_task_acceptable(&self) -> bool {
        self.task_ok
    }

    fn total_size(&self) -> Option<u64> {
        Some(self.total)
    }

    fn release(&mut self) {
        let n = self.stats.releases.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_release_at == Some(n) {
            panic!("scripted release panic at {}", n);
        }
    }
}
