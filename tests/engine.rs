use actix::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

use transer::config::Config;
use transer::core::task::{QueryInFlight, QueryTask, RawCommand, Reset};
use transer::strategy::LocalFileTransfer;
use transer::{Command, Task, TaskCommand, TaskErrorCode, TaskListener, TaskState, TransferEngine, TransferKind};

#[derive(Default)]
struct Collect {
    offsets: Mutex<Vec<u64>>,
    finished: Mutex<u32>,
    errors: Mutex<Vec<TaskErrorCode>>,
}

impl TaskListener for Collect {
    fn on_piece_progress(&self, task: &Task) {
        self.offsets.lock().unwrap().push(task.complete_length());
    }

    fn on_error(&self, code: TaskErrorCode, _task: &Task) {
        self.errors.lock().unwrap().push(code);
    }

    fn on_finished(&self, _task: &Task) {
        *self.finished.lock().unwrap() += 1;
    }
}

async fn settle(engine: &Addr<TransferEngine<LocalFileTransfer>>) -> Task {
    for _ in 0..1000 {
        if !engine.send(QueryInFlight).await.unwrap() {
            let task = engine.send(QueryTask).await.unwrap();
            if !task.state().is_active() {
                return task;
            }
        }
        actix_rt::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("传输没有结束");
}

#[actix_rt::test]
async fn test_copy_file_through_engine() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let dst = dir.path().join("dst.bin");
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&src, &data).unwrap();

    let config = Config { piece_size: 1024, ..Config::default() };
    let task = Task::new(TransferKind::Download, src.to_string_lossy(), dst.to_string_lossy());
    let listener = Arc::new(Collect::default());
    let engine = TransferEngine::from_config(task, LocalFileTransfer::new(config.piece_size), &config)
        .with_listener(listener.clone())
        .start();

    engine.send(Command(TaskCommand::Start)).await.unwrap();
    let task = settle(&engine).await;

    assert_eq!(task.state(), TaskState::Finished);
    assert_eq!(task.complete_length(), 10_000);
    assert_eq!(std::fs::read(&dst).unwrap(), data);
    assert_eq!(*listener.finished.lock().unwrap(), 1);

    let offsets = listener.offsets.lock().unwrap().clone();
    assert_eq!(offsets.len(), 10);
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(offsets.last(), Some(&10_000));
}

#[actix_rt::test]
async fn test_resume_from_persisted_progress() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.bin");
    let dst = dir.path().join("dst.bin");
    std::fs::write(&src, b"hello, pieces!").unwrap();
    std::fs::write(&dst, b"hello").unwrap();

    let task = Task::new(TransferKind::Upload, src.to_string_lossy(), dst.to_string_lossy())
        .with_progress(5);
    let listener = Arc::new(Collect::default());
    let engine = TransferEngine::new(task, LocalFileTransfer::new(4))
        .with_listener(listener.clone())
        .start();

    engine.send(RawCommand(TaskCommand::START)).await.unwrap();
    let task = settle(&engine).await;

    assert_eq!(task.state(), TaskState::Finished);
    assert_eq!(*listener.offsets.lock().unwrap(), vec![9, 13, 14]);
    assert_eq!(std::fs::read(&dst).unwrap(), b"hello, pieces!");
}

#[actix_rt::test]
async fn test_missing_source_reports_unexpected_failure() {
    let dir = tempdir().unwrap();
    let task = Task::new(
        TransferKind::Download,
        dir.path().join("missing.bin").to_string_lossy(),
        dir.path().join("dst.bin").to_string_lossy(),
    );
    let listener = Arc::new(Collect::default());
    let engine = TransferEngine::new(task, LocalFileTransfer::new(4))
        .with_listener(listener.clone())
        .start();

    engine.send(Command(TaskCommand::Start)).await.unwrap();
    let task = settle(&engine).await;

    assert_eq!(task.state(), TaskState::Error);
    assert_eq!(*listener.errors.lock().unwrap(), vec![TaskErrorCode::UnexpectedFailure]);
    assert_eq!(*listener.finished.lock().unwrap(), 0);

    // 修复数据源后可以重新开始
    std::fs::write(dir.path().join("missing.bin"), b"abc").unwrap();
    engine.send(Reset { clear_progress: true }).await.unwrap().unwrap();
    engine.send(Command(TaskCommand::Start)).await.unwrap();
    let task = settle(&engine).await;
    assert_eq!(task.state(), TaskState::Finished);
    assert_eq!(task.complete_length(), 3);
}
