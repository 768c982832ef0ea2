use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use bytes::Bytes;
use log::{debug, warn};

use crate::core::error::{TransferError, TransferResult};
use crate::core::task::{piece_size_from_raw, PieceHandler, Task, END_OF_SOURCE};

/// 参数表中覆盖分片大小的键
pub const PIECE_SIZE_PARAM: &str = "piece_size";

/// 本地文件到本地文件的分片传输
///
/// 目标文件在每次 open 时截断到 `start_offset`，未确认的字节不会残留。
pub struct LocalFileTransfer {
    piece_size: usize,
    source: Option<File>,
    sink: Option<File>,
    buffer: Vec<u8>,
    source_len: Option<u64>,
    /// 最近一次读取的字节数，读尽时为 `END_OF_SOURCE`
    last_read: i64,
    last_written: usize,
    expected: usize,
}

impl LocalFileTransfer {
    pub fn new(piece_size: usize) -> Self {
        Self {
            piece_size: piece_size.max(1),
            source: None,
            sink: None,
            buffer: Vec::new(),
            source_len: None,
            last_read: END_OF_SOURCE,
            last_written: 0,
            expected: 0,
        }
    }

    fn effective_piece_size(&self, task: &Task) -> usize {
        task.params
            .get(PIECE_SIZE_PARAM)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(self.piece_size)
    }

    fn sink_len(&self) -> Option<u64> {
        self.sink.as_ref().and_then(|f| f.metadata().ok()).map(|m| m.len())
    }
}

impl PieceHandler for LocalFileTransfer {
    fn open(&mut self, task: &Task) -> TransferResult<()> {
        let mut source = File::open(&task.source)
            .map_err(|e| TransferError::OpenFailed(format!("{}: {}", task.source, e)))?;
        self.source_len = Some(source.metadata()?.len());
        source.seek(SeekFrom::Start(task.start_offset()))?;

        let mut sink = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&task.destination)
            .map_err(|e| TransferError::OpenFailed(format!("{}: {}", task.destination, e)))?;
        sink.set_len(task.start_offset())?;
        sink.seek(SeekFrom::Start(task.start_offset()))?;

        let piece_size = self.effective_piece_size(task);
        self.buffer.resize(piece_size, 0);
        self.source = Some(source);
        self.sink = Some(sink);
        debug!("打开 {} -> {}, 分片大小 {}", task.source, task.destination, piece_size);
        Ok(())
    }

    fn read_piece(&mut self, _task: &Task) -> TransferResult<Bytes> {
        let source = self.source.as_mut()
            .ok_or_else(|| TransferError::ReadFailed("数据源未打开".to_string()))?;

        let mut filled = 0;
        while filled < self.buffer.len() {
            let n = source.read(&mut self.buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.last_read = if filled == 0 { END_OF_SOURCE } else { filled as i64 };
        Ok(Bytes::copy_from_slice(&self.buffer[..filled]))
    }

    fn piece_real_size(&self) -> Option<usize> {
        piece_size_from_raw(self.last_read)
    }

    fn write_piece(&mut self, data: &[u8], task: &Task) -> TransferResult<()> {
        let sink = self.sink.as_mut()
            .ok_or_else(|| TransferError::WriteFailed("目标未打开".to_string()))?;
        sink.write_all(data)?;
        self.last_written = data.len();
        self.expected = (task.end_offset() - task.start_offset()) as usize;
        Ok(())
    }

    fn is_piece_acceptable(&self) -> bool {
        self.last_written == self.expected
    }

    fn is_task_acceptable(&self) -> bool {
        matches!((self.sink_len(), self.source_len), (Some(written), Some(total)) if written == total)
    }

    fn total_size(&self) -> Option<u64> {
        self.source_len
    }

    fn release(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.flush() {
                warn!("刷新目标文件失败: {}", e);
            }
        }
        self.source = None;
        self.last_read = END_OF_SOURCE;
    }
}
