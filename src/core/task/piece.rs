use bytes::Bytes;

use crate::core::error::TransferResult;
use super::descriptor::Task;

/// 数据源读尽时的原始哨兵值
pub const END_OF_SOURCE: i64 = -1;

/// 将原始的“实际读取字节数”转换为 `Option<usize>`，哨兵值（任意负数）视为读尽
pub fn piece_size_from_raw(raw: i64) -> Option<usize> {
    if raw <= END_OF_SOURCE {
        None
    } else {
        Some(raw as usize)
    }
}

/// 分片读写能力，由具体的上传/下载策略实现
///
/// 所有钩子都在传输循环所在的执行上下文中被调用。
/// 协作者随引擎 actor 一起存放，需要满足 `Unpin`。
pub trait PieceHandler: Send + Unpin + 'static {
    /// 传输开始前打开源/目标
    fn open(&mut self, task: &Task) -> TransferResult<()>;

    /// 从数据源读取一片，返回的缓冲区长度不代表实际大小
    fn read_piece(&mut self, task: &Task) -> TransferResult<Bytes>;

    /// 最近一次读取的实际字节数，`None` 表示数据源已读尽
    fn piece_real_size(&self) -> Option<usize>;

    /// 写入一片到目标，`task.end_offset - task.start_offset` 为本片实际大小
    fn write_piece(&mut self, data: &[u8], task: &Task) -> TransferResult<()>;

    /// 最近一片是否传输成功
    fn is_piece_acceptable(&self) -> bool;

    /// 整个任务是否传输成功
    fn is_task_acceptable(&self) -> bool;

    /// 源数据总大小，在 `open` 之后查询
    fn total_size(&self) -> Option<u64>;

    /// 释放句柄，每次 start 前和每次循环结束后都会调用
    fn release(&mut self) {}
}

impl<H: PieceHandler + ?Sized> PieceHandler for Box<H> {
    fn open(&mut self, task: &Task) -> TransferResult<()> {
        (**self).open(task)
    }

    fn read_piece(&mut self, task: &Task) -> TransferResult<Bytes> {
        (**self).read_piece(task)
    }

    fn piece_real_size(&self) -> Option<usize> {
        (**self).piece_real_size()
    }

    fn write_piece(&mut self, data: &[u8], task: &Task) -> TransferResult<()> {
        (**self).write_piece(data, task)
    }

    fn is_piece_acceptable(&self) -> bool {
        (**self).is_piece_acceptable()
    }

    fn is_task_acceptable(&self) -> bool {
        (**self).is_task_acceptable()
    }

    fn total_size(&self) -> Option<u64> {
        (**self).total_size()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_size_from_raw() {
        assert_eq!(piece_size_from_raw(END_OF_SOURCE), None);
        assert_eq!(piece_size_from_raw(0), Some(0));
        assert_eq!(piece_size_from_raw(4096), Some(4096));
    }
}
