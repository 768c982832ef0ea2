use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 协作式取消令牌
///
/// 每次启动/恢复都会创建新的令牌，旧运行持有的令牌只会被置位、不会被清除。
/// 传输循环只在迭代边界检查它。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
