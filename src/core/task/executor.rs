use std::sync::Arc;
use tokio::runtime::Handle;

/// 一次传输循环的执行单元
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// 传输循环的执行上下文
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);

    /// 为 true 时引擎在命令处理函数内直接运行循环并立即收回，不经过 `execute`
    fn is_inline(&self) -> bool {
        false
    }
}

/// 在调用方（引擎 actor）线程上直接执行
pub struct Inline;

impl Executor for Inline {
    fn execute(&self, job: Job) {
        job();
    }

    fn is_inline(&self) -> bool {
        true
    }
}

/// 提交到 tokio 阻塞线程池执行，线程池由调用方提供
pub struct BlockingPool {
    handle: Handle,
}

impl BlockingPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// 使用当前运行时（actix 系统内可用）
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// 不在运行时内时返回 None
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Executor for BlockingPool {
    fn execute(&self, job: Job) {
        // JoinHandle 不需要：循环结束时会主动把结果发回引擎
        drop(self.handle.spawn_blocking(job));
    }
}

pub type SharedExecutor = Arc<dyn Executor>;
