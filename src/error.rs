//! 定义了定时器引擎中所有可能的错误类型。
//! Defines all possible error types in the timer engine.

use thiserror::Error;

/// The primary error type for the timer engine.
/// 定时器引擎的主要错误类型。
///
/// Success is expressed as `Ok`; every other outcome of the control API is
/// one of these variants.
///
/// 成功以 `Ok` 表示；控制 API 的所有其他结果都是这里的某个变体。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The handle's slot index does not refer to any slot in the pool arena.
    /// 句柄的槽位索引没有指向池中的任何槽位。
    #[error("handle does not refer to a pool slot")]
    InvalidHandle,

    /// The handle's generation does not match the slot it points at: the slot
    /// has been recycled since this handle was issued.
    /// 句柄的代数与它指向的槽位不匹配：该槽位在句柄签发后已被回收。
    #[error("stale handle: the slot has been recycled")]
    InvalidType,

    /// A mode flag was not one of the accepted variants.
    /// 模式标志不是可接受的变体之一。
    #[error("invalid option")]
    InvalidOption,

    /// The delay/period combination is not valid for the requested timer
    /// kind: a one-shot timer needs `delay > 0`, a periodic timer needs
    /// `period > 0`.
    ///
    /// 延迟/周期组合对所请求的定时器类型无效：单次定时器需要
    /// `delay > 0`，周期定时器需要 `period > 0`。
    #[error("invalid delay or period for this timer kind")]
    InvalidDelay,

    /// The pool has no free timer slots left. This is a recoverable
    /// condition: deleting any timer makes a slot available again.
    ///
    /// 池中已没有空闲的定时器槽位。这是可恢复的情况：删除任意一个
    /// 定时器即可再次腾出槽位。
    #[error("no timer available in the pool")]
    NoTimerAvailable,

    /// The timer behind this handle has been deleted and its slot has not
    /// been handed out again.
    /// 该句柄对应的定时器已被删除，且其槽位尚未被再次分配。
    #[error("timer is inactive")]
    Inactive,

    /// The timer is in a state the operation does not accept.
    /// 定时器处于该操作不接受的状态。
    #[error("timer is in an invalid state for this operation")]
    InvalidState,

    /// `stop` was called on a timer that is already stopped.
    /// 对已停止的定时器再次调用了 `stop`。
    #[error("timer is already stopped")]
    AlreadyStopped,

    /// The engine could not be constructed with the given configuration.
    /// 无法使用给定的配置构建引擎。
    #[error("timer pool construction failed: {0}")]
    PoolAllocationFailed(String),
}

/// A specialized `Result` type for the timer engine.
/// 定时器引擎专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, TimerError>;
