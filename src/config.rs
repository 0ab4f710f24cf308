//! 定义了定时器引擎的可配置参数。
//! Defines configurable parameters for the timer engine.

use crate::error::{Result, TimerError};
use std::time::Duration;

/// A structure containing all configurable parameters for one engine
/// instance.
///
/// 包含单个引擎实例所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// Timer pool parameters.
    /// 定时器池参数。
    pub pool: PoolConfig,

    /// Expiry wheel parameters.
    /// 到期轮参数。
    pub wheel: WheelConfig,

    /// Tick delivery parameters.
    /// tick 投递参数。
    pub tick: TickConfig,
}

/// Timer pool parameters.
///
/// 定时器池参数。
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of timer slots. Fixed for the life of the engine: the pool
    /// never grows and never touches the allocator after construction.
    /// 定时器槽位数量。在引擎的整个生命周期内固定：池不会增长，构建之后
    /// 也不再触碰分配器。
    pub capacity: usize,
}

/// Expiry wheel parameters.
///
/// 到期轮参数。
#[derive(Debug, Clone)]
pub struct WheelConfig {
    /// Number of hash buckets. A running timer lives in bucket
    /// `match_tick mod bucket_count`, so this should be sized against the
    /// expected number of concurrent timers and their typical delays.
    /// 哈希桶数量。运行中的定时器位于 `match_tick mod bucket_count` 桶中，
    /// 因此应按预期并发定时器数量及其典型延迟来选择大小。
    pub bucket_count: usize,
}

/// Tick delivery parameters.
///
/// tick 投递参数。
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Nominal interval between tick events when the bundled tick source is
    /// used. This is the length of one logical tick.
    /// 使用自带 tick 源时相邻 tick 事件的名义间隔，即一个逻辑 tick 的长度。
    pub tick_interval: Duration,
    /// Capacity of the tick event channel. Each queued event is exactly one
    /// counter increment, so this bounds how far tick delivery can run ahead
    /// of the tick task.
    /// tick 事件通道的容量。每个排队事件恰好对应一次计数器递增，因此它限定了
    /// tick 投递可以领先 tick 任务多远。
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            wheel: WheelConfig::default(),
            tick: TickConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 32 }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self { bucket_count: 16 }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            event_buffer: 64,
        }
    }
}

impl Config {
    /// Check that an engine can actually be built from these values.
    ///
    /// The engine cannot run with zero timer capacity, zero buckets or a
    /// zero-length tick channel, so those are rejected here, before any
    /// state is constructed.
    ///
    /// 检查这些值是否真的能构建出引擎。
    ///
    /// 引擎无法在零定时器容量、零桶数或零长度 tick 通道下运行，因此这些
    /// 情况在构建任何状态之前就在这里被拒绝。
    pub fn validate(&self) -> Result<()> {
        if self.pool.capacity == 0 {
            return Err(TimerError::PoolAllocationFailed(
                "pool capacity must be at least 1".to_string(),
            ));
        }
        if self.pool.capacity >= u32::MAX as usize {
            return Err(TimerError::PoolAllocationFailed(
                "pool capacity exceeds the addressable slot range".to_string(),
            ));
        }
        if self.wheel.bucket_count == 0 {
            return Err(TimerError::PoolAllocationFailed(
                "bucket count must be at least 1".to_string(),
            ));
        }
        if self.tick.event_buffer == 0 {
            return Err(TimerError::PoolAllocationFailed(
                "tick event buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
