#![deny(clippy::expect_used, clippy::unwrap_used)]

//! # kestrel-tick
//!
//! A fixed-capacity software timer engine driven by an explicit tick
//! stream.
//! 由显式滴答流驱动的固定容量软件定时器引擎。
//!
//! - **Fixed capacity**: every timer slot is allocated up front; creating
//!   and deleting timers never touches the heap.
//!   **固定容量**:全部定时器槽位预先分配,创建和删除定时器不再经过堆。
//! - **Tick driven**: time is a count of [`TickEvent`]s delivered over a
//!   bounded channel and never coalesced; wall-clock resolution is
//!   whatever the tick source makes it.
//!   **滴答驱动**:时间就是 [`TickEvent`] 的计数,经有界通道传递且从不
//!   合并;墙钟精度由滴答源决定。
//! - **Generational handles**: a recycled slot invalidates old handles
//!   instead of silently aliasing a new timer.
//!   **代数句柄**:槽位复用会使旧句柄失效,而不是悄悄指向新的定时器。
//!
//! ## Quick Start (快速开始)
//!
//! ```no_run
//! use kestrel_tick::{TimerCallback, TimerManager, TimerTask};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> kestrel_tick::Result<()> {
//!     // 引擎与它的滴答任务 (the engine and its tick task)
//!     let manager = TimerManager::with_defaults()?;
//!
//!     // 5 个滴答后触发一次 (fires once, five ticks from start)
//!     let timer = manager.create(
//!         TimerTask::one_shot(
//!             5,
//!             TimerCallback::new(|label: &str| println!("{label} expired")),
//!             "demo",
//!         )
//!         .named("demo"),
//!     )?;
//!     manager.start(timer)?;
//!
//!     // 默认每 100ms 一个滴答 (one tick every 100ms by default)
//!     manager.start_tick_source();
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod manager;
pub mod task;
pub mod tick;

mod core;
mod pool;
mod wheel;

// Re-export public API
pub use config::{Config, PoolConfig, TickConfig, WheelConfig};
pub use error::{Result, TimerError};
pub use handle::TimerHandle;
pub use manager::TimerManager;
pub use task::{StopOption, TimerCallback, TimerKind, TimerState, TimerTask};
pub use tick::{TickEvent, spawn_tick_source};
