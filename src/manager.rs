//! The public face of the timer engine: one handle-based API over the
//! locked core plus the spawned tick task.
//! 定时器引擎的对外门面:基于句柄的统一 API,背后是带锁的核心与派生的
//! 滴答任务。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::core::{TimerCore, lock_core};
use crate::error::Result;
use crate::handle::TimerHandle;
use crate::task::{StopOption, TimerState, TimerTask};
use crate::tick::{TickEvent, spawn_tick_source};

/// A fixed-capacity timer engine instance.
/// 一个固定容量的定时器引擎实例。
///
/// Each instance owns its own pool, expiry index and tick count; several
/// instances coexist without sharing anything. Construction spawns the
/// tick task, so a Tokio runtime must be current.
/// 每个实例独占自己的池、到期索引和滴答计数,多个实例互不共享。构造时
/// 会派生滴答任务,因此必须在 Tokio 运行时内调用。
///
/// `A` is the argument type handed to expiry callbacks, cloned once per
/// fire.
/// `A` 是传给到期回调的参数类型,每次触发克隆一份。
///
/// ## Example
///
/// ```no_run
/// use kestrel_tick::{Config, TimerCallback, TimerManager, TimerTask};
///
/// #[tokio::main]
/// async fn main() -> kestrel_tick::Result<()> {
///     let manager = TimerManager::new(Config::default())?;
///
///     let heartbeat = manager.create(
///         TimerTask::periodic(
///             0,
///             10,
///             TimerCallback::new(|label: &str| println!("{label} expired")),
///             "heartbeat",
///         )
///         .named("heartbeat"),
///     )?;
///     manager.start(heartbeat)?;
///
///     // 以配置的间隔驱动滴答
///     manager.start_tick_source();
///     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
///
///     manager.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct TimerManager<A: Clone + Send + 'static> {
    core: Arc<Mutex<TimerCore<A>>>,
    tick_tx: mpsc::Sender<TickEvent>,
    tick_interval: Duration,
    tick_task: Option<JoinHandle<()>>,
}

impl<A: Clone + Send + 'static> TimerManager<A> {
    /// Validate the configuration, build the engine and spawn its tick
    /// task.
    /// 校验配置,构建引擎并派生滴答任务。
    ///
    /// The tick task only consumes [`TickEvent`]s; nothing advances until
    /// a producer feeds the channel, either [`Self::start_tick_source`]
    /// or a handmade sender from [`Self::tick_sender`].
    /// 滴答任务只负责消费 [`TickEvent`];在 [`Self::start_tick_source`]
    /// 或通过 [`Self::tick_sender`] 自行投递之前,时间不会推进。
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let core = Arc::new(Mutex::new(TimerCore::new(
            config.pool.capacity,
            config.wheel.bucket_count,
        )));
        let (tick_tx, tick_rx) = mpsc::channel(config.tick.event_buffer);
        let tick_task = tokio::spawn(crate::tick::run(core.clone(), tick_rx));
        info!(
            capacity = config.pool.capacity,
            bucket_count = config.wheel.bucket_count,
            tick_interval = ?config.tick.tick_interval,
            "timer engine started"
        );
        Ok(Self {
            core,
            tick_tx,
            tick_interval: config.tick.tick_interval,
            tick_task: Some(tick_task),
        })
    }

    /// The engine with the default configuration.
    /// 默认配置的引擎。
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Claim a pool slot for a task; the timer starts out Stopped.
    /// 为任务领取一个池槽位;定时器以 Stopped 状态开始。
    pub fn create(&self, task: TimerTask<A>) -> Result<TimerHandle> {
        lock_core(&self.core).create(task)
    }

    /// Arm the timer relative to the current tick.
    /// 以当前滴答为基准武装定时器。
    pub fn start(&self, handle: TimerHandle) -> Result<()> {
        lock_core(&self.core).start(handle)
    }

    /// Disarm the timer and move it to Stopped.
    /// 解除定时器武装并置为 Stopped。
    ///
    /// With [`StopOption::Callback`] or [`StopOption::CallbackArg`] the
    /// registered callback runs once, synchronously on the calling
    /// thread, after the internal lock has been released and before this
    /// method returns.
    /// 使用 [`StopOption::Callback`] 或 [`StopOption::CallbackArg`] 时,
    /// 已登记的回调会在内部锁释放后、本方法返回前,在调用线程上同步执行
    /// 一次。
    pub fn stop(&self, handle: TimerHandle, option: StopOption<A>) -> Result<()> {
        let fire = lock_core(&self.core).stop(handle, option)?;
        if let Some((callback, arg)) = fire {
            callback.call(arg);
        }
        Ok(())
    }

    /// Remove the timer whatever its state and return its slot to the
    /// pool. Outstanding handles to it become stale.
    /// 无论处于何种状态都移除该定时器并把槽位还给池。指向它的既有句柄
    /// 随之失效。
    pub fn delete(&self, handle: TimerHandle) -> Result<()> {
        lock_core(&self.core).delete(handle)
    }

    /// The name the task was registered under.
    /// 任务登记时使用的名字。
    pub fn name_of(&self, handle: TimerHandle) -> Result<Arc<str>> {
        lock_core(&self.core).name_of(handle)
    }

    /// Ticks left until the next expiry; zero unless Running. The
    /// difference is modular in u64, like all tick arithmetic.
    /// 距下次到期还差的滴答数;非 Running 状态为零。与所有滴答算术一样,
    /// 差值按 u64 模意义计算。
    pub fn remaining_ticks(&self, handle: TimerHandle) -> Result<u64> {
        lock_core(&self.core).remaining_ticks(handle)
    }

    /// The timer's current lifecycle state.
    /// 定时器当前所处的生命周期状态。
    pub fn state_of(&self, handle: TimerHandle) -> Result<TimerState> {
        lock_core(&self.core).state_of(handle)
    }

    /// Ticks consumed since the engine started.
    /// 引擎启动以来已消费的滴答数。
    pub fn tick(&self) -> u64 {
        lock_core(&self.core).tick()
    }

    pub fn capacity(&self) -> usize {
        lock_core(&self.core).capacity()
    }

    pub fn free_count(&self) -> usize {
        lock_core(&self.core).free_count()
    }

    /// Timers currently Running.
    /// 当前处于 Running 状态的定时器数。
    pub fn active_count(&self) -> usize {
        lock_core(&self.core).active_count()
    }

    /// A sender into the tick channel, for driving the engine by hand or
    /// from a clock of your own.
    /// 通往滴答通道的发送端,用于手动或以自备时钟驱动引擎。
    pub fn tick_sender(&self) -> mpsc::Sender<TickEvent> {
        self.tick_tx.clone()
    }

    /// Spawn a tick source at the configured interval.
    /// 以配置的间隔派生一个滴答源。
    ///
    /// Every call spawns an independent source and their ticks add up;
    /// call it once per engine. The source exits once the engine shuts
    /// down.
    /// 每次调用都会派生一个独立的滴答源,滴答会叠加;一个引擎调用一次即
    /// 可。引擎关停后滴答源自行退出。
    pub fn start_tick_source(&self) -> JoinHandle<()> {
        spawn_tick_source(self.tick_tx.clone(), self.tick_interval)
    }

    /// Stop the tick task and wait for it to finish.
    /// 停止滴答任务并等待其结束。
    ///
    /// Pending ticks still in the channel are discarded; no further
    /// callbacks run after this returns.
    /// 通道里尚未消费的滴答会被丢弃;本方法返回后不再有回调执行。
    pub async fn shutdown(mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
            let _ = task.await;
        }
        info!("timer engine stopped");
    }
}

impl<A: Clone + Send + 'static> Drop for TimerManager<A> {
    fn drop(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}
