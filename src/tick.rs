//! 滴答通道与滴答任务:滴答的产生、传递与消费。
//! The tick channel and the tick task: how ticks are produced, delivered
//! and consumed.
//!
//! 每个 [`TickEvent`] 恰好代表一个滴答。通道有界,生产侧在消费迟滞时
//! 等待,事件不会被合并或丢弃,滴答计数因此与发出的事件数严格一致。
//! Each [`TickEvent`] stands for exactly one tick. The channel is
//! bounded, the producer waits when the consumer lags, and events are
//! never coalesced or dropped, so the tick count tracks the number of
//! events sent exactly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, trace};

use crate::core::{TimerCore, lock_core};

/// 一个滴答。语义全在它的到达次数里,载荷为空。
/// One tick. The meaning is entirely in how many arrive; the payload is
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent;

/// 滴答任务主循环:收一个滴答,推进一次,派发到期回调。
/// The tick task main loop: receive one tick, advance once, dispatch the
/// expired callbacks.
///
/// 回调在锁释放之后、本任务上同步执行,执行顺序即桶内遍历顺序。一个
/// 停滞的回调会停住后续滴答的消费,生产侧则照常入队。
/// Callbacks run synchronously on this task after the lock is released,
/// in bucket traversal order. A stalled callback stalls consumption of
/// further ticks while the producer keeps queueing them.
pub(crate) async fn run<A: Clone>(
    core: Arc<Mutex<TimerCore<A>>>,
    mut tick_rx: mpsc::Receiver<TickEvent>,
) {
    info!("tick task started");
    while tick_rx.recv().await.is_some() {
        // 守卫在语句结束处释放,回调看不到锁
        let fired = lock_core(&core).advance();
        for timer in fired {
            trace!(handle = %timer.handle, name = %timer.name, "dispatching expiry callback");
            timer.callback.call(timer.arg);
        }
    }
    info!("tick task stopped");
}

/// 以固定间隔向滴答通道投递 [`TickEvent`] 的生产任务。
/// The producer task that feeds [`TickEvent`] into the tick channel at a
/// fixed interval.
///
/// 第一个滴答在整整一个间隔之后发出。通道关闭后任务自行退出。
/// The first tick goes out after one full interval. The task exits on
/// its own once the channel closes.
pub fn spawn_tick_source(
    sender: mpsc::Sender<TickEvent>,
    tick_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(?tick_interval, "tick source started");
        let mut ticks = interval_at(Instant::now() + tick_interval, tick_interval);
        loop {
            ticks.tick().await;
            if sender.send(TickEvent).await.is_err() {
                break;
            }
        }
        debug!("tick source stopped");
    })
}
