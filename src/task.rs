//! 可调度定时器的词汇表：类型、状态、回调与任务定义。
//! Vocabulary of schedulable timers: kinds, states, callbacks and task
//! definitions.

use std::fmt;
use std::sync::Arc;

/// What a timer does when it expires.
/// 定时器到期时的行为。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fire once, then stay allocated as COMPLETED until deleted or
    /// restarted.
    /// 触发一次，然后作为 COMPLETED 保持分配状态，直到被删除或重新启动。
    OneShot,
    /// Fire every `period` ticks until stopped or deleted.
    /// 每 `period` 个 tick 触发一次，直到被停止或删除。
    Periodic,
}

/// Lifecycle state of one timer slot.
/// 单个定时器槽位的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// The slot is on the free list; no timer lives here.
    /// 槽位在空闲链表上；这里没有定时器。
    Unused,
    /// Configured but not linked into the expiry wheel.
    /// 已配置，但未链接进到期轮。
    Stopped,
    /// Linked into the expiry wheel, waiting for its match tick.
    /// 已链接进到期轮，等待其匹配 tick。
    Running,
    /// A one-shot timer that has fired; still allocated, no longer linked.
    /// 已触发的单次定时器；仍被分配，但不再链接。
    Completed,
}

/// What `stop` does after unlinking the timer.
/// `stop` 在取消链接后要做的事。
#[derive(Debug, Clone)]
pub enum StopOption<A> {
    /// Just stop.
    /// 仅停止。
    None,
    /// Invoke the timer's own callback with its stored argument, on the
    /// calling thread.
    /// 在调用线程上，以定时器自己存储的参数调用其回调。
    Callback,
    /// Invoke the timer's callback with this argument instead of the stored
    /// one, on the calling thread.
    /// 在调用线程上，以这里给出的参数（而非存储的参数）调用定时器的回调。
    CallbackArg(A),
}

/// A shareable expiry callback.
///
/// Callbacks run inline: on the tick task for expiry dispatch, on the
/// caller's thread for `stop`'s callback options. They must be short,
/// must not block, and must not call back into the engine that invoked
/// them.
///
/// 可共享的到期回调。
///
/// 回调是内联执行的：到期分发时在 tick 任务上，`stop` 的回调选项则在调用者
/// 线程上。回调必须简短、不得阻塞，也不得回调进调用它的引擎。
pub struct TimerCallback<A> {
    f: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> TimerCallback<A> {
    /// Wrap a closure as a timer callback.
    /// 将闭包包装为定时器回调。
    pub fn new(f: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Invoke the callback.
    /// 调用该回调。
    pub fn call(&self, arg: A) {
        (self.f)(arg)
    }
}

impl<A> Clone for TimerCallback<A> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<A> fmt::Debug for TimerCallback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerCallback").finish_non_exhaustive()
    }
}

/// Everything the engine needs to schedule one timer.
///
/// `delay` and `period` are in ticks. For a one-shot timer the delay is the
/// single firing delay and the period is ignored; for a periodic timer the
/// period is the cadence and the delay, when nonzero, offsets the first
/// firing.
///
/// 引擎调度一个定时器所需的全部信息。
///
/// `delay` 与 `period` 以 tick 计。单次定时器的 delay 是唯一的触发延迟，
/// period 被忽略；周期定时器的 period 是节奏，delay 非零时会偏移首次触发。
#[derive(Debug, Clone)]
pub struct TimerTask<A> {
    /// One-shot or periodic.
    /// 单次或周期。
    pub kind: TimerKind,
    /// Ticks before the first expiry.
    /// 首次到期前的 tick 数。
    pub delay: u64,
    /// Ticks between successive expiries (periodic only).
    /// 相邻两次到期之间的 tick 数（仅周期定时器）。
    pub period: u64,
    /// Caller-supplied label; the engine never interprets it.
    /// 调用者提供的标签；引擎不会解释它。
    pub name: Arc<str>,
    /// Invoked on every expiry with a clone of `arg`.
    /// 每次到期时以 `arg` 的克隆调用。
    pub callback: TimerCallback<A>,
    /// The opaque argument passed through to the callback.
    /// 透传给回调的不透明参数。
    pub arg: A,
}

impl<A> TimerTask<A> {
    /// A one-shot timer firing `delay` ticks after `start`.
    /// 在 `start` 之后 `delay` 个 tick 触发一次的定时器。
    pub fn one_shot(delay: u64, callback: TimerCallback<A>, arg: A) -> Self {
        Self {
            kind: TimerKind::OneShot,
            delay,
            period: 0,
            name: Arc::from(""),
            callback,
            arg,
        }
    }

    /// A periodic timer firing every `period` ticks, the first time after
    /// `delay` ticks (or after one full period when `delay` is zero).
    ///
    /// 每 `period` 个 tick 触发一次的周期定时器；首次触发在 `delay` 个 tick
    /// 后（`delay` 为零时则在一个完整周期后）。
    pub fn periodic(delay: u64, period: u64, callback: TimerCallback<A>, arg: A) -> Self {
        Self {
            kind: TimerKind::Periodic,
            delay,
            period,
            name: Arc::from(""),
            callback,
            arg,
        }
    }

    /// Attach a label to the timer.
    /// 给定时器附加标签。
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn callback_invokes_closure() {
        let hits = Arc::new(AtomicU32::new(0));
        let hits_clone = hits.clone();
        let cb = TimerCallback::new(move |n: u32| {
            hits_clone.fetch_add(n, Ordering::SeqCst);
        });
        cb.call(2);
        cb.clone().call(3);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn builders_fill_fields() {
        let cb = TimerCallback::new(|_: ()| {});
        let task = TimerTask::periodic(5, 30, cb, ()).named("heartbeat");
        assert_eq!(task.kind, TimerKind::Periodic);
        assert_eq!(task.delay, 5);
        assert_eq!(task.period, 30);
        assert_eq!(&*task.name, "heartbeat");
    }
}
