//! 核心状态机:定时器池、到期索引与滴答计数在同一把锁下的组合。
//! The core state machine: the timer pool, the expiry index and the tick
//! counter combined under a single lock.
//!
//! 所有会读写定时器状态的操作都必须先拿到这把锁,包括滴答推进本身。
//! 到期扫描因此与 start/stop/delete 串行化,桶里看到的链接永远是一致的。
//! Every operation that touches timer state must take the lock first,
//! tick advancement included. The expiry scan is thereby serialized with
//! start/stop/delete, and the links seen in a bucket are always
//! consistent.
//!
//! 滴答算术一律按 u64 回绕:匹配滴答与剩余滴答都是模 2^64 意义上的值,
//! 极端的延迟或周期只是把定时器挂到回绕后的匹配滴答上。
//! All tick arithmetic wraps in u64: match ticks and remaining counts are
//! values modulo 2^64, and an extreme delay or period simply parks the
//! timer at its wrapped match tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::error::{Result, TimerError};
use crate::handle::TimerHandle;
use crate::pool::{NIL, TimerPool};
use crate::task::{StopOption, TimerCallback, TimerKind, TimerState, TimerTask};
use crate::wheel::ExpiryWheel;

/// 在锁中毒后仍然取回守卫。
/// Take the guard even after lock poisoning.
///
/// 每个操作要么不改核心数据,要么改完才返回,不存在改到一半的中间态;
/// 中毒只说明某个持锁线程 panic 过,数据本身仍然可用。
/// Each operation either changes nothing or completes before returning;
/// there is no half-written intermediate state. Poisoning only records
/// that a lock holder panicked, the data itself stays usable.
pub(crate) fn lock_core<A>(core: &Mutex<TimerCore<A>>) -> MutexGuard<'_, TimerCore<A>> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 一次滴答推进中到期的定时器,锁外派发所需的内容已全部克隆出来。
/// One timer that expired during a tick advance, with everything needed
/// for dispatch outside the lock already cloned out.
#[derive(Debug)]
pub(crate) struct FiredTimer<A> {
    pub(crate) handle: TimerHandle,
    pub(crate) name: Arc<str>,
    pub(crate) callback: TimerCallback<A>,
    pub(crate) arg: A,
}

/// 定时器引擎的全部可变状态。
/// All mutable state of the timer engine.
#[derive(Debug)]
pub(crate) struct TimerCore<A> {
    pool: TimerPool<A>,
    wheel: ExpiryWheel,
    /// 自引擎启动以来推进过的滴答数。放在锁内,使 start 读到的计数
    /// 与到期扫描严格有序。
    /// Ticks advanced since the engine started. Kept inside the lock so
    /// the count read by start is strictly ordered against expiry scans.
    tick: u64,
}

impl<A: Clone> TimerCore<A> {
    pub(crate) fn new(capacity: usize, bucket_count: usize) -> Self {
        Self {
            pool: TimerPool::new(capacity),
            wheel: ExpiryWheel::new(bucket_count),
            tick: 0,
        }
    }

    pub(crate) fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.pool.free_count()
    }

    /// 当前挂在到期索引上的定时器数,即 Running 状态的定时器数。
    /// Timers currently on the expiry index, which is the number of
    /// Running timers.
    pub(crate) fn active_count(&self) -> usize {
        self.wheel.len()
    }

    /// 校验任务参数,领取一个槽位并以 Stopped 状态登记任务。
    /// Validate the task, claim a slot and register the task in the
    /// Stopped state.
    pub(crate) fn create(&mut self, task: TimerTask<A>) -> Result<TimerHandle> {
        match task.kind {
            TimerKind::OneShot if task.delay == 0 => return Err(TimerError::InvalidDelay),
            TimerKind::Periodic if task.period == 0 => return Err(TimerError::InvalidDelay),
            _ => {}
        }
        let Some(index) = self.pool.allocate() else {
            warn!(capacity = self.pool.capacity(), "timer pool exhausted");
            return Err(TimerError::NoTimerAvailable);
        };
        let name = task.name.clone();
        let slot = self.pool.slot_mut(index);
        slot.state = TimerState::Stopped;
        slot.task = Some(task);
        slot.match_tick = 0;
        let handle = self.pool.handle_for(index);
        debug!(handle = %handle, name = %name, "timer created");
        Ok(handle)
    }

    /// 计算匹配滴答并把定时器挂上到期索引。
    /// Compute the match tick and link the timer onto the expiry index.
    ///
    /// 对 Running 定时器是保持原定到期的空操作;周期定时器首次到期用
    /// 延迟值,延迟为零时用周期值。
    /// A no-op that keeps the existing schedule for a Running timer; a
    /// periodic timer expires first after its delay, or after its period
    /// when the delay is zero.
    pub(crate) fn start(&mut self, handle: TimerHandle) -> Result<()> {
        let index = self.pool.resolve(handle)?;
        let tick = self.tick;
        let slot = self.pool.slot_mut(index);
        match slot.state {
            TimerState::Unused => Err(TimerError::Inactive),
            TimerState::Running => Ok(()),
            TimerState::Stopped | TimerState::Completed => {
                let Some(task) = slot.task.as_ref() else {
                    return Err(TimerError::Inactive);
                };
                let delta = match task.kind {
                    TimerKind::OneShot => task.delay,
                    TimerKind::Periodic if task.delay > 0 => task.delay,
                    TimerKind::Periodic => task.period,
                };
                slot.match_tick = tick.wrapping_add(delta);
                slot.state = TimerState::Running;
                let match_tick = slot.match_tick;
                self.wheel.insert(&mut self.pool, index);
                debug!(handle = %handle, match_tick, "timer started");
                Ok(())
            }
        }
    }

    /// 摘链并置为 Stopped,按停止选项决定是否补发一次回调。
    /// Unlink, move to Stopped, and decide per the stop option whether a
    /// final callback is owed.
    ///
    /// 返回 `Some((callback, arg))` 时由调用者在锁外、自己的线程上当场
    /// 调用;这里绝不执行用户代码。
    /// When `Some((callback, arg))` comes back the caller invokes it
    /// outside the lock on its own thread; user code never runs in here.
    pub(crate) fn stop(
        &mut self,
        handle: TimerHandle,
        option: StopOption<A>,
    ) -> Result<Option<(TimerCallback<A>, A)>> {
        let index = self.pool.resolve(handle)?;
        match self.pool.slot(index).state {
            TimerState::Unused => return Err(TimerError::Inactive),
            TimerState::Stopped => return Err(TimerError::AlreadyStopped),
            TimerState::Running | TimerState::Completed => {}
        }
        // 先取回调与参数:出错返回时核心必须原封未动
        let Some(task) = self.pool.slot(index).task.as_ref() else {
            return Err(TimerError::Inactive);
        };
        let fire = match option {
            StopOption::None => None,
            StopOption::Callback => Some((task.callback.clone(), task.arg.clone())),
            StopOption::CallbackArg(arg) => Some((task.callback.clone(), arg)),
        };
        // Completed 定时器早已脱链,摘除是受保护的空操作
        self.wheel.remove(&mut self.pool, index);
        self.pool.slot_mut(index).state = TimerState::Stopped;
        debug!(handle = %handle, fire_callback = fire.is_some(), "timer stopped");
        Ok(fire)
    }

    /// 把定时器从引擎中拿掉并把槽位还给池。
    /// Take the timer out of the engine and give the slot back to the
    /// pool.
    pub(crate) fn delete(&mut self, handle: TimerHandle) -> Result<()> {
        let index = self.pool.resolve(handle)?;
        if self.pool.slot(index).state == TimerState::Unused {
            return Err(TimerError::Inactive);
        }
        self.wheel.remove(&mut self.pool, index);
        self.pool.release(index);
        debug!(handle = %handle, "timer deleted");
        Ok(())
    }

    pub(crate) fn name_of(&self, handle: TimerHandle) -> Result<Arc<str>> {
        let index = self.pool.resolve(handle)?;
        // Unused 槽位的 task 必为 None,状态检查由同一次匹配完成
        self.pool
            .slot(index)
            .task
            .as_ref()
            .map(|task| task.name.clone())
            .ok_or(TimerError::Inactive)
    }

    /// 距下次到期还差的滴答数;不在运行的定时器为零。差值按 u64 模意义
    /// 计算。
    /// Ticks left until the next expiry; zero for a timer that is not
    /// running. The difference is modular in u64.
    pub(crate) fn remaining_ticks(&self, handle: TimerHandle) -> Result<u64> {
        let index = self.pool.resolve(handle)?;
        let slot = self.pool.slot(index);
        match slot.state {
            TimerState::Unused => Err(TimerError::Inactive),
            TimerState::Running => Ok(slot.match_tick.wrapping_sub(self.tick)),
            TimerState::Stopped | TimerState::Completed => Ok(0),
        }
    }

    /// 槽位的当前状态。已删除但句柄仍然新鲜的槽位报告 Unused。
    /// The slot's current state. A deleted slot whose handle is still
    /// fresh reports Unused.
    pub(crate) fn state_of(&self, handle: TimerHandle) -> Result<TimerState> {
        let index = self.pool.resolve(handle)?;
        Ok(self.pool.slot(index).state)
    }

    /// 推进一个滴答并收集本滴答到期的定时器。
    /// Advance one tick and collect the timers that expire on it.
    ///
    /// 只扫描计数落入的那个桶;桶内逐个比较匹配滴答,同桶异圈的定时器
    /// 不会触发。周期定时器在扫描中原地重挂,单次定时器转为 Completed。
    /// 返回顺序即桶内遍历顺序(后挂先出)。
    /// Scans only the bucket the count lands in; match ticks are compared
    /// one by one, so same-bucket timers from a different wrap never
    /// fire. Periodic timers are relinked in place during the scan,
    /// one-shot timers become Completed. The returned order is bucket
    /// traversal order (last linked, first out).
    pub(crate) fn advance(&mut self) -> Vec<FiredTimer<A>> {
        self.tick = self.tick.wrapping_add(1);
        let now = self.tick;
        trace!(tick = now, "tick advanced");

        let bucket = self.wheel.bucket_of(now);
        let mut fired = Vec::new();
        let mut cur = self.wheel.head(bucket);
        while cur != NIL {
            // 先存后继:当前槽位马上会被摘链或重挂
            let next = self.pool.slot(cur).next;
            if self.pool.slot(cur).match_tick == now {
                self.wheel.remove(&mut self.pool, cur);
                let handle = self.pool.handle_for(cur);
                let slot = self.pool.slot_mut(cur);
                if let Some(task) = slot.task.as_ref() {
                    fired.push(FiredTimer {
                        handle,
                        name: task.name.clone(),
                        callback: task.callback.clone(),
                        arg: task.arg.clone(),
                    });
                    if task.kind == TimerKind::Periodic {
                        slot.match_tick = now.wrapping_add(task.period);
                        self.wheel.insert(&mut self.pool, cur);
                    } else {
                        slot.state = TimerState::Completed;
                    }
                }
            }
            cur = next;
        }
        if !fired.is_empty() {
            debug!(tick = now, fired = fired.len(), "timers expired");
        }
        fired
    }
}
