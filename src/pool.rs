//! 定时器池：固定容量的槽位 arena 和穿过槽位自身链接的空闲链表。
//! Timer pool: a fixed-capacity slot arena with a free list threaded
//! through the slots' own links.

use crate::error::{Result, TimerError};
use crate::handle::TimerHandle;
use crate::task::{TimerState, TimerTask};

/// 链接哨兵：「没有槽位」的索引。
/// Link sentinel: the index that is no slot.
pub(crate) const NIL: u32 = u32::MAX;

/// 单个定时器槽位。
/// One timer slot.
///
/// `next`/`prev` 是侵入式链接，且成员关系互斥：Unused 槽位只通过 `next`
/// 串在空闲链表上；Running 槽位通过两个链接挂在恰好一个到期桶里；其余状态
/// 下两个链接都是 NIL。`task` 在槽位被分配期间一直是 `Some`。
///
/// `next`/`prev` are intrusive links with mutually exclusive membership: an
/// Unused slot is chained through `next` on the free list only; a Running
/// slot hangs in exactly one expiry bucket through both links; in every
/// other state both links are NIL. `task` is `Some` for as long as the slot
/// is allocated.
#[derive(Debug)]
pub(crate) struct TimerSlot<A> {
    /// 每次分配时前进；用于识别过期句柄。
    /// Advances on every allocation; identifies stale handles.
    pub(crate) generation: u32,
    pub(crate) state: TimerState,
    pub(crate) task: Option<TimerTask<A>>,
    /// 仅当 state 为 Running 时有意义。
    /// Meaningful only while state is Running.
    pub(crate) match_tick: u64,
    pub(crate) next: u32,
    pub(crate) prev: u32,
    /// 该槽位当前是否挂在某个到期桶里。
    /// Whether this slot currently hangs in an expiry bucket.
    pub(crate) linked: bool,
}

/// 固定容量的空闲链表分配器。
/// The fixed-capacity free-list allocator.
///
/// 构建之后不再进行任何堆分配：`allocate`/`release` 只做链表拼接。
/// No heap allocation happens after construction: `allocate`/`release` are
/// pure list splices.
#[derive(Debug)]
pub(crate) struct TimerPool<A> {
    slots: Vec<TimerSlot<A>>,
    free_head: u32,
    free_count: usize,
}

impl<A> TimerPool<A> {
    /// 以固定容量构建池；所有槽位按索引顺序串成空闲链表。
    /// Build the pool at a fixed capacity; every slot starts on the free
    /// list in index order.
    pub(crate) fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let next = if i + 1 < capacity { (i + 1) as u32 } else { NIL };
            slots.push(TimerSlot {
                generation: 0,
                state: TimerState::Unused,
                task: None,
                match_tick: 0,
                next,
                prev: NIL,
                linked: false,
            });
        }
        Self {
            slots,
            free_head: if capacity == 0 { NIL } else { 0 },
            free_count: capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn free_count(&self) -> usize {
        self.free_count
    }

    /// 从空闲链表头部取下一个槽位并推进其代数。
    /// Pop one slot off the free list head and advance its generation.
    ///
    /// 返回的槽位已脱链；其余字段由调用者填写。池耗尽时返回 `None`。
    /// The returned slot is detached; the caller fills in the rest. Returns
    /// `None` when the pool is exhausted.
    pub(crate) fn allocate(&mut self) -> Option<u32> {
        if self.free_count == 0 || self.free_head == NIL {
            return None;
        }
        let index = self.free_head;
        let slot = &mut self.slots[index as usize];
        self.free_head = slot.next;
        slot.next = NIL;
        slot.prev = NIL;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_count -= 1;
        Some(index)
    }

    /// 清空槽位的全部字段并把它推回空闲链表头部。
    /// Clear every field of the slot and push it back onto the free list
    /// head.
    pub(crate) fn release(&mut self, index: u32) {
        let head = self.free_head;
        let slot = &mut self.slots[index as usize];
        slot.task = None;
        slot.match_tick = 0;
        slot.state = TimerState::Unused;
        slot.linked = false;
        slot.prev = NIL;
        slot.next = head;
        self.free_head = index;
        self.free_count += 1;
    }

    /// 校验句柄并返回其槽位索引。
    /// Validate a handle and return its slot index.
    ///
    /// 索引越界为 [`TimerError::InvalidHandle`]，代数不匹配为
    /// [`TimerError::InvalidType`]。这里不检查状态。
    /// An out-of-range index is [`TimerError::InvalidHandle`], a generation
    /// mismatch is [`TimerError::InvalidType`]. State is not checked here.
    pub(crate) fn resolve(&self, handle: TimerHandle) -> Result<u32> {
        let index = handle.index();
        let slot = self
            .slots
            .get(index as usize)
            .ok_or(TimerError::InvalidHandle)?;
        if slot.generation != handle.generation() {
            return Err(TimerError::InvalidType);
        }
        Ok(index)
    }

    /// 当前代数下该槽位的句柄。
    /// The handle for this slot at its current generation.
    pub(crate) fn handle_for(&self, index: u32) -> TimerHandle {
        TimerHandle::new(index, self.slots[index as usize].generation)
    }

    pub(crate) fn slot(&self, index: u32) -> &TimerSlot<A> {
        &self.slots[index as usize]
    }

    pub(crate) fn slot_mut(&mut self, index: u32) -> &mut TimerSlot<A> {
        &mut self.slots[index as usize]
    }
}
