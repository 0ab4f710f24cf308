//! 到期索引：以匹配滴答取模分桶的侵入式定时器轮。
//! The expiry index: an intrusive timer wheel bucketed by match tick
//! modulo the bucket count.
//!
//! 一个桶里可以同时挂着不同圈数的定时器（匹配滴答同余但不相等），
//! 因此扫描时必须逐个比较匹配滴答，桶命中本身不代表到期。
//! One bucket may hold timers from different wraps at the same time
//! (congruent but unequal match ticks), so a scan must compare each match
//! tick individually; landing in the bucket does not mean expiry.

use tracing::trace;

use crate::pool::{NIL, TimerPool};

/// 一个到期桶：链表头加元素计数。
/// One expiry bucket: a list head plus an element count.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    head: u32,
    count: u32,
}

/// 定时器轮本体。链接存放在池槽位里，这里只保存桶头。
/// The wheel proper. Links live in the pool slots; only bucket heads are
/// kept here.
#[derive(Debug)]
pub(crate) struct ExpiryWheel {
    buckets: Vec<Bucket>,
    len: usize,
}

impl ExpiryWheel {
    pub(crate) fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![Bucket { head: NIL, count: 0 }; bucket_count],
            len: 0,
        }
    }

    /// 匹配滴答落入的桶号。
    /// The bucket a match tick lands in.
    pub(crate) fn bucket_of(&self, match_tick: u64) -> usize {
        (match_tick % self.buckets.len() as u64) as usize
    }

    /// 把槽位头插进其匹配滴答对应的桶。
    /// Head-insert a slot into the bucket of its match tick.
    ///
    /// 槽位必须已脱链；匹配滴答由调用者先行写入。
    /// The slot must be detached; the caller has already written the match
    /// tick.
    pub(crate) fn insert<A>(&mut self, pool: &mut TimerPool<A>, index: u32) {
        let match_tick = pool.slot(index).match_tick;
        let bucket = self.bucket_of(match_tick);
        let old_head = self.buckets[bucket].head;

        let slot = pool.slot_mut(index);
        slot.prev = NIL;
        slot.next = old_head;
        slot.linked = true;
        if old_head != NIL {
            pool.slot_mut(old_head).prev = index;
        }
        self.buckets[bucket].head = index;
        self.buckets[bucket].count += 1;
        self.len += 1;
        trace!(index, match_tick, bucket, "timer linked into expiry bucket");
    }

    /// 把槽位从它所在的桶里摘下。对未挂链的槽位是空操作。
    /// Unlink a slot from the bucket it hangs in. A no-op for a slot that
    /// is not linked.
    pub(crate) fn remove<A>(&mut self, pool: &mut TimerPool<A>, index: u32) {
        if !pool.slot(index).linked {
            return;
        }
        let (match_tick, prev, next) = {
            let slot = pool.slot(index);
            (slot.match_tick, slot.prev, slot.next)
        };
        let bucket = self.bucket_of(match_tick);

        if prev != NIL {
            pool.slot_mut(prev).next = next;
        } else {
            self.buckets[bucket].head = next;
        }
        if next != NIL {
            pool.slot_mut(next).prev = prev;
        }

        let slot = pool.slot_mut(index);
        slot.next = NIL;
        slot.prev = NIL;
        slot.linked = false;
        self.buckets[bucket].count -= 1;
        self.len -= 1;
        trace!(index, match_tick, bucket, "timer unlinked from expiry bucket");
    }

    /// 桶的链表头。
    /// The list head of a bucket.
    pub(crate) fn head(&self, bucket: usize) -> u32 {
        self.buckets[bucket].head
    }

    /// 当前挂在轮上的定时器总数。
    /// Total number of timers currently on the wheel.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub(crate) fn bucket_len(&self, bucket: usize) -> usize {
        self.buckets[bucket].count as usize
    }
}
