//! 定时器句柄：槽位索引加代数。
//! Timer handles: a slot index plus a generation.

use std::fmt;

/// An opaque reference to one timer slot in a pool.
///
/// A handle stays valid from `create` until `delete`. After `delete` the
/// handle keeps matching its slot's generation (operations report the timer
/// as inactive) until the slot is handed out again, at which point the
/// generation moves on and the old handle is rejected as stale.
///
/// 指向池中某个定时器槽位的不透明引用。
///
/// 句柄从 `create` 起到 `delete` 为止保持有效。`delete` 之后句柄仍与槽位的
/// 代数匹配（各操作会报告定时器已失效），直到槽位被再次分配；此时代数前进，
/// 旧句柄会被当作过期句柄拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    index: u32,
    generation: u32,
}

impl TimerHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index inside the pool arena.
    /// 池中的槽位索引。
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation the slot carried when this handle was issued.
    /// 签发此句柄时槽位所携带的代数。
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack the handle into a single `u64`.
    ///
    /// Layout: lower 32 bits are the slot index, upper 32 bits the
    /// generation.
    ///
    /// 将句柄打包为单个 `u64`。
    ///
    /// 布局：低 32 位为槽位索引，高 32 位为代数。
    pub fn into_raw(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Rebuild a handle from its packed form.
    ///
    /// Any `u64` is accepted here; a value that never came out of
    /// [`into_raw`](Self::into_raw) is rejected by the engine when used, not
    /// here.
    ///
    /// 从打包形式重建句柄。
    ///
    /// 这里接受任意 `u64`；不是由 [`into_raw`](Self::into_raw) 产生的值会在
    /// 使用时被引擎拒绝，而不是在这里。
    pub fn from_raw(raw: u64) -> Self {
        Self {
            index: raw as u32,
            generation: (raw >> 32) as u32,
        }
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        let handle = TimerHandle::new(7, 3);
        let raw = handle.into_raw();
        assert_eq!(raw, (3u64 << 32) | 7);
        assert_eq!(TimerHandle::from_raw(raw), handle);
    }

    #[test]
    fn display_shows_index_and_generation() {
        assert_eq!(TimerHandle::new(12, 4).to_string(), "12#4");
    }
}
