//! 单槽覆盖信箱（latest-wins）
//!
//! 帧线程 → I/O 线程的状态交接通道。容量恒为 1：
//! 新快照覆盖旧快照，过期数据直接丢弃。
//!
//! # 设计原则
//!
//! - **无背压**: 生产者（帧线程）永不等待，饱和时最新值获胜
//! - **无锁**: 基于 `ArcSwapOption`，store/swap 均为无锁操作
//! - **最终一致**: 消费者最终看到最近一次写入，中间状态无序可言

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// 单槽快照信箱
#[derive(Debug, Default)]
pub struct SnapshotSlot<T> {
    cell: ArcSwapOption<T>,
}

impl<T> SnapshotSlot<T> {
    pub fn new() -> Self {
        Self {
            cell: ArcSwapOption::empty(),
        }
    }

    /// 写入最新快照（覆盖未被取走的旧值）
    pub fn publish(&self, snapshot: T) {
        self.cell.store(Some(Arc::new(snapshot)));
    }

    /// 取走当前快照（取走后槽位变空）
    pub fn take(&self) -> Option<Arc<T>> {
        self.cell.swap(None)
    }

    /// 槽位当前是否为空
    pub fn is_empty(&self) -> bool {
        self.cell.load().is_none()
    }
}
