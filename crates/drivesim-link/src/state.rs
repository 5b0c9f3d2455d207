//! 连接状态机
//!
//! `Disabled → Connecting → Connected → Closing → Closed`
//!
//! - `Disabled` 为终态等价：配置未启用的外设永远停留于此
//! - `Connecting` 建链失败直接进入 `Closed`（上报但不重试，不致命）
//! - 只有 `Connected` 接受出站推送
//!
//! 状态由帧线程和 I/O 线程双方读写，用原子单元共享。

use std::sync::atomic::{AtomicU8, Ordering};

/// 外设连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    /// 配置未启用，无线程无套接字
    Disabled = 0,
    /// I/O 线程已启动，正在建链
    #[default]
    Connecting = 1,
    /// 链路可用，接受推送
    Connected = 2,
    /// 收到停止请求，正在退出
    Closing = 3,
    /// 已释放（含建链失败）
    Closed = 4,
}

impl ConnectionState {
    /// 从 u8 转换（无效值按 Closed 处理）
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disabled,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// 是否接受出站推送
    pub fn accepts_push(self) -> bool {
        self == Self::Connected
    }

    /// close() 在该状态下是否为空操作
    pub fn close_is_noop(self) -> bool {
        matches!(self, Self::Disabled | Self::Closed)
    }
}

/// 连接状态（原子版本，跨线程共享）
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 推送门控只在 Connected 打开
    #[test]
    fn test_accepts_push_only_when_connected() {
        assert!(ConnectionState::Connected.accepts_push());
        for state in [
            ConnectionState::Disabled,
            ConnectionState::Connecting,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ] {
            assert!(!state.accepts_push(), "{state:?} must reject pushes");
        }
    }

    /// Disabled 和 Closed 下 close 为空操作
    #[test]
    fn test_close_noop_states() {
        assert!(ConnectionState::Disabled.close_is_noop());
        assert!(ConnectionState::Closed.close_is_noop());
        assert!(!ConnectionState::Connected.close_is_noop());
        assert!(!ConnectionState::Connecting.close_is_noop());
    }

    /// 原子单元往返
    #[test]
    fn test_atomic_roundtrip() {
        let cell = AtomicConnectionState::new(ConnectionState::Connecting);
        assert_eq!(cell.get(), ConnectionState::Connecting);
        cell.set(ConnectionState::Connected);
        assert_eq!(cell.get(), ConnectionState::Connected);
        // 无效字节按 Closed 处理
        assert_eq!(ConnectionState::from_u8(99), ConnectionState::Closed);
    }
}
