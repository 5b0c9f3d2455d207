//! TCP 客户端外设（遥测桥 / 可视化）
//!
//! 两类客户端只在种类、对端地址和快照类型上不同，线程生命周期
//! 完全一致，用泛型 [`LinkClient`] 承载：
//!
//! - 构造即启动 I/O 线程，建链在线程内完成，启动序列不被网络拖住
//! - 建链失败 → `Closed` + 告警，会话降级继续
//! - I/O 线程按固定周期轮询快照槽，把最新快照写成 JSON 行

use crate::slot::SnapshotSlot;
use crate::state::{AtomicConnectionState, ConnectionState};
use crate::{Peripheral, PeripheralKind};
use serde::Serialize;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 建链超时
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// 快照槽轮询周期
const SLOT_POLL_INTERVAL: Duration = Duration::from_millis(5);
/// 拆除时等待 I/O 线程退出的上限
pub(crate) const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 带超时的线程 join 扩展
///
/// 拆除必须在外设线程无响应时也能完成：看门狗线程代为 join，
/// 主调方只做有界等待，超时后照常继续（进程退出时由 OS 收尾）。
pub(crate) trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "thread panicked during join",
            ))),
        }
    }
}

/// TCP 客户端外设（泛型核心）
///
/// `T` 是推送的快照类型。快照经单槽信箱交给 I/O 线程，
/// 槽位饱和时最新值覆盖旧值，帧线程永不等待。
pub struct LinkClient<T> {
    kind: PeripheralKind,
    state: Arc<AtomicConnectionState>,
    slot: Arc<SnapshotSlot<T>>,
    /// 协作式停止标志（I/O 线程每个轮询周期检查一次）
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Serialize + Send + Sync + 'static> LinkClient<T> {
    /// 构造并立即启动 I/O 线程
    ///
    /// 建链在线程内进行，本函数从不阻塞。建链失败时连接自行进入
    /// `Closed` 并告警，对会话不致命。
    pub fn connect(kind: PeripheralKind, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Connecting));
        let slot = Arc::new(SnapshotSlot::new());
        let stop = Arc::new(AtomicBool::new(false));

        let worker_state = state.clone();
        let worker_slot = slot.clone();
        let worker_stop = stop.clone();
        let worker = spawn(move || {
            io_loop(kind, &addr, worker_state, worker_slot, worker_stop);
        });

        Self {
            kind,
            state,
            slot,
            stop,
            worker: Some(worker),
        }
    }

    /// 构造未启用的外设（无线程、无套接字）
    pub fn disabled(kind: PeripheralKind) -> Self {
        Self {
            kind,
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Disabled)),
            slot: Arc::new(SnapshotSlot::new()),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// 是否曾经启动过 I/O 线程（诊断用）
    pub fn was_started(&self) -> bool {
        self.worker.is_some() || self.state.get() == ConnectionState::Closed
    }
}

/// CAN 遥测桥客户端
pub type TelemetryClient = LinkClient<crate::snapshot::VehicleTelemetry>;

/// 外部可视化客户端
pub type VisualizationClient = LinkClient<crate::snapshot::CameraPose>;

impl TelemetryClient {
    /// CAN 遥测桥客户端
    pub fn telemetry(addr: impl Into<String>) -> Self {
        Self::connect(PeripheralKind::TelemetryClient, addr)
    }
}

impl VisualizationClient {
    /// 外部可视化客户端
    pub fn visualization(addr: impl Into<String>) -> Self {
        Self::connect(PeripheralKind::VisualizationClient, addr)
    }
}

impl<T: Serialize + Send + Sync + 'static> Peripheral for LinkClient<T> {
    type Snapshot = T;

    fn kind(&self) -> PeripheralKind {
        self.kind
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn push(&self, snapshot: T) {
        // 非 Connected 一律丢弃：外设缺席不得影响帧循环
        if !self.state.get().accepts_push() {
            return;
        }
        self.slot.publish(snapshot);
    }

    fn close(&mut self) {
        let state = self.state.get();
        if state.close_is_noop() {
            return;
        }
        self.state.set(ConnectionState::Closing);
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.worker.take()
            && let Err(_e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            error!(
                kind = self.kind.label(),
                "IO thread failed to shut down within {:?}, proceeding with teardown",
                JOIN_TIMEOUT
            );
        }
        self.state.set(ConnectionState::Closed);
    }
}

impl<T> Drop for LinkClient<T> {
    fn drop(&mut self) {
        // close() 的兜底：未显式关闭时也要停线程
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take()
            && let Err(_e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            error!(kind = self.kind.label(), "IO thread leaked on drop");
        }
        self.state.set(ConnectionState::Closed);
    }
}

/// 客户端 I/O 循环
///
/// 建链 → 轮询快照槽 → 写 JSON 行。任何写错误都终止本连接
/// 而不上抛（错误被隔离在 I/O 线程内）。
fn io_loop<T: Serialize>(
    kind: PeripheralKind,
    addr: &str,
    state: Arc<AtomicConnectionState>,
    slot: Arc<SnapshotSlot<T>>,
    stop: Arc<AtomicBool>,
) {
    let mut stream = match establish(addr) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(kind = kind.label(), addr, "connect failed: {e}, session continues without this peripheral");
            state.set(ConnectionState::Closed);
            return;
        }
    };
    state.set(ConnectionState::Connected);
    info!(kind = kind.label(), addr, "peripheral connected");

    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }
        if let Some(snapshot) = slot.take() {
            if let Err(e) = write_json_line(&mut stream, &*snapshot) {
                warn!(kind = kind.label(), "send failed: {e}, closing connection");
                state.set(ConnectionState::Closed);
                return;
            }
        } else {
            std::thread::sleep(SLOT_POLL_INTERVAL);
        }
    }
    debug!(kind = kind.label(), "IO thread stopping on request");
    state.set(ConnectionState::Closed);
}

fn establish(addr: &str) -> Result<TcpStream, crate::LinkError> {
    let resolved = addr
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| crate::LinkError::InvalidAddress(addr.to_string()))?;
    let stream = TcpStream::connect_timeout(&resolved, CONNECT_TIMEOUT)?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

fn write_json_line<T: Serialize>(stream: &mut TcpStream, value: &T) -> Result<(), crate::LinkError> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    stream.write_all(&line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::VehicleTelemetry;

    fn sample_telemetry() -> VehicleTelemetry {
        VehicleTelemetry {
            sim_time_s: 1.0,
            position: [0.0; 3],
            orientation: [1.0, 0.0, 0.0, 0.0],
            speed_kmh: 50.0,
            rpm: 2000.0,
            steering: 0.1,
        }
    }

    /// 未启用的外设：无线程，close 为空操作
    #[test]
    fn test_disabled_client_owns_nothing() {
        let mut client = LinkClient::<VehicleTelemetry>::disabled(PeripheralKind::TelemetryClient);
        assert_eq!(client.state(), ConnectionState::Disabled);
        assert!(client.worker.is_none());

        client.push(sample_telemetry());
        assert!(client.slot.is_empty(), "disabled client must drop pushes");

        client.close();
        client.close();
        assert_eq!(client.state(), ConnectionState::Disabled);
    }

    /// 不可达对端：启动仍成功，状态最终为 Closed，推送不阻塞
    #[test]
    fn test_unreachable_peer_degrades() {
        // 保留地址段，建链立即失败
        let mut client = LinkClient::<VehicleTelemetry>::telemetry("127.0.0.1:1");
        assert!(client.was_started());

        // 等 I/O 线程放弃建链
        for _ in 0..200 {
            if client.state() == ConnectionState::Closed {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(client.state(), ConnectionState::Closed);

        // 推送在任何非 Connected 状态下都静默返回
        client.push(sample_telemetry());
        assert!(client.slot.is_empty());

        // 重复关闭幂等
        client.close();
        client.close();
        assert_eq!(client.state(), ConnectionState::Closed);
    }
}
