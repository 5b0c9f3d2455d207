//! 设置控制服务器
//!
//! TCP 监听外设：远程操作端连上来之后可以暂停/恢复仿真、
//! 预备/撤销录制、排队一次性通知。同一时刻只服务一个对端。
//!
//! # 与帧循环的交接
//!
//! - **入站**: 控制行解析为 [`ControlRequest`] 后进入有界队列，
//!   帧循环在帧间经 [`SettingsControlServer::try_recv`] 逐条取出；
//!   队列满时丢弃并告警（操作端指令不产生背压）
//! - **出站**: 会话状态快照经单槽信箱交给监听线程，写给当前对端

use crate::client::{JOIN_TIMEOUT, JoinTimeout};
use crate::control::ControlRequest;
use crate::slot::SnapshotSlot;
use crate::snapshot::SessionStatus;
use crate::state::{AtomicConnectionState, ConnectionState};
use crate::{Peripheral, PeripheralKind};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// accept / read 的轮询周期
const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// 入站请求队列容量
const REQUEST_QUEUE_CAP: usize = 16;
/// 入站单行长度上限（字节）
///
/// 合法控制行都在几十字节内；不带换行符的字节流不得让累积缓冲
/// 无界增长，超限即整体丢弃。
const MAX_LINE_LEN: usize = 1024;

/// 设置控制服务器
pub struct SettingsControlServer {
    state: Arc<AtomicConnectionState>,
    slot: Arc<SnapshotSlot<SessionStatus>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    requests: Receiver<ControlRequest>,
}

impl SettingsControlServer {
    /// 启动监听线程
    ///
    /// 绑定在线程内完成，本函数从不阻塞。绑定失败时服务器自行进入
    /// `Closed` 并告警，对会话不致命。
    pub fn start(port: u16) -> Self {
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Connecting));
        let slot = Arc::new(SnapshotSlot::new());
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = bounded(REQUEST_QUEUE_CAP);

        let worker_state = state.clone();
        let worker_slot = slot.clone();
        let worker_stop = stop.clone();
        let worker = spawn(move || {
            listen_loop(port, worker_state, worker_slot, worker_stop, tx);
        });

        Self {
            state,
            slot,
            stop,
            worker: Some(worker),
            requests: rx,
        }
    }

    /// 构造未启用的服务器（无线程、无套接字）
    pub fn disabled() -> Self {
        // 发送端立即丢弃：try_recv 永远为空
        let (_tx, rx) = bounded(0);
        Self {
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Disabled)),
            slot: Arc::new(SnapshotSlot::new()),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            requests: rx,
        }
    }

    /// 取出一条待处理的控制请求（非阻塞）
    pub fn try_recv(&self) -> Option<ControlRequest> {
        self.requests.try_recv().ok()
    }
}

impl Peripheral for SettingsControlServer {
    type Snapshot = SessionStatus;

    fn kind(&self) -> PeripheralKind {
        PeripheralKind::SettingsControlServer
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn push(&self, snapshot: SessionStatus) {
        if !self.state.get().accepts_push() {
            return;
        }
        self.slot.publish(snapshot);
    }

    fn close(&mut self) {
        if self.state.get().close_is_noop() {
            return;
        }
        self.state.set(ConnectionState::Closing);
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.worker.take()
            && let Err(_e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            error!(
                "settings-server listener failed to shut down within {:?}, proceeding",
                JOIN_TIMEOUT
            );
        }
        self.state.set(ConnectionState::Closed);
    }
}

impl Drop for SettingsControlServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.worker.take()
            && let Err(_e) = handle.join_timeout(JOIN_TIMEOUT)
        {
            error!("settings-server listener leaked on drop");
        }
        self.state.set(ConnectionState::Closed);
    }
}

/// 监听线程主循环
///
/// 绑定 → 非阻塞 accept 轮询 → 逐对端服务。一次只接待一个对端，
/// 对端断开后回到 accept。所有 I/O 错误都被隔离在本线程内。
fn listen_loop(
    port: u16,
    state: Arc<AtomicConnectionState>,
    slot: Arc<SnapshotSlot<SessionStatus>>,
    stop: Arc<AtomicBool>,
    tx: Sender<ControlRequest>,
) {
    let listener = match bind(port) {
        Ok(listener) => listener,
        Err(e) => {
            warn!(port, "settings-server bind failed: {e}, session continues without it");
            state.set(ConnectionState::Closed);
            return;
        }
    };
    state.set(ConnectionState::Connected);
    info!(port, "settings-server listening");

    while !stop.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "settings-server client attached");
                serve_client(stream, &slot, &stop, &tx);
                debug!(%peer, "settings-server client detached");
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                // 没有对端时丢弃过期的状态快照
                let _ = slot.take();
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                warn!("settings-server accept failed: {e}");
                break;
            }
        }
    }
    state.set(ConnectionState::Closed);
}

fn bind(port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// 服务单个对端：读入站控制行、写出站状态快照
fn serve_client(
    mut stream: TcpStream,
    slot: &SnapshotSlot<SessionStatus>,
    stop: &AtomicBool,
    tx: &Sender<ControlRequest>,
) {
    if stream.set_read_timeout(Some(POLL_INTERVAL)).is_err() {
        return;
    }
    let mut pending = Vec::new();
    let mut buf = [0u8; 256];

    while !stop.load(Ordering::Acquire) {
        // 出站：最新状态快照
        if let Some(status) = slot.take() {
            let mut line = match serde_json::to_vec(&*status) {
                Ok(line) => line,
                Err(e) => {
                    warn!("settings-server status encode failed: {e}");
                    return;
                }
            };
            line.push(b'\n');
            if stream.write_all(&line).is_err() {
                return;
            }
        }

        // 入站：按行切出控制请求
        match stream.read(&mut buf) {
            Ok(0) => return, // 对端断开
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                drain_lines(&mut pending, tx);
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => {
                warn!("settings-server read failed: {e}");
                return;
            }
        }
    }
}

/// 从累积缓冲中切出完整行并入队
///
/// 留在缓冲里的半行受 [`MAX_LINE_LEN`] 约束：超限即整体丢弃并
/// 告警，对端不能靠不发换行符把监听线程的内存撑爆。
fn drain_lines(pending: &mut Vec<u8>, tx: &Sender<ControlRequest>) {
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
        if line_bytes.len() > MAX_LINE_LEN {
            warn!(len = line_bytes.len(), "oversized control line dropped");
            continue;
        }
        let line = String::from_utf8_lossy(&line_bytes);
        match ControlRequest::parse(&line) {
            Some(request) => {
                if tx.try_send(request).is_err() {
                    warn!("control request queue full, dropping request");
                }
            }
            None if line.trim().is_empty() => {}
            None => warn!(line = %line.trim(), "unparseable control request dropped"),
        }
    }
    if pending.len() > MAX_LINE_LEN {
        warn!(len = pending.len(), "control line exceeds length cap, discarding buffer");
        pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 未启用的服务器：无线程，close 幂等，try_recv 永远为空
    #[test]
    fn test_disabled_server_owns_nothing() {
        let mut server = SettingsControlServer::disabled();
        assert_eq!(server.state(), ConnectionState::Disabled);
        assert!(server.worker.is_none());
        assert!(server.try_recv().is_none());

        server.push(SessionStatus {
            paused: false,
            recording: false,
            frame: 0,
        });
        assert!(server.slot.is_empty());

        server.close();
        server.close();
        assert_eq!(server.state(), ConnectionState::Disabled);
    }

    /// 行切割：半行保留，整行入队
    #[test]
    fn test_drain_lines_splits_on_newline() {
        let (tx, rx) = bounded(4);
        let mut pending = b"pause on\nrecord ".to_vec();
        drain_lines(&mut pending, &tx);
        assert_eq!(rx.try_recv().unwrap(), ControlRequest::SetPaused(true));
        assert!(rx.try_recv().is_err());
        assert_eq!(pending, b"record ".to_vec());

        pending.extend_from_slice(b"on\n");
        drain_lines(&mut pending, &tx);
        assert_eq!(rx.try_recv().unwrap(), ControlRequest::SetRecording(true));
        assert!(pending.is_empty());
    }

    /// 不带换行符的字节流不得让累积缓冲无界增长
    #[test]
    fn test_newline_free_stream_is_capped() {
        let (tx, rx) = bounded(4);
        let mut pending = Vec::new();

        // 模拟对端持续灌入不带终止符的数据
        for _ in 0..1024 {
            pending.extend_from_slice(&[b'x'; 1024]);
            drain_lines(&mut pending, &tx);
            assert!(
                pending.len() <= MAX_LINE_LEN,
                "pending buffer must stay capped, got {} bytes",
                pending.len()
            );
        }
        assert!(rx.try_recv().is_err(), "garbage must not become requests");
    }

    /// 超长的完整行被整体丢弃，不阻碍后续合法行
    #[test]
    fn test_oversized_line_dropped() {
        let (tx, rx) = bounded(4);
        let mut pending = vec![b'y'; MAX_LINE_LEN + 1];
        pending.push(b'\n');
        pending.extend_from_slice(b"pause on\n");

        drain_lines(&mut pending, &tx);
        assert_eq!(rx.try_recv().unwrap(), ControlRequest::SetPaused(true));
        assert!(rx.try_recv().is_err());
        assert!(pending.is_empty());
    }
}
