//! # Drivesim Link - 外设连接层
//!
//! 会话可选外设的统一抽象：CAN 遥测桥、外部可视化客户端、
//! 设置控制服务器。每个已连接的外设独占一个 I/O 线程，
//! 帧线程通过单槽覆盖信箱（latest-wins）向其推送状态快照。
//!
//! # 设计原则
//!
//! - **非阻塞推送**: `push()` 只写入 [`SnapshotSlot`]，永不等待网络
//! - **静默降级**: 非 `Connected` 状态下的推送直接丢弃，外设缺席
//!   不得拖慢或中断帧循环
//! - **协作式取消**: 停止标志由 I/O 线程主动检查；`close()` 只做
//!   有界等待，超时后照常继续拆除
//! - **幂等关闭**: 任何状态下重复 `close()` 都是空操作

mod client;
mod control;
mod error;
mod settings_server;
mod slot;
mod snapshot;
mod state;

pub use client::{LinkClient, TelemetryClient, VisualizationClient};
pub use control::ControlRequest;
pub use error::LinkError;
pub use settings_server::SettingsControlServer;
pub use slot::SnapshotSlot;
pub use snapshot::{CameraPose, SessionStatus, VehicleTelemetry};
pub use state::{AtomicConnectionState, ConnectionState};

use serde::Serialize;

/// 外设种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralKind {
    /// CAN 遥测桥（TCP 客户端，推送车辆运动学）
    TelemetryClient,
    /// 外部可视化（TCP 客户端，推送相机位姿）
    VisualizationClient,
    /// 设置控制服务器（TCP 监听，接收运行时控制请求）
    SettingsControlServer,
}

impl PeripheralKind {
    /// 日志中使用的短名
    pub fn label(self) -> &'static str {
        match self {
            PeripheralKind::TelemetryClient => "telemetry",
            PeripheralKind::VisualizationClient => "visualization",
            PeripheralKind::SettingsControlServer => "settings-server",
        }
    }
}

/// 外设连接的统一能力集
///
/// 三类外设共享 start/push/close 生命周期，快照类型各不相同，
/// 通过关联类型表达。
pub trait Peripheral {
    /// 推送给 I/O 线程的快照类型
    type Snapshot: Serialize + Send + 'static;

    /// 外设种类
    fn kind(&self) -> PeripheralKind;

    /// 当前连接状态
    fn state(&self) -> ConnectionState;

    /// 推送最新快照（非阻塞，非 Connected 状态下静默丢弃）
    fn push(&self, snapshot: Self::Snapshot);

    /// 关闭连接（幂等，有界等待 I/O 线程退出）
    fn close(&mut self);
}
