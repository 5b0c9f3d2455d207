//! # Drivesim Session - 仿真会话核心
//!
//! 驾驶仿真会话的编排层：启动/拆除时序、逐帧更新循环、
//! 可选外设的条件生命周期、运行时数据录制的状态机。
//!
//! # 架构
//!
//! - [`SessionBuilder`] / [`Session`] - 会话生命周期（快速失败启动，
//!   尽力而为拆除）
//! - [`FrameOrchestrator`] - 固定顺序的逐帧驱动器（内部）
//! - [`SubsystemRegistry`] / [`Subsystem`] - 有序子系统集合
//! - [`RecordingSession`] - 预备/排空录制状态机
//! - [`SessionContext`] - 启动期一次写入、此后只读的会话常量
//!
//! # 线程模型
//!
//! 单一帧线程驱动 `Session::tick`；每个已连接外设独占一个 I/O
//! 线程（见 `drivesim-link`）。帧线程与外设线程之间只经单槽覆盖
//! 信箱交接快照，帧循环永不等待网络。

mod context;
mod error;
mod lifecycle;
mod orchestrator;
mod recording;
mod registry;
pub mod subsystems;
mod world;

pub use context::SessionContext;
pub use error::SessionError;
pub use lifecycle::{Session, SessionBuilder};
pub use orchestrator::{ArmSignal, FrameOrchestrator, Peripherals};
pub use recording::{DataWriter, EventLogger, RecordingSession, RecordingState};
pub use registry::{Subsystem, SubsystemRegistry, UpdatePhase};
pub use world::{CameraState, HudState, VehicleKinematics, WorldState};
