//! 帧编排器
//!
//! 每帧按固定顺序推进：观察阶段子系统 → 录制 → 外设推送 →
//! 积分阶段子系统 → 一次性通知 → 帧间控制请求。顺序不随配置
//! 变化，录制与推送因此总是看到同一帧的观察结果。

use crate::recording::{RecordingSession, RecordingState};
use crate::registry::{SubsystemRegistry, UpdatePhase};
use crate::world::WorldState;
use drivesim_link::{
    ConnectionState, ControlRequest, Peripheral, SessionStatus, SettingsControlServer,
    TelemetryClient, VisualizationClient,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// 录制预备信号
///
/// 帧线程之外的任何持有者（输入层、远程控制）都可以请求/撤销
/// 录制；编排器每帧采样一次，解除后的真正销毁带一帧迟滞。
#[derive(Debug, Clone, Default)]
pub struct ArmSignal(Arc<AtomicBool>);

impl ArmSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求录制
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// 撤销录制请求
    pub fn withdraw(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn set(&self, armed: bool) {
        self.0.store(armed, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 可选外设集合
///
/// 三类外设互相独立：任意一个缺席/失败都不影响其余外设，
/// 更不影响帧循环本身。
pub struct Peripherals {
    telemetry: TelemetryClient,
    visualization: VisualizationClient,
    settings_server: SettingsControlServer,
}

impl Peripherals {
    pub(crate) fn new(
        telemetry: TelemetryClient,
        visualization: VisualizationClient,
        settings_server: SettingsControlServer,
    ) -> Self {
        Self {
            telemetry,
            visualization,
            settings_server,
        }
    }

    /// 全部未启用（测试与无头运行用）
    pub fn none() -> Self {
        Self {
            telemetry: TelemetryClient::disabled(drivesim_link::PeripheralKind::TelemetryClient),
            visualization: VisualizationClient::disabled(
                drivesim_link::PeripheralKind::VisualizationClient,
            ),
            settings_server: SettingsControlServer::disabled(),
        }
    }

    pub fn telemetry_state(&self) -> ConnectionState {
        self.telemetry.state()
    }

    pub fn visualization_state(&self) -> ConnectionState {
        self.visualization.state()
    }

    pub fn settings_server_state(&self) -> ConnectionState {
        self.settings_server.state()
    }

    /// 启用过 I/O 线程的外设数量（诊断用）
    pub fn started_count(&self) -> usize {
        [
            self.telemetry.was_started(),
            self.visualization.was_started(),
            self.settings_server_state() != ConnectionState::Disabled,
        ]
        .iter()
        .filter(|&&started| started)
        .count()
    }

    fn close_all(&mut self) {
        self.settings_server.close();
        self.visualization.close();
        self.telemetry.close();
    }
}

/// 帧编排器
///
/// 持有世界状态与全部逐帧协作者，只被帧线程访问。
pub struct FrameOrchestrator {
    world: WorldState,
    registry: SubsystemRegistry,
    recording: RecordingSession,
    peripherals: Peripherals,
    arm: ArmSignal,
    paused: bool,
    /// 待派发的一次性通知（后写覆盖先写）
    pending_notification: Option<String>,
}

impl FrameOrchestrator {
    pub(crate) fn new(
        world: WorldState,
        registry: SubsystemRegistry,
        recording: RecordingSession,
        peripherals: Peripherals,
        arm: ArmSignal,
    ) -> Self {
        Self {
            world,
            registry,
            recording,
            peripherals,
            arm,
            paused: false,
            pending_notification: None,
        }
    }

    /// 推进一帧
    ///
    /// `dt` 为实际墙钟帧间隔（秒）。暂停时仿真时钟与帧计数不前进，
    /// 但标记为暂停期间仍运行的子系统照常更新。
    pub fn tick(&mut self, dt: f32) {
        let paused = self.paused;

        // 1. 观察阶段：相机、传动、面板、触发器
        self.registry
            .update_phase(UpdatePhase::Observation, &mut self.world, dt, paused);

        // 2. 录制状态机（追加本帧观察结果）
        self.recording
            .advance(self.arm.is_armed(), &mut self.world, paused);

        // 3. 外设推送（非阻塞，缺席时静默丢弃）
        self.peripherals
            .visualization
            .push(self.world.camera_snapshot());
        self.peripherals
            .telemetry
            .push(self.world.telemetry_snapshot());

        // 4. 积分阶段：车辆、交通、音频、转向任务、反应测量、效果
        self.registry
            .update_phase(UpdatePhase::Integration, &mut self.world, dt, paused);

        // 5. 一次性通知派发
        if let Some(text) = self.pending_notification.take() {
            info!(%text, "notification dispatched");
            self.world.hud.last_notification = Some(text);
        }

        // 6. 帧间控制请求与状态回推
        self.apply_control_requests();
        self.peripherals.settings_server.push(SessionStatus {
            paused: self.paused,
            recording: self.recording.state() == RecordingState::Active,
            frame: self.world.frame,
        });

        // 帧簿记：上一帧车辆状态供观察阶段使用
        self.world.previous_vehicle = self.world.vehicle;
        if !paused {
            self.world.sim_time_s += dt as f64;
            self.world.frame += 1;
        }
    }

    /// 排队一条一次性通知
    ///
    /// 同一帧内后写覆盖先写：被覆盖的通知不会派发。
    pub fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(dropped) = self.pending_notification.replace(text) {
            warn!(%dropped, "undispatched notification overwritten");
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            info!(paused, "simulation pause toggled");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn recording(&self) -> &RecordingSession {
        &self.recording
    }

    pub fn peripherals(&self) -> &Peripherals {
        &self.peripherals
    }

    pub fn arm_signal(&self) -> ArmSignal {
        self.arm.clone()
    }

    pub(crate) fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }

    /// 收尾：强制结束录制段 → 关闭外设 → 逆序关闭子系统
    ///
    /// 每一步尽力而为，失败只告警不中断后续步骤。幂等。
    pub(crate) fn teardown(&mut self) {
        self.recording.force_drain();
        self.peripherals.close_all();
        let failures = self.registry.close_all();
        if failures > 0 {
            warn!(failures, "some subsystems failed to close cleanly");
        }
    }

    fn apply_control_requests(&mut self) {
        while let Some(request) = self.peripherals.settings_server.try_recv() {
            match request {
                ControlRequest::SetPaused(paused) => self.set_paused(paused),
                ControlRequest::SetRecording(armed) => self.arm.set(armed),
                ControlRequest::Notify(text) => self.notify(text),
            }
        }
    }
}
