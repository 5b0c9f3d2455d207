//! 会话生命周期
//!
//! 启动是快速失败的固定序列：任务加载 → 输出目录/会话常量 →
//! 子系统按依赖序注册 → 外设各自独立启用 → 就绪。任何必需步骤
//! 失败都立即放弃整个启动，不产生半初始化的会话。
//!
//! 拆除反过来是尽力而为的：录制强制收尾 → 外设关闭 → 子系统
//! 逆序关闭，每一步失败只告警，绝不中断后续步骤。重复拆除
//! 是空操作。

use crate::context::SessionContext;
use crate::error::SessionError;
use crate::orchestrator::{ArmSignal, FrameOrchestrator, Peripherals};
use crate::recording::{RecordingSession, RecordingState};
use crate::registry::{SubsystemRegistry, UpdatePhase};
use crate::subsystems::{
    AudioSubsystem, CameraFlight, CameraSubsystem, DrivetrainSubsystem, EffectsSubsystem,
    PanelSubsystem, ReactionSubsystem, SteeringTaskSubsystem, TrafficSubsystem, TriggerSubsystem,
    VehicleSubsystem,
};
use crate::world::WorldState;
use drivesim_link::{
    ConnectionState, PeripheralKind, SettingsControlServer, TelemetryClient, VisualizationClient,
};
use drivesim_task::{DrivingTask, SettingKey, Settings, SimulationDefaults};
use nalgebra::{UnitQuaternion, Vector3};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 会话构建器
///
/// 收集启动参数，`build()` 执行完整启动序列。
pub struct SessionBuilder {
    task_path: PathBuf,
    driver_name: Option<String>,
    output_root: PathBuf,
    arm_recording: bool,
}

impl SessionBuilder {
    pub fn new(task_path: impl Into<PathBuf>) -> Self {
        Self {
            task_path: task_path.into(),
            driver_name: None,
            output_root: PathBuf::from(SimulationDefaults::ANALYZER_DATA_ROOT),
            arm_recording: false,
        }
    }

    /// 显式驾驶员名（回退链的最高优先级）
    pub fn driver_name(mut self, name: impl Into<String>) -> Self {
        self.driver_name = Some(name.into());
        self
    }

    /// 分析数据根目录（时间戳输出目录在其下创建）
    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// 启动即预备录制
    pub fn arm_recording(mut self, armed: bool) -> Self {
        self.arm_recording = armed;
        self
    }

    /// 执行启动序列
    ///
    /// # Errors
    /// 任务加载失败、输出目录创建失败、设置类型不符
    /// 都会使整个启动失败。外设建链失败**不在**此列：
    /// 外设自行降级，不阻碍会话就绪。
    pub fn build(self) -> Result<Session, SessionError> {
        // 任务加载：后续一切步骤的输入，失败即放弃
        let task = Arc::new(DrivingTask::load(&self.task_path)?);

        let output_dir = SessionContext::create_output_dir(&self.output_root)?;
        let gravity = task.scene().gravity.unwrap_or(SimulationDefaults::GRAVITY);

        // 驾驶员名回退链：显式参数 → 任务设置 → 内置默认
        let driver_name = match self.driver_name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => task
                .settings()
                .get_str(SettingKey::GeneralDriverName, SimulationDefaults::DRIVER_NAME)?,
        };

        let ctx = Arc::new(SessionContext {
            task: task.clone(),
            driver_name,
            output_dir,
            gravity,
        });
        info!(
            task = %task.id(),
            driver = %ctx.driver_name,
            gravity = ctx.gravity,
            "session constants resolved"
        );

        let world = initial_world(&task);
        let registry = build_registry(&ctx)?;
        let peripherals = build_peripherals(task.settings());

        let arm = ArmSignal::new();
        if self.arm_recording {
            arm.request();
        }
        let recording = RecordingSession::new(&ctx);
        let orchestrator = FrameOrchestrator::new(world, registry, recording, peripherals, arm);

        info!("session ready");
        Ok(Session {
            ctx,
            orchestrator,
            ready: true,
            torn_down: false,
        })
    }
}

/// 按情景定义初始化世界状态
fn initial_world(task: &DrivingTask) -> WorldState {
    let mut world = WorldState::default();
    let scenario = task.scenario();
    if let Some(start) = scenario.start_position {
        world.vehicle.position = Vector3::new(start.x, start.y, start.z);
    }
    world.vehicle.orientation = UnitQuaternion::from_axis_angle(
        &Vector3::y_axis(),
        scenario.start_heading_deg.to_radians(),
    );
    // 相机子系统的首帧输入
    world.previous_vehicle = world.vehicle;
    world
}

/// 按依赖序注册全部子系统
///
/// 观察阶段：相机 → 动力总成 → 面板 → 触发器。
/// 积分阶段：车辆 → 交通 → 音频 → 转向任务 → 反应 → 效果。
/// 顺序承载语义，禁止重排。
fn build_registry(ctx: &SessionContext) -> Result<SubsystemRegistry, SessionError> {
    let task = &ctx.task;
    let mut registry = SubsystemRegistry::new();

    // 飞行路点不足 → 静默回退车载挂载，不阻碍就绪
    let camera = match CameraFlight::new(&task.scene().camera_flight) {
        Ok(flight) => CameraSubsystem::with_flight(flight),
        Err(e) => {
            debug!("camera flight unavailable ({e}), falling back to vehicle mount");
            CameraSubsystem::vehicle_attached()
        }
    };
    let show_stats = task.settings().get_bool(SettingKey::GeneralShowStats, false)?;

    registry.register(UpdatePhase::Observation, Box::new(camera));
    registry.register(UpdatePhase::Observation, Box::new(DrivetrainSubsystem::new()));
    registry.register(UpdatePhase::Observation, Box::new(PanelSubsystem::new(show_stats)));
    registry.register(
        UpdatePhase::Observation,
        Box::new(TriggerSubsystem::new(&task.interaction().triggers)),
    );

    registry.register(UpdatePhase::Integration, Box::new(VehicleSubsystem::new()));
    registry.register(
        UpdatePhase::Integration,
        Box::new(TrafficSubsystem::new(task.scenario().traffic_count)),
    );
    registry.register(UpdatePhase::Integration, Box::new(AudioSubsystem::new()));
    registry.register(
        UpdatePhase::Integration,
        Box::new(SteeringTaskSubsystem::new(ctx.driver_name.clone())),
    );
    registry.register(UpdatePhase::Integration, Box::new(ReactionSubsystem::new()));
    registry.register(UpdatePhase::Integration, Box::new(EffectsSubsystem::new()));

    Ok(registry)
}

/// 按任务设置独立启用各外设
///
/// 每个外设的启用判定互不影响：一处设置笔误只让该外设缺席并
/// 告警，不阻碍其余外设，更不阻碍会话就绪。
fn build_peripherals(settings: &Settings) -> Peripherals {
    let telemetry = if read_enabled(settings, SettingKey::TelemetryEnableConnection) {
        let addr = read_addr(
            settings,
            SettingKey::TelemetryAddr,
            SimulationDefaults::TELEMETRY_ADDR,
        );
        TelemetryClient::telemetry(addr)
    } else {
        TelemetryClient::disabled(PeripheralKind::TelemetryClient)
    };

    let visualization = if read_enabled(settings, SettingKey::VisualizationEnableConnection) {
        let addr = read_addr(
            settings,
            SettingKey::VisualizationAddr,
            SimulationDefaults::VISUALIZATION_ADDR,
        );
        VisualizationClient::visualization(addr)
    } else {
        VisualizationClient::disabled(PeripheralKind::VisualizationClient)
    };

    let settings_server = if read_enabled(settings, SettingKey::SettingsServerStart) {
        let port = match settings.get_int(
            SettingKey::SettingsServerPort,
            SimulationDefaults::SETTINGS_SERVER_PORT as i64,
        ) {
            Ok(port) if u16::try_from(port).is_ok() => port as u16,
            Ok(port) => {
                warn!(port, "settings-server port out of range, peripheral disabled");
                return Peripherals::new(telemetry, visualization, SettingsControlServer::disabled());
            }
            Err(e) => {
                warn!(error = %e, "settings-server port unreadable, peripheral disabled");
                return Peripherals::new(telemetry, visualization, SettingsControlServer::disabled());
            }
        };
        SettingsControlServer::start(port)
    } else {
        SettingsControlServer::disabled()
    };

    Peripherals::new(telemetry, visualization, settings_server)
}

fn read_enabled(settings: &Settings, key: SettingKey) -> bool {
    match settings.get_bool(key, false) {
        Ok(enabled) => enabled,
        Err(e) => {
            warn!(error = %e, "peripheral enable flag unreadable, treating as disabled");
            false
        }
    }
}

fn read_addr(settings: &Settings, key: SettingKey, default: &str) -> String {
    match settings.get_str(key, default) {
        Ok(addr) => addr,
        Err(e) => {
            warn!(error = %e, default, "peripheral address unreadable, using default");
            default.to_string()
        }
    }
}

/// 运行中的仿真会话
///
/// 由 [`SessionBuilder::build`] 产出，`ready` 为真后才接受 `tick`。
/// 显式 [`shutdown`](Session::shutdown) 或 drop 都会触发拆除。
pub struct Session {
    ctx: Arc<SessionContext>,
    orchestrator: FrameOrchestrator,
    ready: bool,
    torn_down: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("ctx", &self.ctx)
            .field("ready", &self.ready)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// 推进一帧（未就绪或已拆除时为空操作）
    pub fn tick(&mut self, dt: f32) {
        if !self.ready || self.torn_down {
            return;
        }
        self.orchestrator.tick(dt);
    }

    /// 拆除会话（幂等）
    ///
    /// 录制强制收尾 → 外设关闭 → 子系统逆序关闭。
    /// 每一步尽力而为，失败只告警。
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if !self.ready {
            // 从未就绪的会话没有需要释放的运行期资源
            return;
        }
        info!("session teardown started");
        self.orchestrator.teardown();
        info!("session teardown finished");
    }

    pub fn is_ready(&self) -> bool {
        self.ready && !self.torn_down
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn world(&self) -> &WorldState {
        self.orchestrator.world()
    }

    /// 录制预备信号的一个克隆（输入层/远程控制持有）
    pub fn arm_signal(&self) -> ArmSignal {
        self.orchestrator.arm_signal()
    }

    pub fn recording_state(&self) -> RecordingState {
        self.orchestrator.recording().state()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.orchestrator.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.orchestrator.is_paused()
    }

    /// 排队一条一次性通知（本帧之后派发，后写覆盖先写）
    pub fn notify(&mut self, text: impl Into<String>) {
        self.orchestrator.notify(text);
    }

    pub fn telemetry_state(&self) -> ConnectionState {
        self.orchestrator.peripherals().telemetry_state()
    }

    pub fn visualization_state(&self) -> ConnectionState {
        self.orchestrator.peripherals().visualization_state()
    }

    pub fn settings_server_state(&self) -> ConnectionState {
        self.orchestrator.peripherals().settings_server_state()
    }

    pub fn peripherals(&self) -> &Peripherals {
        self.orchestrator.peripherals()
    }

    #[cfg(test)]
    pub(crate) fn force_unready(&mut self) {
        self.ready = false;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_task(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// 注册顺序即依赖序
    #[test]
    fn test_subsystem_registration_order() {
        let file = write_task("");
        let root = tempfile::tempdir().unwrap();
        let session = SessionBuilder::new(file.path())
            .output_root(root.path())
            .build()
            .unwrap();

        let registry = session.orchestrator.registry();
        assert_eq!(
            registry.names(UpdatePhase::Observation),
            vec!["camera", "drivetrain", "panel", "triggers"]
        );
        assert_eq!(
            registry.names(UpdatePhase::Integration),
            vec![
                "vehicle",
                "traffic",
                "audio",
                "steering-task",
                "reaction",
                "effects"
            ]
        );
    }

    /// 驾驶员名回退链
    #[test]
    fn test_driver_name_fallback_chain() {
        let root = tempfile::tempdir().unwrap();

        // 显式参数优先
        let file = write_task("[settings.general]\ndriver_name = \"from-task\"\n");
        let session = SessionBuilder::new(file.path())
            .driver_name("explicit")
            .output_root(root.path())
            .build()
            .unwrap();
        assert_eq!(session.context().driver_name, "explicit");

        // 其次任务设置
        let session = SessionBuilder::new(file.path())
            .output_root(root.path())
            .build()
            .unwrap();
        assert_eq!(session.context().driver_name, "from-task");

        // 最后内置默认
        let empty = write_task("");
        let session = SessionBuilder::new(empty.path())
            .output_root(root.path())
            .build()
            .unwrap();
        assert_eq!(
            session.context().driver_name,
            SimulationDefaults::DRIVER_NAME
        );
    }

    /// 任务加载失败 → 整个启动失败
    #[test]
    fn test_missing_task_fails_build() {
        let err = SessionBuilder::new("no/such/task.toml").build().unwrap_err();
        assert!(matches!(err, SessionError::Task(_)));
    }

    /// 未就绪的会话：tick 为空操作
    #[test]
    fn test_tick_before_ready_is_noop() {
        let file = write_task("");
        let root = tempfile::tempdir().unwrap();
        let mut session = SessionBuilder::new(file.path())
            .output_root(root.path())
            .build()
            .unwrap();
        session.force_unready();

        session.tick(0.016);
        session.tick(0.016);
        assert_eq!(session.world().frame, 0);
    }

    /// 重复拆除是空操作
    #[test]
    fn test_shutdown_idempotent() {
        let file = write_task("");
        let root = tempfile::tempdir().unwrap();
        let mut session = SessionBuilder::new(file.path())
            .output_root(root.path())
            .build()
            .unwrap();
        session.arm_signal().request();
        session.tick(0.016);

        session.shutdown();
        session.shutdown();
        assert!(!session.is_ready());
        assert_eq!(session.orchestrator.recording().destroyed_pairs(), 1);
    }

    /// 重力回退链：场景配置 → 内置默认
    #[test]
    fn test_gravity_fallback() {
        let root = tempfile::tempdir().unwrap();

        let file = write_task("[scene]\ngravity = 3.7\n");
        let session = SessionBuilder::new(file.path())
            .output_root(root.path())
            .build()
            .unwrap();
        assert_eq!(session.context().gravity, 3.7);

        let empty = write_task("");
        let session = SessionBuilder::new(empty.path())
            .output_root(root.path())
            .build()
            .unwrap();
        assert_eq!(session.context().gravity, SimulationDefaults::GRAVITY);
    }
}
