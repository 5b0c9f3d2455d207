//! 帧线程独占的世界状态
//!
//! 各子系统在固定顺序下对同一个 [`WorldState`] 做读改写，
//! 外设线程只拿到值快照，从不触碰本结构。
//!
//! 真实的物理求解、场景渲染、交通 AI 都是外部协作者；
//! 这里承载的是编排层可观察的派生量与簿记。

use drivesim_link::{CameraPose, VehicleTelemetry};
use nalgebra::{UnitQuaternion, Vector3};

/// 车辆运动学（编排层视角）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleKinematics {
    /// 位置（m）
    pub position: Vector3<f32>,
    /// 朝向
    pub orientation: UnitQuaternion<f32>,
    /// 车速（km/h）
    pub speed_kmh: f32,
    /// 目标车速（km/h，脚本任务写入，车辆簿记逼近）
    pub target_speed_kmh: f32,
    /// 发动机转速（rpm）
    pub rpm: f32,
    /// 当前挡位
    pub gear: u8,
    /// 方向盘转角（-1.0 ~ 1.0）
    pub steering: f32,
    /// 里程（m）
    pub odometer_m: f64,
}

impl Default for VehicleKinematics {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            speed_kmh: 0.0,
            target_speed_kmh: 0.0,
            rpm: 800.0, // 怠速
            gear: 1,
            steering: 0.0,
            odometer_m: 0.0,
        }
    }
}

/// 相机状态（位姿在观察阶段由上一帧车辆状态解析）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// HUD / 面板状态
#[derive(Debug, Clone, Default)]
pub struct HudState {
    /// 面板文本行（每帧由面板子系统重建）
    pub lines: Vec<String>,
    /// 是否显示统计面板（任务设置解析）
    pub show_stats: bool,
    /// 最近一次派发的一次性通知
    pub last_notification: Option<String>,
}

/// 世界状态
#[derive(Debug, Default)]
pub struct WorldState {
    /// 仿真时钟（秒，暂停时不推进）
    pub sim_time_s: f64,
    /// 已推进的帧数（暂停时不推进）
    pub frame: u64,
    /// 当前帧车辆状态
    pub vehicle: VehicleKinematics,
    /// 上一帧车辆状态（相机位姿的输入）
    pub previous_vehicle: VehicleKinematics,
    /// 相机状态
    pub camera: CameraState,
    /// HUD
    pub hud: HudState,
    /// 本帧待写入事件日志的文本（触发器等产生，录制会话消费）
    pub pending_reports: Vec<String>,
    /// 环境音量（0.0 ~ 1.0，音频子系统维护）
    pub ambient_level: f32,
    /// 天气/视觉效果强度（0.0 ~ 1.0）
    pub effect_intensity: f32,
    /// 交通代理位置（沿道路的一维弧长，m）
    pub traffic_positions: Vec<f32>,
    /// 反应测量：待响应刺激的已持续时长（秒）
    pub pending_stimulus_s: Option<f64>,
    /// 最近一次完成的反应时长（秒）
    pub last_reaction_s: Option<f64>,
}

impl WorldState {
    /// 车辆遥测快照（CAN 遥测桥线路格式）
    pub fn telemetry_snapshot(&self) -> VehicleTelemetry {
        let q = self.vehicle.orientation.quaternion();
        VehicleTelemetry {
            sim_time_s: self.sim_time_s,
            position: self.vehicle.position.into(),
            orientation: [q.w, q.i, q.j, q.k],
            speed_kmh: self.vehicle.speed_kmh,
            rpm: self.vehicle.rpm,
            steering: self.vehicle.steering,
        }
    }

    /// 相机位姿快照（外部可视化线路格式）
    pub fn camera_snapshot(&self) -> CameraPose {
        let q = self.camera.orientation.quaternion();
        CameraPose {
            sim_time_s: self.sim_time_s,
            position: self.camera.position.into(),
            orientation: [q.w, q.i, q.j, q.k],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 快照是值复制，与世界状态脱钩
    #[test]
    fn test_snapshots_are_value_copies() {
        let mut world = WorldState::default();
        world.vehicle.position = Vector3::new(1.0, 2.0, 3.0);
        world.vehicle.speed_kmh = 80.0;
        world.sim_time_s = 4.2;

        let snap = world.telemetry_snapshot();
        world.vehicle.position.x = 99.0;

        assert_eq!(snap.position, [1.0, 2.0, 3.0]);
        assert_eq!(snap.speed_kmh, 80.0);
        assert_eq!(snap.sim_time_s, 4.2);
        // 单位四元数 → (w, x, y, z)
        assert_eq!(snap.orientation, [1.0, 0.0, 0.0, 0.0]);
    }
}
