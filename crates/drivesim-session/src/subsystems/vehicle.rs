//! 车辆簿记子系统
//!
//! 物理近旁的簿记：按当前朝向推进位置、更新里程、让车速向
//! 目标车速收敛（原型中的速度控制中心折叠于此）、按方向盘
//! 转角积累偏航。真实的轮胎/悬架求解属于外部物理引擎。

use crate::registry::Subsystem;
use crate::world::WorldState;
use nalgebra::{UnitQuaternion, Vector3};

/// 车速收敛系数（1/s）
const SPEED_RESPONSE: f32 = 0.8;
/// 满舵偏航速率（rad/s，随速度缩放）
const YAW_RATE: f32 = 0.6;

pub struct VehicleSubsystem;

impl VehicleSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VehicleSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for VehicleSubsystem {
    fn name(&self) -> &'static str {
        "vehicle"
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        let v = &mut world.vehicle;

        // 速度控制：向目标车速一阶收敛
        let alpha = (SPEED_RESPONSE * dt).min(1.0);
        v.speed_kmh += (v.target_speed_kmh - v.speed_kmh) * alpha;

        // 偏航：满舵 YAW_RATE，低速时按比例衰减
        let speed_ms = v.speed_kmh / 3.6;
        let speed_factor = (speed_ms / 10.0).min(1.0);
        let yaw = -v.steering * YAW_RATE * speed_factor * dt;
        v.orientation = v.orientation * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw);

        // 位置与里程
        let forward = v.orientation * Vector3::new(0.0, 0.0, 1.0);
        v.position += forward * speed_ms * dt;
        v.odometer_m += (speed_ms * dt) as f64;
    }
}
