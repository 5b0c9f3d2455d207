//! 动力总成子系统
//!
//! 转速积分与换挡簿记。真实的传动模型属于车辆动力学（外部），
//! 这里维护 HUD 与遥测引用的 rpm/gear 派生量。暂停时不推进。

use crate::registry::Subsystem;
use crate::world::WorldState;

/// 怠速转速
const IDLE_RPM: f32 = 800.0;
/// 换挡上限转速
const SHIFT_UP_RPM: f32 = 4500.0;
/// 一阶响应系数（1/s）
const RPM_RESPONSE: f32 = 3.0;
/// 每挡每 km/h 对应的转速增量
const RPM_PER_KMH: f32 = 180.0;

pub struct DrivetrainSubsystem;

impl DrivetrainSubsystem {
    pub fn new() -> Self {
        Self
    }

    fn target_rpm(speed_kmh: f32, gear: u8) -> f32 {
        IDLE_RPM + speed_kmh * RPM_PER_KMH / gear.max(1) as f32
    }
}

impl Default for DrivetrainSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for DrivetrainSubsystem {
    fn name(&self) -> &'static str {
        "drivetrain"
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        let v = &mut world.vehicle;

        // 挡位：超转升挡，低转降挡
        let mut target = Self::target_rpm(v.speed_kmh, v.gear);
        while target > SHIFT_UP_RPM && v.gear < 6 {
            v.gear += 1;
            target = Self::target_rpm(v.speed_kmh, v.gear);
        }
        while target < IDLE_RPM * 1.2 && v.gear > 1 {
            v.gear -= 1;
            target = Self::target_rpm(v.speed_kmh, v.gear);
        }

        // 一阶逼近目标转速
        let alpha = (RPM_RESPONSE * dt).min(1.0);
        v.rpm += (target - v.rpm) * alpha;
    }
}
