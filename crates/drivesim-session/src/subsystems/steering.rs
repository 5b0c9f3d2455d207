//! 脚本化转向任务子系统
//!
//! 给被试驾驶员布置的标准化转向/跟速任务：正弦转向激励加
//! 分段目标车速。暂停时不推进（任务时间轴与仿真时钟绑定）。

use crate::registry::Subsystem;
use crate::world::WorldState;
use std::f64::consts::TAU;

/// 转向激励振幅（满舵比例）
const STEER_AMPLITUDE: f32 = 0.3;
/// 转向激励频率（Hz）
const STEER_FREQ_HZ: f64 = 0.1;

/// 分段目标车速：(生效时刻 s, 目标 km/h)
const SPEED_SCHEDULE: &[(f64, f32)] = &[(0.0, 30.0), (30.0, 50.0), (90.0, 80.0)];

pub struct SteeringTaskSubsystem {
    driver_name: String,
    announced: bool,
}

impl SteeringTaskSubsystem {
    pub fn new(driver_name: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            announced: false,
        }
    }
}

impl Subsystem for SteeringTaskSubsystem {
    fn name(&self) -> &'static str {
        "steering-task"
    }

    fn update(&mut self, world: &mut WorldState, _dt: f32) {
        if !self.announced {
            self.announced = true;
            world
                .pending_reports
                .push(format!("steering task started for driver `{}`", self.driver_name));
        }

        let t = world.sim_time_s;
        world.vehicle.steering = STEER_AMPLITUDE * (TAU * STEER_FREQ_HZ * t).sin() as f32;

        let target = SPEED_SCHEDULE
            .iter()
            .rev()
            .find(|(start, _)| t >= *start)
            .map(|(_, kmh)| *kmh)
            .unwrap_or(0.0);
        world.vehicle.target_speed_kmh = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 目标车速按时刻切换
    #[test]
    fn test_speed_schedule() {
        let mut task = SteeringTaskSubsystem::new("tester");
        let mut world = WorldState::default();

        world.sim_time_s = 0.0;
        task.update(&mut world, 0.016);
        assert_eq!(world.vehicle.target_speed_kmh, 30.0);

        world.sim_time_s = 45.0;
        task.update(&mut world, 0.016);
        assert_eq!(world.vehicle.target_speed_kmh, 50.0);

        world.sim_time_s = 120.0;
        task.update(&mut world, 0.016);
        assert_eq!(world.vehicle.target_speed_kmh, 80.0);
    }

    /// 首帧上报一次任务开始事件
    #[test]
    fn test_announces_once() {
        let mut task = SteeringTaskSubsystem::new("tester");
        let mut world = WorldState::default();
        task.update(&mut world, 0.016);
        task.update(&mut world, 0.016);
        let announcements = world
            .pending_reports
            .iter()
            .filter(|r| r.contains("steering task started"))
            .count();
        assert_eq!(announcements, 1);
    }
}
