//! 相机子系统
//!
//! 每帧从**上一帧**车辆状态解析相机位姿（观察阶段第一步，
//! 保证 HUD 与外设推送引用同一份已解析位姿）。
//!
//! 两种挂载方式：
//! - 车载：跟随车辆，带固定偏移
//! - 飞行：沿配置路点匀速巡航；路点不足时由生命周期静默
//!   回退为车载挂载，不影响会话就绪

use crate::registry::Subsystem;
use crate::world::WorldState;
use drivesim_task::{CameraFlightConfig, SimulationDefaults};
use nalgebra::{UnitQuaternion, Vector3};
use thiserror::Error;

/// 相机相对车辆的挂载偏移（驾驶舱后上方）
const MOUNT_OFFSET: Vector3<f32> = Vector3::new(0.0, 1.4, -0.5);

/// 飞行路点不足
#[derive(Error, Debug)]
#[error("camera flight needs at least {required} waypoints, got {got}")]
pub struct NotEnoughWaypoints {
    pub got: usize,
    pub required: usize,
}

/// 相机飞行路径（折线匀速巡航）
#[derive(Debug)]
pub struct CameraFlight {
    waypoints: Vec<Vector3<f32>>,
    speed: f32,
    traveled: f32,
    total_len: f32,
}

impl CameraFlight {
    /// 从任务配置构造
    ///
    /// # Errors
    /// 路点数少于 [`SimulationDefaults::MIN_CAMERA_FLIGHT_WAYPOINTS`]
    /// 时返回 [`NotEnoughWaypoints`]，调用方决定回退策略。
    pub fn new(config: &CameraFlightConfig) -> Result<Self, NotEnoughWaypoints> {
        let required = SimulationDefaults::MIN_CAMERA_FLIGHT_WAYPOINTS;
        if config.waypoints.len() < required {
            return Err(NotEnoughWaypoints {
                got: config.waypoints.len(),
                required,
            });
        }
        let waypoints: Vec<Vector3<f32>> = config
            .waypoints
            .iter()
            .map(|w| Vector3::new(w.x, w.y, w.z))
            .collect();
        let total_len = waypoints.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        Ok(Self {
            waypoints,
            speed: config.speed.max(0.1),
            traveled: 0.0,
            total_len,
        })
    }

    /// 推进并返回当前位姿（终点处停住）
    fn advance(&mut self, dt: f32) -> (Vector3<f32>, UnitQuaternion<f32>) {
        self.traveled = (self.traveled + self.speed * dt).min(self.total_len);

        let mut remaining = self.traveled;
        for pair in self.waypoints.windows(2) {
            let segment = pair[1] - pair[0];
            let len = segment.norm();
            if remaining <= len || len == 0.0 {
                let position = if len == 0.0 {
                    pair[0]
                } else {
                    pair[0] + segment * (remaining / len)
                };
                let orientation = look_along(segment);
                return (position, orientation);
            }
            remaining -= len;
        }
        // 终点：朝向沿末段
        let last = *self.waypoints.last().expect("flight has >= 2 waypoints");
        let n = self.waypoints.len();
        let dir = last - self.waypoints[n - 2];
        (last, look_along(dir))
    }
}

fn look_along(dir: Vector3<f32>) -> UnitQuaternion<f32> {
    if dir.norm() == 0.0 {
        UnitQuaternion::identity()
    } else {
        UnitQuaternion::face_towards(&dir, &Vector3::y())
    }
}

/// 挂载方式
enum Mount {
    VehicleAttached,
    Flight(CameraFlight),
}

/// 相机子系统
pub struct CameraSubsystem {
    mount: Mount,
}

impl CameraSubsystem {
    /// 车载挂载
    pub fn vehicle_attached() -> Self {
        Self {
            mount: Mount::VehicleAttached,
        }
    }

    /// 飞行挂载
    pub fn with_flight(flight: CameraFlight) -> Self {
        Self {
            mount: Mount::Flight(flight),
        }
    }

    /// 是否处于飞行挂载（回退断言用）
    pub fn is_flight(&self) -> bool {
        matches!(self.mount, Mount::Flight(_))
    }
}

impl Subsystem for CameraSubsystem {
    fn name(&self) -> &'static str {
        "camera"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        match &mut self.mount {
            Mount::VehicleAttached => {
                // 输入是上一帧的车辆状态
                let vehicle = &world.previous_vehicle;
                world.camera.position = vehicle.position + vehicle.orientation * MOUNT_OFFSET;
                world.camera.orientation = vehicle.orientation;
            }
            Mount::Flight(flight) => {
                let (position, orientation) = flight.advance(dt);
                world.camera.position = position;
                world.camera.orientation = orientation;
            }
        }
    }
}
