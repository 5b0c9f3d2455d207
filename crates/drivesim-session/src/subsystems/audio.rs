//! 音频簿记子系统
//!
//! 暂停时也要更新：环境音与 UI 音效必须保持响应
//! （混音本身属于外部协作者）。

use crate::registry::Subsystem;
use crate::world::WorldState;

/// 音量收敛系数（1/s）
const LEVEL_RESPONSE: f32 = 2.0;
/// 基础环境音量
const BASE_LEVEL: f32 = 0.2;

pub struct AudioSubsystem;

impl AudioSubsystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AudioSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for AudioSubsystem {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        // 环境音量随车速抬升，向目标一阶收敛
        let target = (BASE_LEVEL + world.vehicle.speed_kmh / 200.0).min(1.0);
        let alpha = (LEVEL_RESPONSE * dt).min(1.0);
        world.ambient_level += (target - world.ambient_level) * alpha;
    }
}
