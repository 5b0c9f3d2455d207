//! 反应测量子系统
//!
//! 触发器布置刺激（`pending_stimulus_s`），被试以明显的转向
//! 变化作答；本子系统计时并记录最近一次反应时长。

use crate::registry::Subsystem;
use crate::world::WorldState;
use tracing::debug;

/// 认定为"作答"的转向变化阈值
const RESPONSE_THRESHOLD: f32 = 0.15;
/// 超时放弃的刺激（秒）
const STIMULUS_TIMEOUT_S: f64 = 10.0;

pub struct ReactionSubsystem {
    last_steering: f32,
}

impl ReactionSubsystem {
    pub fn new() -> Self {
        Self { last_steering: 0.0 }
    }
}

impl Default for ReactionSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for ReactionSubsystem {
    fn name(&self) -> &'static str {
        "reaction"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        let steering = world.vehicle.steering;
        let delta = (steering - self.last_steering).abs();
        self.last_steering = steering;

        if let Some(elapsed) = world.pending_stimulus_s.as_mut() {
            *elapsed += dt as f64;
            if delta >= RESPONSE_THRESHOLD {
                let reaction = *elapsed;
                world.last_reaction_s = Some(reaction);
                world.pending_stimulus_s = None;
                debug!(reaction_s = reaction, "reaction measured");
            } else if *elapsed > STIMULUS_TIMEOUT_S {
                world.pending_stimulus_s = None;
                debug!("stimulus timed out without response");
            }
        }
    }
}
