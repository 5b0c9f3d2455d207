//! 视觉/环境效果子系统
//!
//! 天气等效果强度的缓慢周期变化。渲染属于外部协作者，
//! 这里只维护强度标量。

use crate::registry::Subsystem;
use crate::world::WorldState;
use std::f64::consts::TAU;

/// 效果周期（秒）
const CYCLE_S: f64 = 300.0;

pub struct EffectsSubsystem {
    phase: f64,
}

impl EffectsSubsystem {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }
}

impl Default for EffectsSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for EffectsSubsystem {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        self.phase = (self.phase + dt as f64 / CYCLE_S) % 1.0;
        // 0.0 ~ 1.0 的缓慢正弦摆动
        world.effect_intensity = (0.5 + 0.5 * (TAU * self.phase).sin()) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 强度保持在 [0, 1] 并随时间变化
    #[test]
    fn test_intensity_in_range() {
        let mut effects = EffectsSubsystem::new();
        let mut world = WorldState::default();

        let mut seen = Vec::new();
        for _ in 0..100 {
            effects.update(&mut world, 1.0);
            assert!((0.0..=1.0).contains(&world.effect_intensity));
            seen.push(world.effect_intensity);
        }
        assert!(seen.iter().any(|&v| v != seen[0]), "intensity should vary");
    }
}
