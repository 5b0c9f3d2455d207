//! 交通代理簿记子系统
//!
//! 交通 AI 属于外部协作者；这里推进各代理沿道路弧长的位置，
//! 供触发器/遥测等引用。暂停时不推进。

use crate::registry::Subsystem;
use crate::world::WorldState;

struct Agent {
    arc_pos_m: f32,
    speed_ms: f32,
}

pub struct TrafficSubsystem {
    agents: Vec<Agent>,
}

impl TrafficSubsystem {
    /// 按情景配置生成代理（沿道路均匀铺开，车速错开）
    pub fn new(agent_count: u32) -> Self {
        let agents = (0..agent_count)
            .map(|i| Agent {
                arc_pos_m: i as f32 * 50.0,
                speed_ms: 8.0 + (i % 4) as f32 * 2.0,
            })
            .collect();
        Self { agents }
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

impl Subsystem for TrafficSubsystem {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn update(&mut self, world: &mut WorldState, dt: f32) {
        for agent in &mut self.agents {
            agent.arc_pos_m += agent.speed_ms * dt;
        }
        world.traffic_positions.clear();
        world
            .traffic_positions
            .extend(self.agents.iter().map(|a| a.arc_pos_m));
    }
}
