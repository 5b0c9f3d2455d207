//! 面板 / HUD 子系统
//!
//! 每帧用**已解析**的最新状态重建面板文本。必须排在相机之后：
//! 面板引用的相机派生值属于本帧，不得出现陈旧位姿。
//! 暂停时继续刷新（面板要显示暂停状态本身）。

use crate::registry::Subsystem;
use crate::world::WorldState;

pub struct PanelSubsystem {
    show_stats: bool,
}

impl PanelSubsystem {
    pub fn new(show_stats: bool) -> Self {
        Self { show_stats }
    }
}

impl Subsystem for PanelSubsystem {
    fn name(&self) -> &'static str {
        "panel"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, _dt: f32) {
        let v = &world.vehicle;
        let c = &world.camera;

        world.hud.show_stats = self.show_stats;
        world.hud.lines.clear();
        world.hud.lines.push(format!("{:.0} km/h", v.speed_kmh));
        world
            .hud
            .lines
            .push(format!("{:.0} rpm  gear {}", v.rpm, v.gear));
        world.hud.lines.push(format!(
            "cam ({:.1}, {:.1}, {:.1})",
            c.position.x, c.position.y, c.position.z
        ));
        if self.show_stats {
            world.hud.lines.push(format!(
                "frame {}  t={:.2}s  odo {:.0} m",
                world.frame, world.sim_time_s, v.odometer_m
            ));
        }
    }
}
