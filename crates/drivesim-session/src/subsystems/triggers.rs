//! 触发器子系统
//!
//! 对任务定义的球形触发区做进入判定。必须在观察阶段末尾运行：
//! 判定要看到本帧已解析的（即上一帧积分后的）车辆位置。
//! 进入沿触发一次，离开后重新武装。

use crate::registry::Subsystem;
use crate::world::WorldState;
use drivesim_task::TriggerDef;
use nalgebra::Vector3;
use tracing::info;

struct ArmedTrigger {
    def: TriggerDef,
    center: Vector3<f32>,
    inside: bool,
}

pub struct TriggerSubsystem {
    triggers: Vec<ArmedTrigger>,
    /// 已触发总次数（反应测量和统计引用）
    fired_count: u64,
}

impl TriggerSubsystem {
    pub fn new(defs: &[TriggerDef]) -> Self {
        Self {
            triggers: defs
                .iter()
                .map(|def| ArmedTrigger {
                    center: Vector3::new(def.position.x, def.position.y, def.position.z),
                    def: def.clone(),
                    inside: false,
                })
                .collect(),
            fired_count: 0,
        }
    }

    pub fn fired_count(&self) -> u64 {
        self.fired_count
    }
}

impl Subsystem for TriggerSubsystem {
    fn name(&self) -> &'static str {
        "triggers"
    }

    fn runs_while_paused(&self) -> bool {
        true
    }

    fn update(&mut self, world: &mut WorldState, _dt: f32) {
        let position = world.vehicle.position;
        for trigger in &mut self.triggers {
            let within = (position - trigger.center).norm() <= trigger.def.radius;
            if within && !trigger.inside {
                trigger.inside = true;
                self.fired_count += 1;
                let report = trigger
                    .def
                    .report
                    .clone()
                    .unwrap_or_else(|| format!("trigger `{}` hit", trigger.def.name));
                info!(trigger = %trigger.def.name, "trigger fired");
                world.pending_reports.push(report);
                // 为反应测量布置刺激（已有待响应刺激时不覆盖）
                if world.pending_stimulus_s.is_none() {
                    world.pending_stimulus_s = Some(0.0);
                }
            } else if !within && trigger.inside {
                trigger.inside = false;
            }
        }
    }
}
