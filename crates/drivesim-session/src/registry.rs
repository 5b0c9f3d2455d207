//! 子系统注册表
//!
//! 固定顺序的子系统集合。更新顺序是承载语义的设计不变量：
//! 相机位姿必须先于引用它的 HUD 文本，触发器判定必须看到
//! 移动后的车辆状态。注册顺序即更新顺序，禁止重排。
//!
//! 录制推进与外设推送被强制插在两个阶段之间（见编排器），
//! 因此注册表按阶段分组：
//!
//! - `Observation` - 相机、动力总成、面板、触发器
//! - `Integration` - 车辆、交通、音频、转向任务、反应、效果

use crate::error::SessionError;
use crate::world::WorldState;
use tracing::{error, trace};

/// 帧内更新阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    /// 录制/推送之前：解析派生量（相机、HUD、触发判定）
    Observation,
    /// 录制/推送之后：推进簿记（车辆、交通、音频、任务、效果）
    Integration,
}

/// 可更新子系统
///
/// 注册表拥有各子系统实例（`Box<dyn Subsystem>`），注册表本身
/// 由编排器持有、由生命周期构造和拆除。
pub trait Subsystem {
    /// 子系统名（日志与拆除报告中引用）
    fn name(&self) -> &'static str;

    /// 暂停时是否仍然更新
    ///
    /// 默认不更新：不推进仿真的时间不得出现在任何派生量里。
    /// 相机/面板/触发器/音频等观察类子系统覆写为 true。
    fn runs_while_paused(&self) -> bool {
        false
    }

    /// 逐帧更新
    fn update(&mut self, world: &mut WorldState, dt: f32);

    /// 释放资源（拆除期调用一次，失败不得中断其余拆除）
    fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// 有序子系统注册表
#[derive(Default)]
pub struct SubsystemRegistry {
    observation: Vec<Box<dyn Subsystem>>,
    integration: Vec<Box<dyn Subsystem>>,
    closed: bool,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按阶段追加子系统（同阶段内注册顺序即更新顺序）
    pub fn register(&mut self, phase: UpdatePhase, subsystem: Box<dyn Subsystem>) {
        trace!(phase = ?phase, name = subsystem.name(), "subsystem registered");
        match phase {
            UpdatePhase::Observation => self.observation.push(subsystem),
            UpdatePhase::Integration => self.integration.push(subsystem),
        }
    }

    /// 驱动一个阶段的全部子系统
    ///
    /// 暂停时跳过 `runs_while_paused() == false` 的条目。
    pub fn update_phase(&mut self, phase: UpdatePhase, world: &mut WorldState, dt: f32, paused: bool) {
        let entries = match phase {
            UpdatePhase::Observation => &mut self.observation,
            UpdatePhase::Integration => &mut self.integration,
        };
        for subsystem in entries.iter_mut() {
            if paused && !subsystem.runs_while_paused() {
                continue;
            }
            subsystem.update(world, dt);
        }
    }

    /// 尽力而为的逆序关闭
    ///
    /// 每个失败只记录，绝不中断后续子系统的关闭。幂等。
    /// 返回失败计数（拆除报告用）。
    pub fn close_all(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;
        let mut failures = 0;
        for subsystem in self
            .integration
            .iter_mut()
            .rev()
            .chain(self.observation.iter_mut().rev())
        {
            if let Err(e) = subsystem.close() {
                error!(name = subsystem.name(), "subsystem close failed: {e}");
                failures += 1;
            }
        }
        failures
    }

    /// 一个阶段内的子系统名（顺序断言用）
    pub fn names(&self, phase: UpdatePhase) -> Vec<&'static str> {
        match phase {
            UpdatePhase::Observation => self.observation.iter().map(|s| s.name()).collect(),
            UpdatePhase::Integration => self.integration.iter().map(|s| s.name()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 把调用记到共享日志里的探针子系统
    struct Probe {
        name: &'static str,
        paused_ok: bool,
        log: Rc<RefCell<Vec<String>>>,
        fail_close: bool,
    }

    impl Subsystem for Probe {
        fn name(&self) -> &'static str {
            self.name
        }
        fn runs_while_paused(&self) -> bool {
            self.paused_ok
        }
        fn update(&mut self, _world: &mut WorldState, _dt: f32) {
            self.log.borrow_mut().push(format!("update:{}", self.name));
        }
        fn close(&mut self) -> Result<(), SessionError> {
            self.log.borrow_mut().push(format!("close:{}", self.name));
            if self.fail_close {
                Err(SessionError::SubsystemClose {
                    name: self.name,
                    reason: "synthetic".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn probe(
        name: &'static str,
        paused_ok: bool,
        log: &Rc<RefCell<Vec<String>>>,
        fail_close: bool,
    ) -> Box<Probe> {
        Box::new(Probe {
            name,
            paused_ok,
            log: log.clone(),
            fail_close,
        })
    }

    /// 注册顺序即更新顺序
    #[test]
    fn test_update_order_is_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubsystemRegistry::new();
        registry.register(UpdatePhase::Observation, probe("a", true, &log, false));
        registry.register(UpdatePhase::Observation, probe("b", true, &log, false));
        registry.register(UpdatePhase::Integration, probe("c", true, &log, false));

        let mut world = WorldState::default();
        registry.update_phase(UpdatePhase::Observation, &mut world, 0.016, false);
        registry.update_phase(UpdatePhase::Integration, &mut world, 0.016, false);

        assert_eq!(
            *log.borrow(),
            vec!["update:a", "update:b", "update:c"]
        );
    }

    /// 暂停门控：未声明 runs_while_paused 的子系统被跳过
    #[test]
    fn test_pause_gating() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubsystemRegistry::new();
        registry.register(UpdatePhase::Integration, probe("gated", false, &log, false));
        registry.register(UpdatePhase::Integration, probe("always", true, &log, false));

        let mut world = WorldState::default();
        registry.update_phase(UpdatePhase::Integration, &mut world, 0.016, true);
        assert_eq!(*log.borrow(), vec!["update:always"]);
    }

    /// 逆序关闭、失败不中断、幂等
    #[test]
    fn test_close_all_best_effort_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubsystemRegistry::new();
        registry.register(UpdatePhase::Observation, probe("first", true, &log, false));
        registry.register(UpdatePhase::Integration, probe("middle", true, &log, true));
        registry.register(UpdatePhase::Integration, probe("last", true, &log, false));

        let failures = registry.close_all();
        assert_eq!(failures, 1);
        assert_eq!(
            *log.borrow(),
            vec!["close:last", "close:middle", "close:first"]
        );

        // 第二次关闭是空操作
        assert_eq!(registry.close_all(), 0);
        assert_eq!(log.borrow().len(), 3);
    }
}
