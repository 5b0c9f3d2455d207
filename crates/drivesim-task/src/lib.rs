//! # Drivesim Task - 驾驶任务配置层
//!
//! 驾驶任务（driving task）描述一次仿真会话的全部静态输入：
//! 场景参数、情景定义、交互触发器以及运行时设置。
//!
//! **依赖原则**: 本 crate 不依赖会话核心（`drivesim-session`），
//! 会话核心只通过 [`DrivingTask`] 的只读接口消费配置。
//!
//! ## 包含模块
//!
//! - `task` - 任务文件加载与各配置段（scene/scenario/interaction）
//! - `settings` - 类型化设置查询（`get_*(key, default)`）
//! - `defaults` - 内置默认值（所有回退链的最后一环）
//! - `error` - 加载错误类型

mod defaults;
mod error;
mod settings;
mod task;

pub use defaults::SimulationDefaults;
pub use error::TaskError;
pub use settings::{SettingKey, Settings};
pub use task::{
    CameraFlightConfig, DrivingTask, InteractionSection, SceneSection, ScenarioSection,
    TriggerDef, Waypoint,
};
