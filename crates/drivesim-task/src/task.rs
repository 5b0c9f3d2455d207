//! 任务文件加载与配置段定义
//!
//! 任务文件为 TOML 格式，分四段：
//!
//! - `[scene]` - 场景常量（重力、相机飞行路径）
//! - `[scenario]` - 情景定义（出生点、交通代理数量）
//! - `[[interaction.trigger]]` - 交互触发器列表
//! - `[settings]` - 自由形式运行时设置（见 [`Settings`](crate::Settings)）
//!
//! 会话核心只持有加载完成的 [`DrivingTask`]，从不接触文件格式本身。

use crate::error::TaskError;
use crate::settings::Settings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 路点（相机飞行路径的一个节点）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 相机飞行配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraFlightConfig {
    /// 路点列表（少于最小数量时会话回退为车载相机）
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    /// 飞行速度（m/s）
    #[serde(default = "CameraFlightConfig::default_speed")]
    pub speed: f32,
}

impl CameraFlightConfig {
    fn default_speed() -> f32 {
        10.0
    }
}

/// 场景段
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSection {
    /// 重力加速度（m/s²），缺省时由会话层回退到内置默认
    pub gravity: Option<f32>,
    /// 相机飞行配置
    #[serde(default)]
    pub camera_flight: CameraFlightConfig,
}

impl Default for SceneSection {
    fn default() -> Self {
        Self {
            gravity: None,
            camera_flight: CameraFlightConfig::default(),
        }
    }
}

/// 情景段
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSection {
    /// 车辆出生点
    #[serde(default)]
    pub start_position: Option<Waypoint>,
    /// 出生朝向（绕 Y 轴，度）
    #[serde(default)]
    pub start_heading_deg: f32,
    /// 交通代理数量
    #[serde(default)]
    pub traffic_count: u32,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            start_position: None,
            start_heading_deg: 0.0,
            traffic_count: 0,
        }
    }
}

/// 触发器定义
///
/// 触发器是以路面上一点为圆心的球形区域，车辆进入时记录一次事件。
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerDef {
    /// 触发器名称（事件日志中引用）
    pub name: String,
    /// 圆心
    pub position: Waypoint,
    /// 半径（m）
    pub radius: f32,
    /// 触发时上报的文本
    #[serde(default)]
    pub report: Option<String>,
}

/// 交互段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionSection {
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerDef>,
}

/// 原始任务文件结构（仅用于反序列化）
#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default)]
    scene: SceneSection,
    #[serde(default)]
    scenario: ScenarioSection,
    #[serde(default)]
    interaction: InteractionSection,
    #[serde(default)]
    settings: Settings,
}

/// 加载完成的驾驶任务
///
/// 只读配置对象，启动后通过 `Arc` 共享给各子系统。
#[derive(Debug)]
pub struct DrivingTask {
    /// 任务文件路径（录制元数据中引用）
    path: PathBuf,
    scene: SceneSection,
    scenario: ScenarioSection,
    interaction: InteractionSection,
    settings: Settings,
}

impl DrivingTask {
    /// 从文件加载驾驶任务
    ///
    /// # Errors
    /// - `TaskError::NotFound`: 文件不存在
    /// - `TaskError::Io` / `TaskError::Parse`: 读取或解析失败
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TaskError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TaskError::NotFound(path.to_path_buf()));
        }
        let raw_text = std::fs::read_to_string(path)?;
        let raw: RawTask = toml::from_str(&raw_text)?;
        info!(task = %path.display(), "driving task loaded");
        Ok(Self {
            path: path.to_path_buf(),
            scene: raw.scene,
            scenario: raw.scenario,
            interaction: raw.interaction,
            settings: raw.settings,
        })
    }

    /// 判断路径是否指向可加载的驾驶任务
    ///
    /// 入口参数解析用：无效时进入任务选择流程而不是直接失败。
    pub fn is_valid(path: impl AsRef<Path>) -> bool {
        Self::load(path).is_ok()
    }

    /// 任务文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 任务标识（文件名，录制元数据中引用）
    pub fn id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed-task".to_string())
    }

    pub fn scene(&self) -> &SceneSection {
        &self.scene
    }

    pub fn scenario(&self) -> &ScenarioSection {
        &self.scenario
    }

    pub fn interaction(&self) -> &InteractionSection {
        &self.interaction
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
