//! 类型化设置查询
//!
//! 任务文件的 `[settings]` 段是一棵自由形式的 TOML 表，
//! 会话核心通过 [`SettingKey`] 枚举 + 默认值访问，从不直接触碰路径字符串。
//!
//! # 设计原则
//!
//! - **带默认值读取**: 缺失的键永远不是错误，回退到调用方给出的默认值
//! - **类型检查**: 键存在但类型不符时返回 `TaskError::SettingType`
//!   （配置笔误应尽早暴露，而不是静默回退）

use crate::error::TaskError;
use serde::Deserialize;
use tracing::debug;

/// 设置键（点分路径）
///
/// 集中声明所有会话核心会查询的设置项，避免散落的魔法字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    /// 默认驾驶员名称
    GeneralDriverName,
    /// 是否显示统计面板
    GeneralShowStats,
    /// 是否开启 CAN 遥测桥连接
    TelemetryEnableConnection,
    /// CAN 遥测桥地址（host:port）
    TelemetryAddr,
    /// 是否开启外部可视化连接
    VisualizationEnableConnection,
    /// 外部可视化地址（host:port）
    VisualizationAddr,
    /// 是否启动设置控制服务器
    SettingsServerStart,
    /// 设置控制服务器监听端口
    SettingsServerPort,
}

impl SettingKey {
    /// 返回 TOML 表中的点分路径
    pub fn path(self) -> &'static str {
        match self {
            SettingKey::GeneralDriverName => "general.driver_name",
            SettingKey::GeneralShowStats => "general.show_stats",
            SettingKey::TelemetryEnableConnection => "telemetry.enable_connection",
            SettingKey::TelemetryAddr => "telemetry.addr",
            SettingKey::VisualizationEnableConnection => "visualization.enable_connection",
            SettingKey::VisualizationAddr => "visualization.addr",
            SettingKey::SettingsServerStart => "settings_server.start",
            SettingKey::SettingsServerPort => "settings_server.port",
        }
    }
}

/// 任务设置表
///
/// 包装 `[settings]` 段的原始 TOML 表，提供带默认值的类型化读取。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    table: toml::value::Table,
}

impl Settings {
    /// 从已解析的 TOML 表构造（测试用）
    pub fn from_table(table: toml::value::Table) -> Self {
        Self { table }
    }

    /// 按点分路径查找原始值
    fn lookup(&self, key: SettingKey) -> Option<&toml::Value> {
        let mut current: Option<&toml::Value> = None;
        for segment in key.path().split('.') {
            let table = match current {
                None => &self.table,
                Some(toml::Value::Table(t)) => t,
                Some(_) => return None,
            };
            current = table.get(segment);
            current?;
        }
        current
    }

    /// 读取布尔设置
    pub fn get_bool(&self, key: SettingKey, default: bool) -> Result<bool, TaskError> {
        match self.lookup(key) {
            None => {
                debug!(key = key.path(), default, "setting not present, using default");
                Ok(default)
            }
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(_) => Err(TaskError::SettingType {
                key: key.path(),
                expected: "bool",
            }),
        }
    }

    /// 读取字符串设置
    pub fn get_str(&self, key: SettingKey, default: &str) -> Result<String, TaskError> {
        match self.lookup(key) {
            None => Ok(default.to_string()),
            Some(toml::Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(TaskError::SettingType {
                key: key.path(),
                expected: "string",
            }),
        }
    }

    /// 读取整数设置
    pub fn get_int(&self, key: SettingKey, default: i64) -> Result<i64, TaskError> {
        match self.lookup(key) {
            None => Ok(default),
            Some(toml::Value::Integer(i)) => Ok(*i),
            Some(_) => Err(TaskError::SettingType {
                key: key.path(),
                expected: "integer",
            }),
        }
    }
}
