//! 任务加载错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 驾驶任务加载错误
///
/// 任务文件缺失或非法属于启动期致命错误，由会话层决定是否整体中止。
#[derive(Error, Debug)]
pub enum TaskError {
    /// 任务文件不存在
    #[error("Driving task file not found: {0}")]
    NotFound(PathBuf),

    /// 文件读取失败
    #[error("Failed to read driving task: {0}")]
    Io(#[from] std::io::Error),

    /// 任务文件解析失败
    #[error("Failed to parse driving task: {0}")]
    Parse(#[from] toml::de::Error),

    /// 配置值类型与期望不符
    #[error("Setting `{key}` has unexpected type (expected {expected})")]
    SettingType {
        key: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::TaskError;
    use std::path::PathBuf;

    /// 测试 TaskError 的 Display 实现
    #[test]
    fn test_task_error_display() {
        let err = TaskError::NotFound(PathBuf::from("missing.toml"));
        assert!(format!("{err}").contains("missing.toml"));

        let err = TaskError::SettingType {
            key: "scene.gravity",
            expected: "float",
        };
        let msg = format!("{err}");
        assert!(msg.contains("scene.gravity") && msg.contains("float"));
    }
}
