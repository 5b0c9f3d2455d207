//! 会话上下文
//!
//! 原型系统里散落的全局静态访问器（驾驶员名、输出目录、重力常量）
//! 在这里收拢为一个显式传递的上下文对象：启动期一次写入，
//! `ready` 之后各子系统经 `Arc` 只读共享，无需任何锁。

use chrono::Local;
use drivesim_task::DrivingTask;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 会话常量（写一次 / 多处读）
#[derive(Debug)]
pub struct SessionContext {
    /// 加载完成的驾驶任务
    pub task: Arc<DrivingTask>,
    /// 驾驶员标识（回退链：显式参数 → 任务设置 → 内置默认）
    pub driver_name: String,
    /// 本次会话的输出目录（启动时以时间戳创建）
    pub output_dir: PathBuf,
    /// 重力加速度（m/s²，启动期从场景配置解析一次）
    pub gravity: f32,
}

impl SessionContext {
    /// 在分析数据根目录下创建本次会话的时间戳输出目录
    pub(crate) fn create_output_dir(root: &Path) -> std::io::Result<PathBuf> {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let dir = root.join(stamp);
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "session output directory created");
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 输出目录按时间戳创建且可嵌套
    #[test]
    fn test_create_output_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = SessionContext::create_output_dir(root.path()).unwrap();
        assert!(dir.is_dir());
        assert!(dir.starts_with(root.path()));
        // 目录名形如 2026-08-23_14-05-33
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name.len(), "0000-00-00_00-00-00".len());
    }
}
