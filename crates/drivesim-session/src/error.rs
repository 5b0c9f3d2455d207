//! 会话层错误类型定义
//!
//! 启动期错误（任务加载、输出目录、子系统构造）快速失败；
//! 拆除期错误只记录不再上抛；帧循环内不产生可传播错误。

use drivesim_task::TaskError;
use thiserror::Error;

/// 会话层错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// 驾驶任务加载失败（启动期致命）
    #[error("Driving task error: {0}")]
    Task(#[from] TaskError),

    /// 输出目录 / 录制文件 I/O 失败
    #[error("Session IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 子系统关闭失败（拆除期记录用，不中断拆除）
    #[error("Subsystem `{name}` failed to close: {reason}")]
    SubsystemClose { name: &'static str, reason: String },
}
