//! 连接层错误类型定义
//!
//! 外设错误从不跨越帧线程边界：连接失败降级为日志告警，
//! I/O 线程内的写错误使连接自行进入 `Closed`。
//! 本类型只在连接层内部及其测试中流转。

use thiserror::Error;

/// 连接层错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    /// 套接字 I/O 错误
    #[error("Link IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 地址无法解析
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),

    /// 快照序列化失败
    #[error("Snapshot encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
