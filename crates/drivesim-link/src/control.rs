//! 运行时控制请求
//!
//! 设置控制服务器接收的入站指令。文本行协议，一行一条：
//!
//! ```text
//! pause on
//! pause off
//! record on
//! record off
//! notify <text>
//! ```
//!
//! 无法解析的行记录告警后丢弃，绝不中断监听循环。

/// 对端发来的控制请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// 暂停 / 恢复仿真
    SetPaused(bool),
    /// 预备 / 撤销录制
    SetRecording(bool),
    /// 排队一条一次性 UI 通知
    Notify(String),
}

impl ControlRequest {
    /// 解析一行控制指令
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v, r.trim()),
            None => (line, ""),
        };
        match verb {
            "pause" => parse_on_off(rest).map(ControlRequest::SetPaused),
            "record" => parse_on_off(rest).map(ControlRequest::SetRecording),
            "notify" if !rest.is_empty() => Some(ControlRequest::Notify(rest.to_string())),
            _ => None,
        }
    }
}

fn parse_on_off(arg: &str) -> Option<bool> {
    match arg {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}
