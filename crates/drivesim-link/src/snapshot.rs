//! 外设线路快照类型
//!
//! 推送给外设的都是值快照而非活引用：帧线程把当前状态复制进
//! 快照后即与其脱钩，I/O 线程随后按 JSON 行写出。
//! 字段布局即线路格式，各外设的对端协议模块据此解码。

use serde::{Deserialize, Serialize};

/// 车辆运动学快照（CAN 遥测桥）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTelemetry {
    /// 仿真时钟（秒）
    pub sim_time_s: f64,
    /// 位置（m）
    pub position: [f32; 3],
    /// 朝向四元数（w, x, y, z）
    pub orientation: [f32; 4],
    /// 车速（km/h）
    pub speed_kmh: f32,
    /// 发动机转速（rpm）
    pub rpm: f32,
    /// 方向盘转角（-1.0 ~ 1.0）
    pub steering: f32,
}

/// 相机位姿快照（外部可视化）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// 仿真时钟（秒）
    pub sim_time_s: f64,
    /// 相机位置（m）
    pub position: [f32; 3],
    /// 相机朝向四元数（w, x, y, z）
    pub orientation: [f32; 4],
}

/// 会话状态快照（设置控制服务器的出站推送）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// 是否暂停
    pub paused: bool,
    /// 录制是否激活
    pub recording: bool,
    /// 已推进的帧数
    pub frame: u64,
}
