//! 内置默认值
//!
//! 所有配置回退链的最后一环：显式参数 → 任务设置 → 本模块常量。

/// 仿真内置默认值（只读常量集合）
pub struct SimulationDefaults;

impl SimulationDefaults {
    /// 默认驾驶员名称
    pub const DRIVER_NAME: &'static str = "default-driver";

    /// 默认重力加速度（m/s²）
    pub const GRAVITY: f32 = 9.81;

    /// 分析数据输出根目录
    pub const ANALYZER_DATA_ROOT: &'static str = "analyzer_data";

    /// 相机飞行路径的最少路点数
    ///
    /// 低于该值时会话回退为车载相机而不是启动失败。
    pub const MIN_CAMERA_FLIGHT_WAYPOINTS: usize = 2;

    /// CAN 遥测桥默认地址
    pub const TELEMETRY_ADDR: &'static str = "127.0.0.1:5678";

    /// 外部可视化客户端默认地址
    pub const VISUALIZATION_ADDR: &'static str = "127.0.0.1:1234";

    /// 设置控制服务器默认监听端口
    pub const SETTINGS_SERVER_PORT: u16 = 5021;
}
