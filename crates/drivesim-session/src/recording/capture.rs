//! 采集硬件句柄
//!
//! 数据写入器随身携带的硬件采集资源（麦克风、相机抓帧）。
//! 实际的编码/设备访问属于外部协作者；这里保证的是生命周期：
//! 随写入器成对创建，`finish()` 恰好释放一次。

use tracing::debug;

/// 麦克风录音句柄
#[derive(Debug)]
pub struct MicRecorder {
    active: bool,
}

impl MicRecorder {
    pub fn attach() -> Self {
        debug!("microphone recorder attached");
        Self { active: true }
    }

    /// 停止采集并释放设备（幂等）
    pub fn finish(&mut self) {
        if self.active {
            self.active = false;
            debug!("microphone recorder released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// 相机抓帧句柄
#[derive(Debug)]
pub struct FrameGrabber {
    active: bool,
}

impl FrameGrabber {
    pub fn attach() -> Self {
        debug!("frame grabber attached");
        Self { active: true }
    }

    /// 停止抓帧并释放设备（幂等）
    pub fn finish(&mut self) {
        if self.active {
            self.active = false;
            debug!("frame grabber released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
