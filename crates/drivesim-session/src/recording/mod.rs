//! 录制段管理
//!
//! 数据写入器与事件日志严格成对创建/销毁，由一个带一帧迟滞的
//! 状态机驱动：解除请求先进入 Draining，下一帧确认仍未请求才
//! 真正销毁。录制请求与解除之间的抖动因此不会产生半开的资源对。

mod capture;
mod data_writer;
mod event_log;

pub use data_writer::DataWriter;
pub use event_log::EventLogger;

use crate::context::SessionContext;
use crate::world::WorldState;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// 录制段状态（对外只读视图）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// 无资源对存在
    Inactive,
    /// 资源对存在且逐帧追加
    Active,
    /// 已观察到解除请求，资源对保留到下一帧确认
    Draining,
}

struct WriterPair {
    writer: DataWriter,
    events: EventLogger,
}

pub struct RecordingSession {
    output_dir: PathBuf,
    driver_name: String,
    task_id: String,
    state: RecordingState,
    pair: Option<WriterPair>,
    constructed: u32,
    destroyed: u32,
}

impl RecordingSession {
    pub fn new(ctx: &SessionContext) -> Self {
        Self {
            output_dir: ctx.output_dir.clone(),
            driver_name: ctx.driver_name.clone(),
            task_id: ctx.task.id(),
            state: RecordingState::Inactive,
            pair: None,
            constructed: 0,
            destroyed: 0,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// 迄今创建过的资源对数
    pub fn constructed_pairs(&self) -> u32 {
        self.constructed
    }

    /// 迄今销毁过的资源对数
    pub fn destroyed_pairs(&self) -> u32 {
        self.destroyed
    }

    /// 当前资源对已写入的行数（无资源对时为 0）
    pub fn rows_written(&self) -> u64 {
        self.pair.as_ref().map_or(0, |p| p.writer.rows())
    }

    /// 每帧推进一次状态机
    ///
    /// `armed` 为本帧观察到的录制请求。追加与事件落盘只在
    /// Active 且未暂停时发生；待上报事件无论何种状态都会被取走，
    /// 不会跨帧堆积。
    pub fn advance(&mut self, armed: bool, world: &mut WorldState, paused: bool) {
        let reports = std::mem::take(&mut world.pending_reports);

        match self.state {
            RecordingState::Inactive => {
                if armed {
                    match self.construct_pair() {
                        Ok(pair) => {
                            self.pair = Some(pair);
                            self.constructed += 1;
                            self.state = RecordingState::Active;
                            info!(pair = self.constructed, "recording started");
                        }
                        Err(e) => {
                            warn!(error = %e, "recording could not start, staying inactive");
                            return;
                        }
                    }
                } else {
                    return;
                }
            }
            RecordingState::Active => {
                if !armed {
                    // 迟滞第一帧：保留资源对，等下一帧确认
                    self.state = RecordingState::Draining;
                    debug!("recording draining");
                }
            }
            RecordingState::Draining => {
                if armed {
                    // 迟滞窗口内重新请求：同一资源对继续使用
                    self.state = RecordingState::Active;
                    debug!("recording resumed within drain window");
                } else {
                    self.release_pair();
                    return;
                }
            }
        }

        if self.state == RecordingState::Active
            && !paused
            && let Some(pair) = self.pair.as_mut()
        {
            if let Err(e) = pair.writer.append(world) {
                warn!(error = %e, "data row dropped");
            }
            for text in &reports {
                if let Err(e) = pair.events.report_text(world.sim_time_s, text) {
                    warn!(error = %e, "event report dropped");
                }
            }
        }
    }

    /// 立即结束录制段，跳过迟滞（用于会话收尾）
    pub fn force_drain(&mut self) {
        if self.pair.is_some() {
            self.release_pair();
        }
        self.state = RecordingState::Inactive;
    }

    fn construct_pair(&self) -> Result<WriterPair, crate::error::SessionError> {
        let writer = DataWriter::create(&self.output_dir, &self.driver_name, &self.task_id)?;
        let events = EventLogger::create(&self.output_dir)?;
        Ok(WriterPair { writer, events })
    }

    fn release_pair(&mut self) {
        if let Some(mut pair) = self.pair.take() {
            if let Err(e) = pair.writer.finish() {
                warn!(error = %e, "data writer close failed");
            }
            if let Err(e) = pair.events.finish() {
                warn!(error = %e, "event log close failed");
            }
            self.destroyed += 1;
            info!(pair = self.destroyed, "recording stopped");
        }
        self.state = RecordingState::Inactive;
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.force_drain();
    }
}
