//! 事件日志
//!
//! 与数据写入器成对存在的文本日志：触发器报告、任务播报等
//! 带仿真时间戳的一行一事件。

use crate::error::SessionError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// 事件文件名（位于会话输出目录下）
const EVENT_FILE: &str = "events.log";

pub struct EventLogger {
    path: PathBuf,
    out: BufWriter<File>,
    events: u64,
    finished: bool,
}

impl EventLogger {
    pub fn create(output_dir: &Path) -> Result<Self, SessionError> {
        let path = output_dir.join(EVENT_FILE);
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self {
            path,
            out,
            events: 0,
            finished: false,
        })
    }

    /// 记录一条带仿真时间戳的事件文本
    pub fn report_text(&mut self, sim_time_s: f64, text: &str) -> Result<(), SessionError> {
        writeln!(self.out, "[{sim_time_s:.3}] {text}")?;
        self.events += 1;
        Ok(())
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 冲刷并关闭（幂等）
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.out.flush()?;
        info!(events = self.events, path = %self.path.display(), "event log closed");
        Ok(())
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
