//! 行车数据写入器
//!
//! 每个录制段对应一个写入器实例：创建时打开 `drive_data.csv`
//! 并写入表头，逐帧追加一行，`finish()` 冲刷文件并释放随身的
//! 采集硬件句柄。

use crate::error::SessionError;
use crate::recording::capture::{FrameGrabber, MicRecorder};
use crate::world::WorldState;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// 数据文件名（位于会话输出目录下）
const DATA_FILE: &str = "drive_data.csv";

const HEADER: &str = "sim_time_s;frame;pos_x;pos_y;pos_z;speed_kmh;rpm;gear;steering;odometer_m";

pub struct DataWriter {
    path: PathBuf,
    out: BufWriter<File>,
    mic: MicRecorder,
    grabber: FrameGrabber,
    rows: u64,
    finished: bool,
}

impl DataWriter {
    /// 打开数据文件并占用采集硬件
    pub fn create(output_dir: &Path, driver_name: &str, task_id: &str) -> Result<Self, SessionError> {
        let path = output_dir.join(DATA_FILE);
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "# driver: {driver_name}")?;
        writeln!(out, "# task: {task_id}")?;
        writeln!(out, "{HEADER}")?;

        info!(path = %path.display(), "data writer opened");
        Ok(Self {
            path,
            out,
            mic: MicRecorder::attach(),
            grabber: FrameGrabber::attach(),
            rows: 0,
            finished: false,
        })
    }

    /// 追加当前帧的一行记录
    pub fn append(&mut self, world: &WorldState) -> Result<(), SessionError> {
        let v = &world.vehicle;
        writeln!(
            self.out,
            "{:.3};{};{:.3};{:.3};{:.3};{:.2};{:.0};{};{:.3};{:.1}",
            world.sim_time_s,
            world.frame,
            v.position.x,
            v.position.y,
            v.position.z,
            v.speed_kmh,
            v.rpm,
            v.gear,
            v.steering,
            v.odometer_m,
        )?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 冲刷文件并释放采集硬件（幂等）
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.mic.finish();
        self.grabber.finish();
        self.out.flush()?;
        info!(rows = self.rows, path = %self.path.display(), "data writer closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn captures_active(&self) -> bool {
        self.mic.is_active() || self.grabber.is_active()
    }
}

impl Drop for DataWriter {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DataWriter::create(dir.path(), "tester", "demo-task").unwrap();

        let mut world = WorldState::default();
        world.sim_time_s = 1.5;
        world.frame = 90;
        writer.append(&world).unwrap();
        writer.finish().unwrap();

        let text = std::fs::read_to_string(dir.path().join(DATA_FILE)).unwrap();
        assert!(text.contains("# driver: tester"));
        assert!(text.contains(HEADER));
        assert!(text.contains("1.500;90;"));
        assert_eq!(writer.rows(), 1);
    }

    /// finish 释放采集句柄且可重复调用
    #[test]
    fn test_finish_releases_captures_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = DataWriter::create(dir.path(), "tester", "demo-task").unwrap();
        assert!(writer.captures_active());

        writer.finish().unwrap();
        writer.finish().unwrap();
        assert!(!writer.captures_active());
    }
}
