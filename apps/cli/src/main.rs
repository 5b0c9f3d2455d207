//! # Drivesim CLI
//!
//! 驾驶仿真会话的命令行运行器。
//!
//! ```bash
//! # 指定任务文件直接运行
//! drivesim tasks/city.toml alice --rate 60
//!
//! # 不给任务（或给了无效路径）时进入交互式任务选择
//! drivesim --tasks-dir tasks
//!
//! # 启动即预备录制
//! drivesim tasks/city.toml --record
//! ```
//!
//! Ctrl+C 触发优雅拆除：录制收尾、外设关闭、子系统逆序关闭。

mod select;

use anyhow::Result;
use clap::Parser;
use drivesim_session::{RecordingState, SessionBuilder};
use drivesim_task::DrivingTask;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Drivesim - 驾驶仿真会话运行器
#[derive(Parser, Debug)]
#[command(name = "drivesim")]
#[command(about = "Driving-simulation session runner", long_about = None)]
#[command(version)]
struct Args {
    /// 驾驶任务文件（缺省或无效时进入交互式选择）
    task: Option<PathBuf>,

    /// 驾驶员名（缺省时走任务设置 → 内置默认的回退链）
    driver: Option<String>,

    /// 交互式选择时扫描的任务目录
    #[arg(long, default_value = "tasks")]
    tasks_dir: PathBuf,

    /// 帧率（Hz）
    #[arg(long, default_value_t = 60.0)]
    rate: f64,

    /// 启动即预备录制
    #[arg(long)]
    record: bool,

    /// 分析数据输出根目录
    #[arg(long, default_value = "analyzer_data")]
    output_root: PathBuf,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drivesim=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    // 任务路径无效不是致命错误：进入交互式选择
    let task_path = match args.task {
        Some(path) if DrivingTask::is_valid(&path) => path,
        Some(path) => {
            eprintln!(
                "`{}` is not a loadable driving task, falling back to selection",
                path.display()
            );
            select::select_task(&args.tasks_dir)?
        }
        None => select::select_task(&args.tasks_dir)?,
    };

    let mut builder = SessionBuilder::new(&task_path)
        .output_root(&args.output_root)
        .arm_recording(args.record);
    if let Some(driver) = args.driver {
        builder = builder.driver_name(driver);
    }
    let mut session = builder.build()?;

    // Ctrl+C → 协作式退出标志
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        handler_flag.store(false, Ordering::Release);
    })?;

    eprintln!("Session started. Press Ctrl+C to stop.");
    eprintln!("  Task:   {}", task_path.display());
    eprintln!("  Driver: {}", session.context().driver_name);
    eprintln!("  Output: {}", session.context().output_dir.display());
    eprintln!("  Rate:   {} Hz", args.rate);

    run_frame_loop(&mut session, &running, args.rate);

    session.shutdown();
    let world = session.world();
    info!(
        frames = world.frame,
        sim_time_s = world.sim_time_s,
        "session finished"
    );
    eprintln!(
        "Session finished: {} frames, {:.1} s simulated.",
        world.frame, world.sim_time_s
    );
    Ok(())
}

/// 录制心跳日志的帧间隔
const HEARTBEAT_FRAMES: u64 = 600;

/// 固定节拍的帧循环
///
/// `dt` 取实际墙钟间隔而不是名义周期：节拍抖动进入仿真时钟，
/// 不会造成时间漂移。
fn run_frame_loop(session: &mut drivesim_session::Session, running: &AtomicBool, rate_hz: f64) {
    let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
    let mut last = Instant::now();
    let mut last_heartbeat_frame = 0;

    while running.load(Ordering::Acquire) {
        // spin_sleep 提供微秒级节拍精度
        spin_sleep::sleep(period);

        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        session.tick(dt);

        let frame = session.world().frame;
        if heartbeat_due(session.recording_state(), frame, last_heartbeat_frame) {
            last_heartbeat_frame = frame;
            info!(
                frame,
                sim_time_s = session.world().sim_time_s,
                "recording in progress"
            );
        }
    }
}

/// 心跳判定：录制激活且帧计数推进到了新的整周期
///
/// 帧计数在暂停时冻结，同一帧号只记一次，暂停在周期边界上
/// 不会逐 tick 刷屏。
fn heartbeat_due(recording: RecordingState, frame: u64, last_logged: u64) -> bool {
    recording == RecordingState::Active
        && frame > 0
        && frame % HEARTBEAT_FRAMES == 0
        && frame != last_logged
}
