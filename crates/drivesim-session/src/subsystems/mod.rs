//! 子系统实现
//!
//! 真实的渲染、物理、AI 属于外部协作者；这里的子系统承载
//! 编排层可观察的派生量和簿记，并严格遵守固定更新顺序
//! （注册在 `SessionBuilder::build` 中完成）。

mod audio;
mod camera;
mod drivetrain;
mod effects;
mod panel;
mod reaction;
mod steering;
mod traffic;
mod triggers;
mod vehicle;

pub use audio::AudioSubsystem;
pub use camera::{CameraFlight, CameraSubsystem, NotEnoughWaypoints};
pub use drivetrain::DrivetrainSubsystem;
pub use effects::EffectsSubsystem;
pub use panel::PanelSubsystem;
pub use reaction::ReactionSubsystem;
pub use steering::SteeringTaskSubsystem;
pub use traffic::TrafficSubsystem;
pub use triggers::TriggerSubsystem;
pub use vehicle::VehicleSubsystem;
