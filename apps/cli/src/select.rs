//! 交互式任务选择
//!
//! 启动参数没有给出可加载的任务文件时，列出任务目录下的
//! `.toml` 文件让用户选择，而不是直接失败。

use anyhow::{Context, bail};
use drivesim_task::DrivingTask;
use std::path::{Path, PathBuf};

/// 在任务目录下交互式选择一个可加载的驾驶任务
pub fn select_task(tasks_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut candidates = list_task_files(tasks_dir)
        .with_context(|| format!("cannot list task directory `{}`", tasks_dir.display()))?;
    if candidates.is_empty() {
        bail!(
            "no driving task files (*.toml) found in `{}`",
            tasks_dir.display()
        );
    }
    candidates.sort();

    let labels: Vec<String> = candidates
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    let picked = inquire::Select::new("选择驾驶任务", labels.clone()).prompt()?;
    let index = labels
        .iter()
        .position(|l| *l == picked)
        .expect("picked label comes from the list");
    let path = candidates.swap_remove(index);

    if !DrivingTask::is_valid(&path) {
        bail!("`{}` is not a loadable driving task", path.display());
    }
    Ok(path)
}

fn list_task_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    Ok(files)
}
