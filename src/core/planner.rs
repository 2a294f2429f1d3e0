//! # Build Matrix Planner Module / 构建矩阵计划模块
//!
//! Turns a matrix configuration into the list of jobs to run: applies the
//! `--only` selection, validates toolchain names and resolves each
//! toolchain's working directory.
//!
//! 将矩阵配置转换为要运行的任务列表：应用 `--only` 选择，
//! 校验工具链名称并解析每个工具链的工作目录。

use crate::core::config::ToolchainConfig;
use anyhow::{Result, bail};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// One toolchain paired with the working directory it owns for the run.
/// 一个工具链及其在本次运行中独占的工作目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub toolchain: ToolchainConfig,
    pub working_dir: PathBuf,
}

/// Represents a complete execution plan for a build matrix.
/// 表示构建矩阵的完整执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// Jobs to run, in configuration order.
    /// 要运行的任务，按配置顺序排列。
    pub jobs: Vec<BuildJob>,
    /// Number of toolchains left out by `--only`.
    /// 被 `--only` 排除的工具链数量。
    pub filtered_count: usize,
}

/// Creates an execution plan for the given toolchains.
///
/// Fails when a toolchain name is empty or duplicated, when two toolchains
/// would share a working directory, or when `only` names a toolchain that
/// does not exist.
///
/// 为给定的工具链创建执行计划。
///
/// 当工具链名称为空或重复、两个工具链会共享同一个工作目录，
/// 或 `only` 指定了不存在的工具链时失败。
///
/// # Arguments
/// * `toolchains` - All toolchains of the matrix
/// * `project_root` - Absolute project root the working directories live in
/// * `only` - Names to restrict the run to; empty means all
pub fn plan_execution(
    toolchains: Vec<ToolchainConfig>,
    project_root: &Path,
    only: &[String],
) -> Result<ExecutionPlan> {
    let mut names = BTreeSet::new();
    let mut dirs: HashMap<String, String> = HashMap::new();
    for toolchain in &toolchains {
        if toolchain.name.trim().is_empty() {
            bail!("Toolchain names must not be empty.");
        }
        if !names.insert(toolchain.name.as_str()) {
            bail!("Toolchain '{}' is defined more than once.", toolchain.name);
        }
        if let Some(other) = dirs.insert(toolchain.working_dir_name(), toolchain.name.clone()) {
            bail!(
                "Toolchains '{}' and '{}' would share the working directory '{}'.",
                other,
                toolchain.name,
                toolchain.working_dir_name()
            );
        }
    }

    let unknown: Vec<&str> = only
        .iter()
        .map(String::as_str)
        .filter(|name| !names.contains(name))
        .collect();
    if !unknown.is_empty() {
        bail!(
            "Unknown toolchain(s): {}. Available: {}",
            unknown.join(", "),
            names.iter().copied().collect::<Vec<_>>().join(", ")
        );
    }

    let total = toolchains.len();
    let jobs: Vec<BuildJob> = toolchains
        .into_iter()
        .filter(|toolchain| only.is_empty() || only.iter().any(|n| *n == toolchain.name))
        .map(|toolchain| BuildJob {
            working_dir: toolchain.working_dir(project_root),
            toolchain,
        })
        .collect();

    Ok(ExecutionPlan {
        filtered_count: total - jobs.len(),
        jobs,
    })
}
