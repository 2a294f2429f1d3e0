//! # JSON Reporting Module / JSON 报告模块
//!
//! Machine-readable report for CI systems.
//! 供 CI 系统使用的机器可读报告。

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::BuildOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixReport {
    pub generated_at: DateTime<Local>,
    pub project_root: PathBuf,
    /// `true` when every toolchain reached its requested final stage.
    /// 当每个工具链都到达其请求的最终阶段时为 `true`。
    pub success: bool,
    pub outcomes: Vec<BuildOutcome>,
}

impl MatrixReport {
    pub fn new(outcomes: &BTreeMap<String, BuildOutcome>, project_root: &Path) -> Self {
        Self {
            generated_at: Local::now(),
            project_root: project_root.to_path_buf(),
            success: outcomes.values().all(BuildOutcome::is_success),
            outcomes: outcomes.values().cloned().collect(),
        }
    }
}

pub fn write_json_report(
    outcomes: &BTreeMap<String, BuildOutcome>,
    project_root: &Path,
    output_path: &Path,
) -> Result<()> {
    let report = MatrixReport::new(outcomes, project_root);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report: {}", output_path.display()))
}
