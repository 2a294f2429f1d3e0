//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures produced by the build matrix:
//! the pipeline steps, the final status of a toolchain and the recorded
//! outcome of running one toolchain end to end.
//!
//! 此模块定义了构建矩阵产生的数据结构：
//! 流水线步骤、工具链的最终状态以及完整运行一个工具链后记录的结果。

use crate::core::config::ToolchainConfig;
use crate::infra::t;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// One step of the configure → build → test pipeline.
/// 配置 → 构建 → 测试流水线中的一个步骤。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Configure,
    Build,
    Test,
}

impl Step {
    /// All steps in pipeline order.
    pub const ALL: [Step; 3] = [Step::Configure, Step::Build, Step::Test];

    /// Stable lowercase identifier, used for log file names and `--stop-after`.
    /// 稳定的小写标识符，用于日志文件名和 `--stop-after`。
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Configure => "configure",
            Step::Build => "build",
            Step::Test => "test",
        }
    }

    /// Localized display name of the step.
    pub fn label(&self, locale: &str) -> String {
        match self {
            Step::Configure => t!("step.configure", locale = locale).to_string(),
            Step::Build => t!("step.build", locale = locale).to_string(),
            Step::Test => t!("step.test", locale = locale).to_string(),
        }
    }

    /// The status recorded when this step exits non-zero.
    /// 此步骤以非零退出时记录的状态。
    pub fn failed_status(&self) -> BuildStatus {
        match self {
            Step::Configure => BuildStatus::ConfigureFailed,
            Step::Build => BuildStatus::BuildFailed,
            Step::Test => BuildStatus::TestsFailed,
        }
    }

    /// The status recorded when the pipeline successfully stops after this step.
    /// 流水线在此步骤后成功停止时记录的状态。
    pub fn passed_status(&self) -> BuildStatus {
        match self {
            Step::Configure => BuildStatus::ConfiguredOk,
            Step::Build => BuildStatus::Built,
            Step::Test => BuildStatus::TestsPassed,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "configure" => Ok(Step::Configure),
            "build" => Ok(Step::Build),
            "test" => Ok(Step::Test),
            other => Err(format!(
                "unknown step '{other}', expected one of: configure, build, test"
            )),
        }
    }
}

/// Final status of one toolchain's pipeline.
/// 一个工具链流水线的最终状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildStatus {
    /// Configure succeeded and the run was asked to stop there.
    /// 配置成功，并且运行被要求在此停止。
    ConfiguredOk,
    ConfigureFailed,
    /// Build succeeded and the run was asked to stop there.
    /// 构建成功，并且运行被要求在此停止。
    Built,
    BuildFailed,
    TestsFailed,
    TestsPassed,
    /// A step exceeded the per-step timeout and its process was killed.
    /// 某个步骤超出了单步超时，其进程已被终止。
    Timeout { step: Step },
    /// The run was cancelled (Ctrl-C) before this toolchain finished.
    /// 运行在此工具链完成之前被取消（Ctrl-C）。
    Cancelled,
    /// The worker task panicked or could not be joined.
    /// 工作任务发生 panic 或无法被 join。
    Aborted,
}

impl BuildStatus {
    /// `true` when the pipeline reached the last stage it was asked to run.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            BuildStatus::ConfiguredOk | BuildStatus::Built | BuildStatus::TestsPassed
        )
    }

    /// Stable identifier used by the HTML report for styling.
    /// HTML 报告用于样式的稳定标识符。
    pub fn css_class(&self) -> &'static str {
        match self {
            BuildStatus::ConfiguredOk | BuildStatus::Built | BuildStatus::TestsPassed => {
                "status-passed"
            }
            BuildStatus::Timeout { .. } => "status-timeout",
            BuildStatus::Cancelled | BuildStatus::Aborted => "status-skipped",
            _ => "status-failed",
        }
    }

    /// Localized status text for console and HTML output.
    pub fn label(&self, locale: &str) -> String {
        match self {
            BuildStatus::ConfiguredOk => t!("status.configured_ok", locale = locale),
            BuildStatus::ConfigureFailed => t!("status.configure_failed", locale = locale),
            BuildStatus::Built => t!("status.built", locale = locale),
            BuildStatus::BuildFailed => t!("status.build_failed", locale = locale),
            BuildStatus::TestsFailed => t!("status.tests_failed", locale = locale),
            BuildStatus::TestsPassed => t!("status.tests_passed", locale = locale),
            BuildStatus::Timeout { .. } => t!("status.timeout", locale = locale),
            BuildStatus::Cancelled => t!("status.cancelled", locale = locale),
            BuildStatus::Aborted => t!("status.aborted", locale = locale),
        }
        .to_string()
    }
}

/// Details of the step that ended a pipeline unsuccessfully.
/// 使流水线以失败结束的步骤的详细信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// The step that failed. `None` when the failure is not tied to a step
    /// (cancellation before start, aborted worker).
    /// 失败的步骤。当失败与具体步骤无关时（启动前取消、工作任务中止）为 `None`。
    pub step: Option<Step>,
    /// Exit code of the external tool, if it ran to completion with one.
    /// 外部工具的退出码（如果它带着退出码运行结束）。
    pub exit_code: Option<i32>,
    /// Captured stdout and stderr of the failing step.
    /// 失败步骤捕获的 stdout 和 stderr。
    pub output: String,
    /// Where the full output of the step was written, if anywhere.
    /// 步骤完整输出的写入位置（如果有）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

/// The recorded result of one toolchain's full pipeline.
/// 一个工具链完整流水线的记录结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub toolchain: String,
    pub working_dir: PathBuf,
    pub status: BuildStatus,
    /// Time spent from the start of the first step to the end of the last one.
    /// 从第一个步骤开始到最后一个步骤结束所花费的时间。
    pub duration: Duration,
    /// Present exactly when `status` is not a success.
    /// 当且仅当 `status` 不是成功状态时存在。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
}

impl BuildOutcome {
    pub fn passed(
        toolchain: &ToolchainConfig,
        working_dir: PathBuf,
        status: BuildStatus,
        duration: Duration,
    ) -> Self {
        Self {
            toolchain: toolchain.name.clone(),
            working_dir,
            status,
            duration,
            failure: None,
        }
    }

    pub fn failed(
        toolchain: &ToolchainConfig,
        working_dir: PathBuf,
        status: BuildStatus,
        duration: Duration,
        failure: StepFailure,
    ) -> Self {
        Self {
            toolchain: toolchain.name.clone(),
            working_dir,
            status,
            duration,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The captured output of the failing step, or an empty string.
    /// 失败步骤捕获的输出，或空字符串。
    pub fn failure_output(&self) -> &str {
        self.failure
            .as_ref()
            .map(|f| f.output.as_str())
            .unwrap_or_default()
    }
}
