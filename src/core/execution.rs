//! # Build Execution Engine Module / 构建执行引擎模块
//!
//! This module runs the configure → build → test pipeline of a toolchain and
//! fans the pipelines of a whole matrix out over tokio tasks. Every step is an
//! external process with captured output; a failing step ends its own
//! pipeline but never touches the other toolchains.
//!
//! 此模块运行工具链的 配置 → 构建 → 测试 流水线，
//! 并将整个矩阵的流水线分发到 tokio 任务上。每个步骤都是一个捕获输出的外部进程；
//! 失败的步骤只会结束它自己的流水线，不会影响其他工具链。

use colored::*;
use futures::{StreamExt, stream};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{MatrixConfig, Tools, split_command_line},
        models::{BuildOutcome, BuildStatus, Step, StepFailure},
        planner::BuildJob,
    },
    infra::{
        command::{self, CapturedChild, OutputBuffer},
        fs, t,
    },
};

/// Settings shared by every pipeline of a run.
/// 一次运行中所有流水线共享的设置。
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Absolute path of the CMake source directory.
    /// CMake 源码目录的绝对路径。
    pub source_dir: PathBuf,
    pub build_type: String,
    pub tools: Tools,
    pub step_timeout: Option<Duration>,
    /// Last step to run; a successful pipeline ends with its passed status.
    /// 要运行的最后一个步骤；成功的流水线以该步骤的通过状态结束。
    pub stop_after: Step,
    pub locale: String,
}

impl PipelineSettings {
    pub fn from_config(config: &MatrixConfig, project_root: &Path, locale: &str) -> Self {
        Self {
            source_dir: project_root.join(&config.source_dir),
            build_type: config.build_type.clone(),
            tools: config.tools.clone(),
            step_timeout: config.step_timeout(),
            stop_after: Step::Test,
            locale: locale.to_string(),
        }
    }
}

/// A fully resolved external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory of the process; only the test step sets one.
    /// 进程的工作目录；只有测试步骤会设置。
    pub current_dir: Option<PathBuf>,
}

impl StepInvocation {
    pub fn command_line(&self) -> String {
        command::render_command_line(&self.program, &self.args)
    }
}

/// Builds the command line of `step` for `job`. All paths are absolute, so
/// concurrent pipelines never depend on the process-wide current directory.
///
/// 为 `job` 构建 `step` 的命令行。所有路径都是绝对路径，
/// 因此并发的流水线永远不会依赖进程级的当前目录。
pub fn step_invocation(
    step: Step,
    job: &BuildJob,
    settings: &PipelineSettings,
) -> anyhow::Result<StepInvocation> {
    let working_dir = job.working_dir.to_string_lossy().into_owned();
    let invocation = match step {
        Step::Configure => {
            let (program, mut args) = split_command_line(&settings.tools.cmake)?;
            args.extend([
                "-S".to_string(),
                settings.source_dir.to_string_lossy().into_owned(),
                "-B".to_string(),
                working_dir,
                "-Wno-dev".to_string(),
            ]);
            args.extend(job.toolchain.configure_args());
            StepInvocation {
                program,
                args,
                current_dir: None,
            }
        }
        Step::Build => {
            let (program, mut args) = split_command_line(&settings.tools.cmake)?;
            args.extend([
                "--build".to_string(),
                working_dir,
                "--config".to_string(),
                settings.build_type.clone(),
            ]);
            StepInvocation {
                program,
                args,
                current_dir: None,
            }
        }
        Step::Test => {
            let (program, mut args) = split_command_line(&settings.tools.ctest)?;
            args.extend(["-C".to_string(), settings.build_type.clone()]);
            StepInvocation {
                program,
                args,
                current_dir: Some(job.working_dir.clone()),
            }
        }
    };
    Ok(invocation)
}

/// How a single step ended.
/// Every variant carries the output captured up to that point, prefixed by
/// the command line.
enum StepResult {
    Passed { output: String },
    Failed { exit_code: Option<i32>, output: String },
    TimedOut { limit: Duration, output: String },
    Cancelled { output: String },
}

/// How waiting on a spawned step ended.
enum Waited {
    Exited(io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

/// Runs one toolchain's pipeline to completion and records its outcome.
///
/// Steps run strictly in order and the pipeline stops at the first step that
/// does not pass, so a failed configure never reaches build or test. Each
/// step's output is written to `build-matrix-<step>.log` in the working
/// directory.
///
/// 运行一个工具链的流水线直至完成并记录其结果。
///
/// 步骤严格按顺序运行，流水线在第一个未通过的步骤处停止，
/// 因此配置失败永远不会进入构建或测试。每个步骤的输出都会写入
/// 工作目录中的 `build-matrix-<step>.log`。
///
/// # Arguments
/// * `job` - The toolchain and its working directory
/// * `settings` - Settings shared by the whole run
/// * `cancel` - Cancels the pipeline; a running process is killed
///
/// # Returns
/// Exactly one `BuildOutcome`, whatever happened along the way.
pub async fn run_configuration(
    job: &BuildJob,
    settings: &PipelineSettings,
    cancel: &CancellationToken,
) -> BuildOutcome {
    let locale = settings.locale.as_str();
    let name = job.toolchain.name.as_str();
    let start_time = Instant::now();

    if cancel.is_cancelled() {
        let output = t!("run.cancelled_message", locale = locale).to_string();
        return cancelled_outcome(job, None, Duration::ZERO, output, None, locale);
    }

    if let Err(e) = fs::create_working_dir(&job.working_dir) {
        let output = t!(
            "run.workdir_failed",
            locale = locale,
            path = job.working_dir.display(),
            error = e
        )
        .to_string();
        println!("{}", output.red());
        return BuildOutcome::failed(
            &job.toolchain,
            job.working_dir.clone(),
            BuildStatus::ConfigureFailed,
            start_time.elapsed(),
            StepFailure {
                step: Some(Step::Configure),
                exit_code: None,
                output,
                log_path: None,
            },
        );
    }

    for step in Step::ALL.into_iter().filter(|s| *s <= settings.stop_after) {
        let step_label = step.label(locale);
        let invocation = match step_invocation(step, job, settings) {
            Ok(invocation) => invocation,
            Err(e) => {
                println!(
                    "{}",
                    t!(
                        "run.step_failed",
                        locale = locale,
                        name = name,
                        step = &step_label,
                        duration = "0.00",
                        code = t!("run.no_exit_code", locale = locale)
                    )
                    .red()
                );
                return BuildOutcome::failed(
                    &job.toolchain,
                    job.working_dir.clone(),
                    step.failed_status(),
                    start_time.elapsed(),
                    StepFailure {
                        step: Some(step),
                        exit_code: None,
                        output: format!("{e:#}"),
                        log_path: None,
                    },
                );
            }
        };

        println!(
            "{}",
            t!("run.step_started", locale = locale, name = name, step = &step_label).blue()
        );

        let step_start = Instant::now();
        let result = run_step(&invocation, job, settings, cancel).await;
        let step_secs = format!("{:.2}", step_start.elapsed().as_secs_f64());

        match result {
            StepResult::Passed { output } => {
                write_log(job, step, &output, locale);
                println!(
                    "{}",
                    t!(
                        "run.step_passed",
                        locale = locale,
                        name = name,
                        step = &step_label,
                        duration = &step_secs
                    )
                    .green()
                );
            }
            StepResult::Failed { exit_code, output } => {
                let log_path = write_log(job, step, &output, locale);
                let code = exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| t!("run.no_exit_code", locale = locale).to_string());
                println!(
                    "{}",
                    t!(
                        "run.step_failed",
                        locale = locale,
                        name = name,
                        step = &step_label,
                        duration = &step_secs,
                        code = code
                    )
                    .red()
                );
                return BuildOutcome::failed(
                    &job.toolchain,
                    job.working_dir.clone(),
                    step.failed_status(),
                    start_time.elapsed(),
                    StepFailure {
                        step: Some(step),
                        exit_code,
                        output,
                        log_path,
                    },
                );
            }
            StepResult::TimedOut { limit, output } => {
                let output = format!(
                    "{output}{}\n",
                    t!(
                        "run.step_timeout_message",
                        locale = locale,
                        timeout = limit.as_secs()
                    )
                );
                let log_path = write_log(job, step, &output, locale);
                println!(
                    "{}",
                    t!(
                        "run.step_timeout",
                        locale = locale,
                        name = name,
                        step = &step_label,
                        timeout = limit.as_secs()
                    )
                    .red()
                );
                return BuildOutcome::failed(
                    &job.toolchain,
                    job.working_dir.clone(),
                    BuildStatus::Timeout { step },
                    start_time.elapsed(),
                    StepFailure {
                        step: Some(step),
                        exit_code: None,
                        output,
                        log_path,
                    },
                );
            }
            StepResult::Cancelled { output } => {
                let output = format!(
                    "{output}{}\n",
                    t!("run.cancelled_message", locale = locale)
                );
                let log_path = write_log(job, step, &output, locale);
                return cancelled_outcome(
                    job,
                    Some(step),
                    start_time.elapsed(),
                    output,
                    log_path,
                    locale,
                );
            }
        }
    }

    BuildOutcome::passed(
        &job.toolchain,
        job.working_dir.clone(),
        settings.stop_after.passed_status(),
        start_time.elapsed(),
    )
}

/// Spawns one step and waits for it, honouring the step timeout and the
/// run's cancellation token. A step that times out or is cancelled is killed
/// together with its process group; its output so far is kept.
async fn run_step(
    invocation: &StepInvocation,
    job: &BuildJob,
    settings: &PipelineSettings,
    cancel: &CancellationToken,
) -> StepResult {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args).envs(&job.toolchain.env);
    if let Some(dir) = &invocation.current_dir {
        cmd.current_dir(dir);
    }

    let command_log = format!(
        "{} {}\n",
        t!("run.command_prefix", locale = &settings.locale),
        invocation.command_line()
    );

    let buffer = OutputBuffer::default();
    let mut child = match command::spawn_captured(cmd, Arc::clone(&buffer)) {
        Ok(child) => child,
        Err(e) => {
            return StepResult::Failed {
                exit_code: None,
                output: format!(
                    "{command_log}{}\n",
                    t!(
                        "run.spawn_failed",
                        locale = &settings.locale,
                        program = &invocation.program,
                        error = e
                    )
                ),
            };
        }
    };

    let waited = tokio::select! {
        biased;
        _ = cancel.cancelled() => Waited::Cancelled,
        waited = wait_with_timeout(&mut child, settings.step_timeout) => waited,
    };

    if !matches!(waited, Waited::Exited(_)) {
        if let Err(e) = child.terminate().await {
            eprintln!("Failed to kill '{}': {}", invocation.program, e);
        }
    }

    let output = format!("{command_log}{}", buffer.lock().await);
    match waited {
        Waited::Exited(Ok(status)) if status.success() => StepResult::Passed { output },
        Waited::Exited(Ok(status)) => StepResult::Failed {
            exit_code: status.code(),
            output,
        },
        Waited::Exited(Err(e)) => StepResult::Failed {
            exit_code: None,
            output: format!(
                "{output}{}\n",
                t!(
                    "run.wait_failed",
                    locale = &settings.locale,
                    program = &invocation.program,
                    error = e
                )
            ),
        },
        Waited::TimedOut(limit) => StepResult::TimedOut { limit, output },
        Waited::Cancelled => StepResult::Cancelled { output },
    }
}

async fn wait_with_timeout(child: &mut CapturedChild, limit: Option<Duration>) -> Waited {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => Waited::Exited(status),
            Err(_) => Waited::TimedOut(limit),
        },
        None => Waited::Exited(child.wait().await),
    }
}

/// Writes the step log; a failure to write is reported but does not change
/// the outcome of the step.
fn write_log(job: &BuildJob, step: Step, output: &str, locale: &str) -> Option<PathBuf> {
    match fs::write_step_log(&job.working_dir, step, output) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!(
                "{}",
                t!(
                    "run.log_write_failed",
                    locale = locale,
                    name = &job.toolchain.name,
                    path = fs::step_log_path(&job.working_dir, step).display(),
                    error = e
                )
                .yellow()
            );
            None
        }
    }
}

fn cancelled_outcome(
    job: &BuildJob,
    step: Option<Step>,
    duration: Duration,
    output: String,
    log_path: Option<PathBuf>,
    locale: &str,
) -> BuildOutcome {
    println!(
        "{}",
        t!("run.cancelled", locale = locale, name = &job.toolchain.name).yellow()
    );
    BuildOutcome::failed(
        &job.toolchain,
        job.working_dir.clone(),
        BuildStatus::Cancelled,
        duration,
        StepFailure {
            step,
            exit_code: None,
            output,
            log_path,
        },
    )
}

/// Runs every job concurrently and waits for all of them.
///
/// Each job gets its own tokio task; at most `limit` run at the same time.
/// A failing, timed-out or panicking job never cancels the others, and the
/// returned map holds exactly one outcome per job, keyed by toolchain name.
///
/// 并发运行所有任务并等待它们全部完成。
///
/// 每个任务拥有自己的 tokio 任务；同时最多运行 `limit` 个。
/// 失败、超时或 panic 的任务永远不会取消其他任务，
/// 返回的映射中每个任务恰好有一个结果，以工具链名称为键。
pub async fn run_all(
    jobs: Vec<BuildJob>,
    settings: Arc<PipelineSettings>,
    limit: usize,
    cancel: CancellationToken,
) -> BTreeMap<String, BuildOutcome> {
    let limit = limit.max(1);

    let finished: Vec<(BuildJob, Result<BuildOutcome, tokio::task::JoinError>)> =
        stream::iter(jobs.into_iter().map(|job| {
            let settings = Arc::clone(&settings);
            let cancel = cancel.clone();
            let task_job = job.clone();
            async move {
                let handle = tokio::spawn(async move {
                    run_configuration(&task_job, &settings, &cancel).await
                });
                (job, handle.await)
            }
        }))
        .buffer_unordered(limit)
        .collect()
        .await;

    finished
        .into_iter()
        .map(|(job, joined)| {
            let outcome = joined.unwrap_or_else(|e| {
                BuildOutcome::failed(
                    &job.toolchain,
                    job.working_dir.clone(),
                    BuildStatus::Aborted,
                    Duration::ZERO,
                    StepFailure {
                        step: None,
                        exit_code: None,
                        output: t!("run.aborted_message", locale = &settings.locale, error = e)
                            .to_string(),
                        log_path: None,
                    },
                )
            });
            (job.toolchain.name.clone(), outcome)
        })
        .collect()
}
