//! # Run Command Module / 运行命令模块
//!
//! This module implements the default command of the CLI: load the matrix,
//! clean stale build directories, run every toolchain concurrently, report
//! and turn the aggregate outcome into the process exit status.
//!
//! 此模块实现 CLI 的默认命令：加载矩阵、清理旧的构建目录、
//! 并发运行所有工具链、生成报告，并将汇总结果转换为进程退出状态。

use anyhow::{Context, Result, bail};
use colored::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{DEFAULT_CONFIG_FILE, MatrixConfig},
        execution::{PipelineSettings, run_all},
        models::Step,
        planner,
    },
    infra::{fs::prepare, t},
    reporting::{generate_html_report, print_failure_details, print_summary, write_json_report},
};

/// Arguments of the run command.
/// 运行命令的参数。
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub project_root: PathBuf,
    /// Explicit matrix file; `None` looks for `BuildMatrix.toml` in the project root.
    /// 显式指定的矩阵文件；`None` 时在项目根目录中查找 `BuildMatrix.toml`。
    pub config: Option<PathBuf>,
    pub only: Vec<String>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub stop_after: Step,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Executes the run command.
///
/// # Arguments
/// * `args` - Parsed command-line arguments
/// * `language` - Locale chosen from `--lang` or the system
/// * `explicit_language` - Whether `--lang` was given; otherwise the matrix
///   file's `language` takes precedence over the system locale
///
/// # Returns
/// `Ok(())` only when every toolchain reached its requested final stage.
pub async fn execute(args: RunArgs, language: &str, explicit_language: bool) -> Result<()> {
    let project_root = fs::canonicalize(&args.project_root).with_context(|| {
        t!(
            "project_dir_not_found",
            locale = language,
            path = args.project_root.display()
        )
        .to_string()
    })?;

    let (matrix, config_path) = load_matrix(&project_root, args.config.as_deref(), language)?;

    let locale = match (&matrix.language, explicit_language) {
        (Some(configured), false) => {
            let locale = crate::resolve_locale(configured);
            rust_i18n::set_locale(&locale);
            locale
        }
        _ => language.to_string(),
    };

    println!(
        "{}",
        t!("project_root_detected", locale = &locale, path = project_root.display())
    );
    match &config_path {
        Some(path) => println!(
            "{}",
            t!("loading_matrix", locale = &locale, path = path.display())
        ),
        None => println!("{}", t!("using_builtin_matrix", locale = &locale).cyan()),
    }

    let source_dir = project_root.join(&matrix.source_dir);
    if !source_dir.is_dir() {
        bail!(t!("source_dir_missing", locale = &locale, path = source_dir.display()).to_string());
    }

    let plan = planner::plan_execution(matrix.toolchains.clone(), &project_root, &args.only)?;
    if plan.filtered_count > 0 {
        println!(
            "{}",
            t!(
                "filtered_toolchains",
                locale = &locale,
                filtered = plan.filtered_count,
                total = plan.jobs.len()
            )
            .cyan()
        );
    }

    // Cleanup happens once, before any pipeline creates its directory.
    for removed in prepare(&project_root)? {
        println!(
            "{}",
            t!("removed_stale_dir", locale = &locale, path = removed.display()).dimmed()
        );
    }

    if plan.jobs.is_empty() {
        println!("{}", t!("no_toolchains", locale = &locale).yellow());
        return Ok(());
    }

    let mut settings = PipelineSettings::from_config(&matrix, &project_root, &locale);
    settings.stop_after = args.stop_after;
    if let Some(secs) = args.timeout_secs {
        settings.step_timeout = Some(Duration::from_secs(secs));
    }

    let jobs = args.jobs.unwrap_or(plan.jobs.len()).max(1);
    println!(
        "{}",
        t!(
            "running_toolchains",
            locale = &locale,
            count = plan.jobs.len(),
            jobs = jobs
        )
        .bold()
    );

    let cancel = setup_signal_handler(&locale);
    let outcomes = run_all(plan.jobs, Arc::new(settings), jobs, cancel).await;

    print_summary(&outcomes, &locale);

    if let Some(report_path) = &args.html {
        match generate_html_report(&outcomes, &project_root, report_path, &locale) {
            Ok(()) => println!(
                "{}",
                t!("report_written", locale = &locale, path = report_path.display())
            ),
            Err(e) => eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e),
        }
    }
    if let Some(report_path) = &args.json {
        match write_json_report(&outcomes, &project_root, report_path) {
            Ok(()) => println!(
                "{}",
                t!("report_written", locale = &locale, path = report_path.display())
            ),
            Err(e) => eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e),
        }
    }

    let failed = outcomes.values().filter(|o| !o.is_success()).count();
    if failed > 0 {
        print_failure_details(&outcomes, &locale);
        bail!(t!("matrix_failed", locale = &locale, count = failed).to_string());
    }

    println!(
        "\n{}",
        t!("all_toolchains_passed", locale = &locale).green().bold()
    );
    Ok(())
}

/// Loads the matrix from `--config`, else from `BuildMatrix.toml` in the
/// project root, else falls back to the built-in matrix.
///
/// 从 `--config` 加载矩阵，否则从项目根目录的 `BuildMatrix.toml` 加载，
/// 再否则回退到内置矩阵。
fn load_matrix(
    project_root: &Path,
    explicit: Option<&Path>,
    locale: &str,
) -> Result<(MatrixConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => fs::canonicalize(path).with_context(|| {
            t!("config_read_failed_path", locale = locale, path = path.display()).to_string()
        })?,
        None => {
            let candidate = project_root.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok((MatrixConfig::default(), None));
            }
            candidate
        }
    };

    let matrix = MatrixConfig::load(&path).with_context(|| {
        t!("config_load_failed", locale = locale, path = path.display()).to_string()
    })?;
    Ok((matrix, Some(path)))
}

/// Cancels the returned token on Ctrl-C. Running steps are killed; working
/// directories are left in place.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
