//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the end-of-run summary and the details of failing
//! toolchains to the console, with color and internationalization support.
//!
//! 此模块在控制台打印运行结束时的摘要以及失败工具链的详细信息，
//! 支持颜色和国际化。

use colored::*;
use std::collections::BTreeMap;

use crate::core::models::{BuildOutcome, BuildStatus};
use crate::infra::t;

/// Maximum number of output lines shown per failing toolchain; the full
/// output stays in the step log.
/// 每个失败工具链显示的最大输出行数；完整输出保留在步骤日志中。
pub const MAX_DETAIL_LINES: usize = 200;

/// Prints a formatted summary of the outcomes, one line per toolchain.
///
/// 在控制台打印格式化的结果摘要，每个工具链一行。
///
/// # Output Format / 输出格式
/// ```text
/// --- Build Matrix Summary ---
///   - Tests Passed       | gcc                  |      12.31s
///   - Configure Failed   | clang                |       0.45s
/// ```
pub fn print_summary(outcomes: &BTreeMap<String, BuildOutcome>, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for outcome in outcomes.values() {
        let status_str = outcome.status.label(locale);
        let status_colored = match outcome.status {
            s if s.is_success() => status_str.green(),
            BuildStatus::Cancelled | BuildStatus::Aborted => status_str.dimmed(),
            BuildStatus::Timeout { .. } => status_str.yellow(),
            _ => status_str.red(),
        };
        let duration_str = format!("{:.2}s", outcome.duration.as_secs_f64());

        println!(
            "  - {:<18} | {:<20} | {:>10}",
            status_colored, outcome.toolchain, duration_str
        );
    }
}

/// Prints the captured output of the first failing step of every toolchain
/// that did not pass. Returns early when everything passed.
///
/// 打印每个未通过工具链第一个失败步骤的捕获输出。全部通过时提前返回。
pub fn print_failure_details(outcomes: &BTreeMap<String, BuildOutcome>, locale: &str) {
    let failures: Vec<&BuildOutcome> = outcomes.values().filter(|o| !o.is_success()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, outcome) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("report.failure_header", locale = locale).red(),
            outcome.toolchain.cyan(),
            outcome.status.label(locale)
        );

        let Some(failure) = &outcome.failure else {
            continue;
        };

        if let Some(step) = failure.step {
            let header = t!("report.step_log", locale = locale, step = step.label(locale));
            println!("\n--- {} ---\n", header.yellow());
        }

        let (shown, omitted) = tail_lines(&failure.output, MAX_DETAIL_LINES);
        if omitted > 0 {
            let path = failure
                .log_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| outcome.working_dir.display().to_string());
            println!(
                "{}",
                t!("report.truncated", locale = locale, count = omitted, path = path).dimmed()
            );
        }
        if shown.trim().is_empty() {
            println!("{}", t!("report.no_output", locale = locale).dimmed());
        } else {
            println!("{}", shown.trim_end());
        }
        println!("\n{}", "-".repeat(80));
    }
}

/// Returns the last `max` lines of `output` and the number of lines left out.
/// 返回 `output` 的最后 `max` 行以及被省略的行数。
pub fn tail_lines(output: &str, max: usize) -> (String, usize) {
    let lines: Vec<&str> = output.lines().collect();
    let omitted = lines.len().saturating_sub(max);
    (lines[omitted..].join("\n"), omitted)
}
