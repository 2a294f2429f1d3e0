//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a standalone HTML page with summary counts and one row per
//! toolchain; failing rows carry the captured output of the failing step.
//!
//! 渲染一个独立的 HTML 页面，包含汇总计数，每个工具链一行；
//! 失败的行附带失败步骤的捕获输出。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::models::BuildOutcome;
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; color: #222; }
h1 { margin-bottom: 0.2em; }
.meta { color: #666; margin-bottom: 1.5em; }
.summary-container { display: flex; gap: 1.5em; margin-bottom: 1.5em; }
.summary-item { border: 1px solid #ddd; border-radius: 6px; padding: 0.8em 1.2em; text-align: center; }
.summary-item .count { display: block; font-size: 1.8em; font-weight: bold; }
.passed-text { color: #2e7d32; }
.failed-text { color: #c62828; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #eee; padding: 0.5em; text-align: left; vertical-align: top; }
.status-cell { display: inline-block; padding: 0.1em 0.6em; border-radius: 4px; color: #fff; }
.status-passed { background: #2e7d32; }
.status-failed { background: #c62828; }
.status-timeout { background: #ef6c00; }
.status-skipped { background: #757575; }
details pre { background: #f6f8fa; padding: 0.8em; overflow-x: auto; max-height: 40em; }
"#;

/// Renders the report page. Split from [`generate_html_report`] so the markup
/// can be checked without touching the file system.
///
/// 渲染报告页面。与 [`generate_html_report`] 分开，以便无需访问文件系统即可检查标记。
pub fn render_html_report(
    outcomes: &BTreeMap<String, BuildOutcome>,
    generated_at: &str,
    project_root: &Path,
    locale: &str,
) -> Markup {
    let total = outcomes.len();
    let passed = outcomes.values().filter(|o| o.is_success()).count();
    let failed = total - passed;

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                div class="meta" {
                    (t!("html_report.generated_at", locale = locale, time = generated_at))
                    br;
                    (t!("html_report.project_root", locale = locale)) ": "
                    code { (project_root.display().to_string()) }
                }
                div class="summary-container" {
                    div class="summary-item" {
                        span class="count" { (total) }
                        span class="label" { (t!("html_report.total", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count passed-text" { (passed) }
                        span class="label" { (t!("html_report.passed", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count failed-text" { (failed) }
                        span class="label" { (t!("html_report.failed", locale = locale)) }
                    }
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.toolchain", locale = locale)) }
                            th { (t!("html_report.status", locale = locale)) }
                            th { (t!("html_report.duration", locale = locale)) }
                            th { (t!("html_report.working_dir", locale = locale)) }
                        }
                    }
                    tbody {
                        @for outcome in outcomes.values() {
                            tr {
                                td { (outcome.toolchain) }
                                td {
                                    div class={ "status-cell " (outcome.status.css_class()) } {
                                        (outcome.status.label(locale))
                                    }
                                    @if let Some(failure) = &outcome.failure {
                                        details {
                                            summary {
                                                @if let Some(step) = failure.step {
                                                    (t!("report.step_log", locale = locale, step = step.label(locale)))
                                                } @else {
                                                    (outcome.status.label(locale))
                                                }
                                            }
                                            pre { (failure.output) }
                                        }
                                    }
                                }
                                td { (format!("{:.2}s", outcome.duration.as_secs_f64())) }
                                td { code { (outcome.working_dir.display().to_string()) } }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Generates the HTML report and writes it to `output_path`.
///
/// # Errors / 错误
/// Fails when the file cannot be written.
/// 当无法写入文件时失败。
pub fn generate_html_report(
    outcomes: &BTreeMap<String, BuildOutcome>,
    project_root: &Path,
    output_path: &Path,
    locale: &str,
) -> Result<()> {
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let markup = render_html_report(outcomes, &generated_at, project_root, locale);
    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))
}
