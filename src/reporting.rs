//! # Reporting Module / 报告模块
//!
//! This module turns the outcomes of a run into reports: a colored console
//! summary with failure details, a standalone HTML page and a JSON document.
//!
//! 此模块将一次运行的结果转换为报告：带失败详情的彩色控制台摘要、
//! 独立的 HTML 页面和 JSON 文档。

pub mod console;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;
pub use json::{MatrixReport, write_json_report};
