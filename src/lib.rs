//! # Build Matrix Library / Build Matrix 库
//!
//! This library configures, builds and tests a CMake project with several
//! compiler toolchains in parallel, one isolated `build-<toolchain>`
//! directory per toolchain, and reports one outcome per toolchain.
//!
//! 此库使用多个编译器工具链并行配置、构建和测试 CMake 项目，
//! 每个工具链使用一个独立的 `build-<toolchain>` 目录，并为每个工具链报告一个结果。
//!
//! ## Modules / 模块
//!
//! - `core` - Toolchain configuration, outcome models and the pipeline engine
//! - `infra` - Command execution and file system operations
//! - `reporting` - Console, HTML and JSON reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 工具链配置、结果模型和流水线引擎
//! - `infra` - 命令执行和文件系统操作
//! - `reporting` - 控制台、HTML 和 JSON 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let lang = resolve_locale(&locale);
    rust_i18n::set_locale(&lang);
    lang
}

/// Maps a requested locale onto one of the bundled locales.
/// 将请求的区域设置映射到内置的区域设置之一。
pub fn resolve_locale(requested: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    // Full locale first (e.g. "zh-CN"), then the language part ("en" from "en-US").
    if available_locales.contains(&requested) {
        return requested.to_string();
    }
    requested
        .split(['-', '_'])
        .next()
        .and_then(|code| {
            available_locales
                .iter()
                .find(|l| l.split('-').next() == Some(code))
        })
        .map(|l| l.to_string())
        .unwrap_or_else(|| "en".to_string())
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
