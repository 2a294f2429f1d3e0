//! # Init Command Module / 初始化命令模块
//!
//! Writes a `BuildMatrix.toml` into the project root, either straight from
//! the built-in matrix or through a short `dialoguer` wizard.
//!
//! 将 `BuildMatrix.toml` 写入项目根目录，可以直接使用内置矩阵，
//! 也可以通过简短的 `dialoguer` 向导生成。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{DEFAULT_CONFIG_FILE, MatrixConfig, default_toolchains};
use crate::infra::t;

const CONFIG_HEADER: &str = "# Build matrix configuration / 构建矩阵配置
#
# Each [[toolchains]] entry is configured into its own build-<name> directory.
# 每个 [[toolchains]] 条目都会被配置到各自的 build-<name> 目录中。
#
# Optional keys / 可选键:
#   language = \"en\"          # console language / 控制台语言
#   step_timeout_secs = 1800   # per-step timeout / 单步超时
#   [toolchains.env]           # per-toolchain environment / 工具链环境变量

";

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub project_root: PathBuf,
    pub non_interactive: bool,
    pub force: bool,
}

/// Runs the init command.
///
/// In non-interactive mode an existing file is only replaced with `--force`;
/// in interactive mode the user is asked instead.
///
/// 运行初始化命令。
///
/// 非交互模式下，只有使用 `--force` 才会替换已有文件；交互模式下则会询问用户。
pub fn execute(args: InitArgs, language: &str) -> Result<()> {
    let config_path = args.project_root.join(DEFAULT_CONFIG_FILE);

    if args.non_interactive {
        if config_path.exists() && !args.force {
            println!(
                "{}",
                t!("init.file_exists", locale = language, path = config_path.display()).red()
            );
            return Ok(());
        }
        return write_config(&config_path, &MatrixConfig::default(), language);
    }

    let theme = ColorfulTheme::default();
    println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
    println!("{}", t!("init.description", locale = language));

    if config_path.exists() && !args.force {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!(
                "init.overwrite_prompt",
                locale = language,
                path = config_path.display()
            ))
            .default(false)
            .interact()
            .with_context(|| t!("init.confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let available = default_toolchains();
    let names: Vec<&str> = available.iter().map(|tc| tc.name.as_str()).collect();
    let defaults = vec![true; available.len()];
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.toolchain_prompt", locale = language))
        .items(&names)
        .defaults(&defaults)
        .interact()
        .with_context(|| t!("init.confirmation_failed", locale = language).to_string())?;

    if selections.is_empty() {
        println!("{}", t!("init.no_toolchains_selected", locale = language).yellow());
    }

    let source_dir: String = Input::with_theme(&theme)
        .with_prompt(t!("init.source_dir_prompt", locale = language))
        .default("test".to_string())
        .interact_text()
        .with_context(|| t!("init.confirmation_failed", locale = language).to_string())?;

    let matrix = MatrixConfig {
        source_dir: PathBuf::from(source_dir),
        toolchains: selections
            .into_iter()
            .map(|i| available[i].clone())
            .collect(),
        ..MatrixConfig::default()
    };

    write_config(&config_path, &matrix, language)
}

/// Serializes `matrix` with a commented header and writes it to `path`.
/// 将 `matrix` 连同注释头序列化并写入 `path`。
pub fn write_config(path: &Path, matrix: &MatrixConfig, language: &str) -> Result<()> {
    let content = format!("{CONFIG_HEADER}{}", matrix.to_toml()?);
    fs::write(path, content).with_context(|| {
        t!("init.write_failed", locale = language, path = path.display()).to_string()
    })?;

    println!(
        "{}",
        t!("init.success", locale = language, path = path.display()).green()
    );
    println!("{}", t!("init.next_steps", locale = language));
    Ok(())
}
