//! # Command-Line Interface Module / 命令行接口模块
//!
//! Builds the clap command tree with localized help texts and dispatches to
//! the `run` (default) and `init` commands.
//!
//! 使用本地化的帮助文本构建 clap 命令树，并分派到 `run`（默认）和 `init` 命令。

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::{env, path::PathBuf};

use crate::core::models::Step;
use crate::infra::t;

pub mod commands;

use commands::{init::InitArgs, run::RunArgs};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

fn project_root_arg(locale: &str) -> Arg {
    Arg::new("project-root")
        .long("project-root")
        .help(t!("arg_project_root", locale = locale).to_string())
        .value_name("PATH")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

/// Builds the command tree. Running without a subcommand performs a run.
/// 构建命令树。不带子命令运行时执行一次运行。
pub fn build_cli(locale: &str) -> Command {
    Command::new("build-matrix")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(project_root_arg(locale))
        .arg(
            Arg::new("only")
                .long("only")
                .help(t!("arg_only", locale = locale).to_string())
                .value_name("TOOLCHAIN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("arg_config", locale = locale).to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help(t!("arg_jobs", locale = locale).to_string())
                .value_name("JOBS")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help(t!("arg_timeout", locale = locale).to_string())
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("stop-after")
                .long("stop-after")
                .help(t!("arg_stop_after", locale = locale).to_string())
                .value_name("STEP")
                .value_parser(["configure", "build", "test"])
                .default_value("test")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help(t!("arg_html", locale = locale).to_string())
                .value_name("HTML")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help(t!("arg_json", locale = locale).to_string())
                .value_name("JSON")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(project_root_arg(locale))
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn run_args(matches: &ArgMatches) -> Result<RunArgs> {
    let stop_after = matches
        .get_one::<String>("stop-after")
        .map(|s| s.parse::<Step>())
        .transpose()
        .map_err(anyhow::Error::msg)?
        .unwrap_or(Step::Test);

    Ok(RunArgs {
        project_root: matches
            .get_one::<PathBuf>("project-root")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
        config: matches.get_one::<PathBuf>("config").cloned(),
        only: matches
            .get_many::<String>("only")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
        stop_after,
        html: matches.get_one::<PathBuf>("html").cloned(),
        json: matches.get_one::<PathBuf>("json").cloned(),
    })
}

/// Parses the process arguments and runs the selected command.
/// 解析进程参数并运行所选命令。
pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = match &explicit_language {
        Some(lang) => {
            let lang = crate::resolve_locale(lang);
            rust_i18n::set_locale(&lang);
            lang
        }
        None => crate::init(),
    };

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("init", init_matches)) => {
            if explicit_language.is_none() {
                println!(
                    "{}",
                    t!("system_language_detected", locale = &language, lang = &language).dimmed()
                );
            }
            let args = InitArgs {
                project_root: init_matches
                    .get_one::<PathBuf>("project-root")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(".")),
                non_interactive: init_matches.get_flag("non-interactive"),
                force: init_matches.get_flag("force"),
            };
            commands::init::execute(args, &language)
        }
        _ => {
            let args = run_args(&matches)?;
            commands::run::execute(args, &language, explicit_language.is_some()).await
        }
    }
}
