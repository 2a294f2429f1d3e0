//! # Matrix Configuration Module / 矩阵配置模块
//!
//! Defines the toolchain configurations that make up a build matrix and the
//! settings shared by every pipeline (tool command lines, source directory,
//! build type, timeouts). Everything can be loaded from a `BuildMatrix.toml`
//! file; every field has a default so an empty file yields the built-in
//! gcc / clang / msvc matrix.
//!
//! 定义构成构建矩阵的工具链配置以及所有流水线共享的设置
//! （工具命令行、源码目录、构建类型、超时）。
//! 所有内容都可以从 `BuildMatrix.toml` 加载；每个字段都有默认值，
//! 因此空文件会得到内置的 gcc / clang / msvc 矩阵。

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file name of the matrix configuration, looked up in the project root.
/// 矩阵配置的默认文件名，在项目根目录中查找。
pub const DEFAULT_CONFIG_FILE: &str = "BuildMatrix.toml";

/// Reserved prefix of every working directory. `prepare` deletes any
/// top-level directory of the project root that starts with it.
/// 每个工作目录的保留前缀。`prepare` 会删除项目根目录下所有以此开头的顶级目录。
pub const BUILD_DIR_PREFIX: &str = "build";

/// A single compiler toolchain of the matrix.
/// 矩阵中的单个编译器工具链。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolchainConfig {
    /// Unique label, also used to derive the working directory name.
    /// 唯一标签，同时用于派生工作目录名称。
    pub name: String,
    /// CMake generator (`-G`). `None` lets CMake pick the platform default.
    /// CMake 生成器（`-G`）。`None` 表示由 CMake 选择平台默认值。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    /// Value for `CMAKE_C_COMPILER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_compiler: Option<String>,
    /// Value for `CMAKE_CXX_COMPILER`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cxx_compiler: Option<String>,
    /// Extra arguments appended verbatim to the configure command.
    /// 原样追加到配置命令的额外参数。
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,
    /// Environment overrides applied to every step of this toolchain.
    /// 应用于此工具链每个步骤的环境变量覆盖。
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl ToolchainConfig {
    /// Creates a toolchain with only a name; everything else is left to CMake.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator: None,
            c_compiler: None,
            cxx_compiler: None,
            extra_args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Ordered configure arguments: generator, compiler overrides, then the
    /// extra arguments.
    ///
    /// 有序的配置参数：生成器、编译器覆盖，然后是额外参数。
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(generator) = &self.generator {
            args.push("-G".to_string());
            args.push(generator.clone());
        }
        if let Some(cxx) = &self.cxx_compiler {
            args.push(format!("-DCMAKE_CXX_COMPILER={cxx}"));
        }
        if let Some(cc) = &self.c_compiler {
            args.push(format!("-DCMAKE_C_COMPILER={cc}"));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Name of the working directory for this toolchain, e.g. `build-gcc`.
    /// Characters other than ASCII alphanumerics, `-` and `_` become `_`.
    ///
    /// 此工具链工作目录的名称，例如 `build-gcc`。
    /// 除 ASCII 字母数字、`-` 和 `_` 之外的字符都会变为 `_`。
    pub fn working_dir_name(&self) -> String {
        let sanitized: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{BUILD_DIR_PREFIX}-{sanitized}")
    }

    /// Absolute working directory of this toolchain below `project_root`.
    pub fn working_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.working_dir_name())
    }
}

/// The built-in matrix: gcc and clang through Ninja, and msvc using the
/// platform's default generator and compiler.
///
/// 内置矩阵：gcc 和 clang 使用 Ninja，msvc 使用平台默认的生成器和编译器。
pub fn default_toolchains() -> Vec<ToolchainConfig> {
    vec![
        ToolchainConfig {
            generator: Some("Ninja".to_string()),
            c_compiler: Some("gcc".to_string()),
            cxx_compiler: Some("g++".to_string()),
            ..ToolchainConfig::new("gcc")
        },
        ToolchainConfig {
            generator: Some("Ninja".to_string()),
            c_compiler: Some("clang".to_string()),
            cxx_compiler: Some("clang++".to_string()),
            ..ToolchainConfig::new("clang")
        },
        ToolchainConfig::new("msvc"),
    ]
}

/// Command lines used to invoke the external tools. Each entry is
/// shell-expanded and split like a shell would, so a wrapper such as
/// `"sh ./fake-cmake"` or `"~/cmake/bin/cmake"` works.
///
/// 用于调用外部工具的命令行。每一项都会进行 shell 展开并按 shell 规则拆分，
/// 因此可以使用 `"sh ./fake-cmake"` 或 `"~/cmake/bin/cmake"` 这样的写法。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tools {
    #[serde(default = "default_cmake")]
    pub cmake: String,
    #[serde(default = "default_ctest")]
    pub ctest: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            cmake: default_cmake(),
            ctest: default_ctest(),
        }
    }
}

fn default_cmake() -> String {
    "cmake".to_string()
}

fn default_ctest() -> String {
    "ctest".to_string()
}

/// Splits a tool command line into program and leading arguments.
/// 将工具命令行拆分为程序和前置参数。
pub fn split_command_line(line: &str) -> Result<(String, Vec<String>)> {
    let expanded = shellexpand::full(line)
        .with_context(|| format!("Failed to expand command: {line}"))?
        .to_string();
    let mut parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?;
    if parts.is_empty() {
        bail!("Empty command line for tool: '{}'", line);
    }
    let program = parts.remove(0);
    Ok((program, parts))
}

/// The complete build matrix loaded from a TOML file.
/// 从 TOML 文件加载的完整构建矩阵。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatrixConfig {
    /// Language for console messages; `None` falls back to the system locale.
    /// 控制台消息的语言；`None` 时回退到系统区域设置。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// CMake source directory, relative to the project root.
    /// CMake 源码目录，相对于项目根目录。
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Build configuration passed to `cmake --build --config` and `ctest -C`.
    #[serde(default = "default_build_type")]
    pub build_type: String,
    /// Optional timeout applied to each step separately.
    /// 分别应用于每个步骤的可选超时。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
    #[serde(default)]
    pub tools: Tools,
    #[serde(default = "default_toolchains")]
    pub toolchains: Vec<ToolchainConfig>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            language: None,
            source_dir: default_source_dir(),
            build_type: default_build_type(),
            step_timeout_secs: None,
            tools: Tools::default(),
            toolchains: default_toolchains(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("test")
}

fn default_build_type() -> String {
    "Debug".to_string()
}

impl MatrixConfig {
    /// Parses a matrix from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse matrix configuration")
    }

    /// Reads and parses the matrix file at `path`.
    /// 读取并解析 `path` 处的矩阵文件。
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read matrix file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid matrix file: {}", path.display()))
    }

    /// Serializes the matrix back to TOML, as written by `init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize matrix configuration")
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}
