//! # File System Operations Module / 文件系统操作模块
//!
//! Cleanup of stale build directories, creation of working directories and
//! step log files.
//!
//! 清理旧的构建目录、创建工作目录和步骤日志文件。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::BUILD_DIR_PREFIX;
use crate::core::models::Step;

/// Errors raised while removing stale build directories.
/// 删除旧构建目录时产生的错误。
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to list project root {path}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove stale build directory {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CleanupError {
    pub fn path(&self) -> &Path {
        match self {
            CleanupError::ReadRoot { path, .. } | CleanupError::Remove { path, .. } => path,
        }
    }
}

/// Deletes every top-level directory of `project_root` whose name starts
/// with the reserved `build` prefix and returns the removed paths, sorted.
///
/// Only real directories are removed; regular files such as `build.sh` and
/// symbolic links are left alone. The listing is read once, before anything
/// is deleted.
///
/// 删除 `project_root` 下所有名称以保留前缀 `build` 开头的顶级目录，
/// 并返回已删除的路径（已排序）。
///
/// 只删除真正的目录；`build.sh` 之类的普通文件和符号链接保持不变。
/// 目录列表只在删除之前读取一次。
pub fn prepare(project_root: &Path) -> Result<Vec<PathBuf>, CleanupError> {
    let read_root = |source| CleanupError::ReadRoot {
        path: project_root.to_path_buf(),
        source,
    };

    let mut stale = Vec::new();
    for entry in fs::read_dir(project_root).map_err(read_root)? {
        let entry = entry.map_err(read_root)?;
        let file_type = entry.file_type().map_err(read_root)?;
        if !file_type.is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_string_lossy()
            .starts_with(BUILD_DIR_PREFIX)
        {
            stale.push(entry.path());
        }
    }
    stale.sort();

    for path in &stale {
        fs::remove_dir_all(path).map_err(|source| CleanupError::Remove {
            path: path.clone(),
            source,
        })?;
    }
    Ok(stale)
}

/// Creates a toolchain's working directory (and any missing parents).
/// 创建工具链的工作目录（以及任何缺失的父目录）。
pub fn create_working_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Path of the log file that holds a step's captured output.
/// 保存步骤捕获输出的日志文件路径。
pub fn step_log_path(working_dir: &Path, step: Step) -> PathBuf {
    working_dir.join(format!("build-matrix-{}.log", step.as_str()))
}

/// Writes a step's captured output next to the build artifacts and returns
/// the path of the log file.
pub fn write_step_log(working_dir: &Path, step: Step, output: &str) -> io::Result<PathBuf> {
    let path = step_log_path(working_dir, step);
    fs::write(&path, output)?;
    Ok(path)
}
