//! # Core Module / 核心模块
//!
//! This module contains the build matrix itself: toolchain configuration,
//! outcome models, planning and the pipeline execution engine.
//!
//! 此模块包含构建矩阵本身：工具链配置、结果模型、计划和流水线执行引擎。

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;

// Re-exports
pub use config::{MatrixConfig, ToolchainConfig};
pub use execution::{PipelineSettings, run_all, run_configuration};
pub use models::{BuildOutcome, BuildStatus, Step};
pub use crate::infra::fs::{CleanupError, prepare};
