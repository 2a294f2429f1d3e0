//! # Commands Module / 命令模块
//!
//! `run` drives the build matrix, `init` writes a matrix file.
//! `run` 驱动构建矩阵，`init` 写入矩阵文件。

pub mod init;
pub mod run;
