//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests for `ToolchainConfig` and `MatrixConfig`: the built-in matrix,
//! configure arguments, working directory names and TOML loading.
//!
//! 测试 `ToolchainConfig` 和 `MatrixConfig`：内置矩阵、配置参数、工作目录名称和 TOML 加载。

use build_matrix::config::{
    MatrixConfig, ToolchainConfig, Tools, default_toolchains, split_command_line,
};
use std::path::{Path, PathBuf};

#[cfg(test)]
mod toolchain_tests {
    use super::*;

    #[test]
    fn test_builtin_matrix_has_three_toolchains() {
        let names: Vec<String> = default_toolchains().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["gcc", "clang", "msvc"]);
    }

    #[test]
    fn test_gcc_configure_args() {
        let gcc = default_toolchains().remove(0);
        assert_eq!(
            gcc.configure_args(),
            vec![
                "-G",
                "Ninja",
                "-DCMAKE_CXX_COMPILER=g++",
                "-DCMAKE_C_COMPILER=gcc"
            ]
        );
    }

    #[test]
    fn test_msvc_uses_platform_defaults() {
        let msvc = default_toolchains().remove(2);
        assert_eq!(msvc.name, "msvc");
        assert!(msvc.configure_args().is_empty());
    }

    #[test]
    fn test_extra_args_come_last() {
        let toolchain = ToolchainConfig {
            generator: Some("Unix Makefiles".to_string()),
            extra_args: vec!["-DFOO=ON".to_string()],
            ..ToolchainConfig::new("make")
        };
        assert_eq!(
            toolchain.configure_args(),
            vec!["-G", "Unix Makefiles", "-DFOO=ON"]
        );
    }

    #[test]
    fn test_working_dir_name_is_derived_from_name() {
        assert_eq!(ToolchainConfig::new("gcc").working_dir_name(), "build-gcc");
        assert_eq!(
            ToolchainConfig::new("clang 17/libc++").working_dir_name(),
            "build-clang_17_libc__"
        );
        assert_eq!(
            ToolchainConfig::new("gcc-13_x").working_dir(Path::new("/project")),
            PathBuf::from("/project/build-gcc-13_x")
        );
    }
}

#[cfg(test)]
mod matrix_tests {
    use super::*;

    #[test]
    fn test_empty_file_means_builtin_matrix() {
        let matrix = MatrixConfig::from_toml("").unwrap();
        assert_eq!(matrix.toolchains, default_toolchains());
        assert_eq!(matrix.source_dir, PathBuf::from("test"));
        assert_eq!(matrix.build_type, "Debug");
        assert_eq!(matrix.tools, Tools::default());
        assert!(matrix.language.is_none());
        assert!(matrix.step_timeout().is_none());
    }

    #[test]
    fn test_full_matrix_deserialization() {
        let toml_str = r#"
            language = "zh-CN"
            source_dir = "tests/cpp"
            build_type = "Release"
            step_timeout_secs = 90

            [tools]
            cmake = "/opt/cmake/bin/cmake"

            [[toolchains]]
            name = "gcc-13"
            generator = "Ninja"
            c_compiler = "gcc-13"
            cxx_compiler = "g++-13"
            extra_args = ["-DSANITIZE=ON"]
            env = { CCACHE_DISABLE = "1" }
        "#;

        let matrix = MatrixConfig::from_toml(toml_str).unwrap();
        assert_eq!(matrix.language.as_deref(), Some("zh-CN"));
        assert_eq!(matrix.source_dir, PathBuf::from("tests/cpp"));
        assert_eq!(matrix.build_type, "Release");
        assert_eq!(matrix.step_timeout().unwrap().as_secs(), 90);
        assert_eq!(matrix.tools.cmake, "/opt/cmake/bin/cmake");
        assert_eq!(matrix.tools.ctest, "ctest");
        assert_eq!(matrix.toolchains.len(), 1);

        let toolchain = &matrix.toolchains[0];
        assert_eq!(toolchain.extra_args, vec!["-DSANITIZE=ON"]);
        assert_eq!(toolchain.env.get("CCACHE_DISABLE").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_toolchain_without_name_is_rejected() {
        let toml_str = r#"
            [[toolchains]]
            generator = "Ninja"
        "#;
        assert!(MatrixConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(MatrixConfig::from_toml("[[toolchains]\nname = \"x\"").is_err());
    }

    #[test]
    fn test_serialized_default_matrix_loads_back() {
        let toml_str = MatrixConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("name = \"clang\""));
        assert!(toml_str.contains("cxx_compiler = \"clang++\""));

        let matrix = MatrixConfig::from_toml(&toml_str).unwrap();
        assert_eq!(matrix.toolchains, default_toolchains());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = MatrixConfig::load(Path::new("/definitely/not/here/BuildMatrix.toml"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read matrix file"));
    }
}

#[cfg(test)]
mod command_line_tests {
    use super::*;

    #[test]
    fn test_split_plain_program() {
        let (program, args) = split_command_line("cmake").unwrap();
        assert_eq!(program, "cmake");
        assert!(args.is_empty());
    }

    #[test]
    fn test_split_wrapper_with_quoted_path() {
        let (program, args) = split_command_line("sh '/tmp/my tools/fake-cmake'").unwrap();
        assert_eq!(program, "sh");
        assert_eq!(args, vec!["/tmp/my tools/fake-cmake"]);
    }

    #[test]
    fn test_split_rejects_empty_and_unbalanced() {
        assert!(split_command_line("   ").is_err());
        assert!(split_command_line("cmake \"unterminated").is_err());
    }
}
