// Shared test helpers: a scratch project root with fake `cmake` / `ctest`
// shell scripts that record every invocation and can be told to fail or hang.
#![allow(dead_code)]

use build_matrix::config::Tools;
use build_matrix::execution::PipelineSettings;
use build_matrix::models::Step;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tempfile::{TempDir, tempdir};

/// What a fake tool does for one `<step> <working dir name>` pair.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// Print a message on stderr and exit with the given code.
    Fail(i32),
    /// Print a line, then wait on a background `sleep` far longer than any
    /// test timeout. The sleep's pid goes to `fake-bin/<step>-<dir>.pid`.
    Hang,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub step: &'static str,
    pub dir_name: &'static str,
    pub action: Action,
}

pub fn fail(step: &'static str, dir_name: &'static str) -> Rule {
    Rule {
        step,
        dir_name,
        action: Action::Fail(1),
    }
}

pub fn hang(step: &'static str, dir_name: &'static str) -> Rule {
    Rule {
        step,
        dir_name,
        action: Action::Hang,
    }
}

pub struct FakeProject {
    pub dir: TempDir,
    pub calls_log: PathBuf,
    pub tools: Tools,
}

impl FakeProject {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Every recorded invocation, e.g. `"configure build-gcc"`.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.calls_log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    /// Pid of the background `sleep` started by a [`Action::Hang`] rule.
    pub fn hung_pid(&self, step: &str, dir_name: &str) -> Option<u32> {
        let path = self
            .root()
            .join("fake-bin")
            .join(format!("{step}-{dir_name}.pid"));
        fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            source_dir: self.root().join("test"),
            build_type: "Debug".to_string(),
            tools: self.tools.clone(),
            step_timeout: None,
            stop_after: Step::Test,
            locale: "en".to_string(),
        }
    }

    /// Writes a `BuildMatrix.toml` that uses the fake tools and the built-in
    /// toolchains, plus any extra TOML appended verbatim.
    pub fn write_matrix(&self, extra: &str) -> PathBuf {
        let path = self.root().join("BuildMatrix.toml");
        let content = format!(
            "language = \"en\"\n{extra}\n[tools]\ncmake = {:?}\nctest = {:?}\n",
            self.tools.cmake, self.tools.ctest
        );
        fs::write(&path, content).expect("Failed to write BuildMatrix.toml");
        path
    }
}

fn rule_lines(rules: &[Rule], bin: &Path, mode_filter: impl Fn(&str) -> bool) -> String {
    rules
        .iter()
        .filter(|r| mode_filter(r.step))
        .map(|r| {
            let body = match r.action {
                Action::Fail(code) => format!(
                    "echo \"simulated {} failure for {}\" >&2; exit {}",
                    r.step, r.dir_name, code
                ),
                Action::Hang => format!(
                    "echo \"partial {step} output for {dir}\"; sleep 30 & echo $! > '{pid}'; wait $!",
                    step = r.step,
                    dir = r.dir_name,
                    pid = bin.join(format!("{}-{}.pid", r.step, r.dir_name)).display(),
                ),
            };
            format!(
                "if [ \"$mode $name\" = \"{} {}\" ]; then {}; fi\n",
                r.step, r.dir_name, body
            )
        })
        .collect()
}

/// Creates a project root with an empty `test/` source directory and fake
/// tools driven by `rules`.
pub fn fake_project(rules: &[Rule]) -> FakeProject {
    let dir = tempdir().expect("Failed to create temporary directory");
    fs::create_dir_all(dir.path().join("test")).expect("Failed to create test directory");

    let bin = dir.path().join("fake-bin");
    fs::create_dir_all(&bin).expect("Failed to create fake-bin directory");
    let calls_log = bin.join("calls.log");

    let cmake_script = format!(
        r#"#!/bin/sh
mode=configure
dir=
while [ "$#" -gt 0 ]; do
  case "$1" in
    --build) mode=build; dir="$2"; shift 2 ;;
    -B) dir="$2"; shift 2 ;;
    *) shift ;;
  esac
done
name=$(basename "$dir")
echo "$mode $name" >> '{calls}'
if [ -n "$BM_MARKER" ]; then echo "env $name $BM_MARKER" >> '{calls}'; fi
{rules}echo "-- $mode done for $name"
exit 0
"#,
        calls = calls_log.display(),
        rules = rule_lines(rules, &bin, |step| step != "test"),
    );

    let ctest_script = format!(
        r#"#!/bin/sh
mode=test
name=$(basename "$(pwd -P)")
echo "$mode $name" >> '{calls}'
{rules}echo "100% tests passed, 0 tests failed out of 1"
exit 0
"#,
        calls = calls_log.display(),
        rules = rule_lines(rules, &bin, |step| step == "test"),
    );

    let cmake_path = bin.join("fake-cmake");
    let ctest_path = bin.join("fake-ctest");
    fs::write(&cmake_path, cmake_script).expect("Failed to write fake cmake");
    fs::write(&ctest_path, ctest_script).expect("Failed to write fake ctest");

    let tools = Tools {
        cmake: format!("sh {}", quote(&cmake_path)),
        ctest: format!("sh {}", quote(&ctest_path)),
    };

    FakeProject {
        dir,
        calls_log,
        tools,
    }
}

fn quote(path: &Path) -> String {
    shlex::try_quote(&path.to_string_lossy())
        .expect("Path cannot be quoted")
        .into_owned()
}

/// Polls `ps` until `pid` is gone or a zombie, for at most `limit`.
pub fn wait_for_exit(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        let output = Command::new("ps")
            .args(["-o", "stat=", "-p", &pid.to_string()])
            .output()
            .expect("Failed to run ps");
        let stat = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stat.is_empty() || stat.starts_with('Z') {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
