//! # Command Execution Module / 命令执行模块
//!
//! Spawns external tools, captures their combined output and renders command
//! lines for logs.
//!
//! 启动外部工具，捕获其合并输出，并为日志渲染命令行。

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Buffer shared by the stdout and stderr readers of one process.
/// 同一进程的 stdout 和 stderr 读取任务共享的缓冲区。
pub type OutputBuffer = Arc<Mutex<String>>;

/// Upper bound on draining the output readers once the process is gone;
/// a detached grandchild may keep the pipes open indefinitely.
const READER_GRACE: Duration = Duration::from_secs(2);

/// A running process whose stdout and stderr are appended to an
/// [`OutputBuffer`]. The caller keeps its own handle on the buffer, so
/// whatever was captured survives a timeout or cancellation.
///
/// 一个正在运行的进程，其 stdout 和 stderr 被追加到 [`OutputBuffer`]。
/// 调用方持有自己的缓冲区句柄，因此超时或取消后已捕获的内容依然保留。
pub struct CapturedChild {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

/// Spawns `cmd` with stdin closed and both output streams captured into
/// `output`. On Unix the process leads its own process group so that
/// [`CapturedChild::terminate`] reaches everything it started.
///
/// 以关闭的 stdin 启动 `cmd`，并将两个输出流捕获到 `output`。
/// 在 Unix 上，该进程是其自身进程组的组长，
/// 因此 [`CapturedChild::terminate`] 能够终止它启动的所有进程。
pub fn spawn_captured(mut cmd: Command, output: OutputBuffer) -> io::Result<CapturedChild> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn()?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.start_kill();
        return Err(io::Error::other("failed to capture process output"));
    };

    // Both readers append to the same buffer so the interleaving roughly
    // follows what a terminal would have shown.
    // 两个读取任务追加到同一个缓冲区，使交错顺序大致与终端显示一致。
    let readers = vec![
        spawn_reader(stdout, Arc::clone(&output)),
        spawn_reader(stderr, output),
    ];

    Ok(CapturedChild { child, readers })
}

fn spawn_reader<R>(stream: R, output: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    })
}

impl CapturedChild {
    /// Waits for the process to exit and for its output to be drained.
    /// Cancel-safe: dropping the future leaves the child running and
    /// `terminate` can still be called.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait().await;
        self.join_readers().await;
        status
    }

    /// Kills the process together with its process group, reaps it and
    /// drains the remaining output.
    ///
    /// 终止进程及其进程组，回收该进程并读取剩余输出。
    pub async fn terminate(&mut self) -> io::Result<ExitStatus> {
        self.kill_process_group();
        let status = self.child.wait().await;
        self.join_readers().await;
        status
    }

    fn kill_process_group(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // The child was spawned with `process_group(0)`, so its pid is the group id.
                let killed = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } == 0;
                if killed {
                    return;
                }
            }
        }
        let _ = self.child.start_kill();
    }

    async fn join_readers(&mut self) {
        while let Some(handle) = self.readers.last_mut() {
            match tokio::time::timeout(READER_GRACE, &mut *handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => eprintln!("Failed to join output reader: {}", e),
                Err(_) => handle.abort(),
            }
            self.readers.pop();
        }
    }
}

/// Renders a program and its arguments as a shell-quoted command line.
/// Falls back to plain space separation for arguments that cannot be quoted.
///
/// 将程序及其参数渲染为经过 shell 引用的命令行。
/// 对无法引用的参数回退为普通空格分隔。
pub fn render_command_line<I, S>(program: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let words: Vec<String> = std::iter::once(program.to_string())
        .chain(
            args.into_iter()
                .map(|a| a.as_ref().to_string_lossy().into_owned()),
        )
        .collect();
    shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
}
