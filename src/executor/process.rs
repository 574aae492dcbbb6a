//! Low-level child process execution with a wall-clock timeout.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use wait_timeout::ChildExt;

use super::ExecError;

/// Timeout for collecting output from child process pipes after exit
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured size per stream (10MB)
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Raw result of a finished or killed child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was killed by a signal or timed out
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration: Duration,
}

/// Run `command` to completion or until `timeout` elapses.
///
/// Stdout and stderr are drained on background threads while waiting, so a
/// chatty child cannot block on a full pipe. On timeout the child (and on Unix
/// its whole process group) is killed.
pub fn run_with_timeout(
    mut command: Command,
    label: &str,
    timeout: Duration,
) -> Result<ProcessOutput, ExecError> {
    let start = Instant::now();

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    isolate_process_group(&mut command);

    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        program: label.to_string(),
        source,
    })?;

    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let wait_result = child.wait_timeout(timeout).map_err(|source| ExecError::Wait {
        program: label.to_string(),
        source,
    })?;

    let timed_out = wait_result.is_none();
    if timed_out {
        kill_child_process(&mut child);
    }

    let stdout = stdout_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());
    let stderr = stderr_rx
        .recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string());

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code: wait_result.and_then(|status| status.code()),
        timed_out,
        duration: start.elapsed(),
    })
}

/// Build a shell invocation for a free-form command line.
///
/// Uses `sh -c` on Unix and `cmd /C` on Windows; the command line is passed as
/// a single argument.
pub fn shell_command(command_line: &str, working_dir: &Path) -> Command {
    let mut cmd = if cfg!(target_family = "unix") {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    } else {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    };
    cmd.current_dir(working_dir);
    cmd
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_stream_to_string(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

/// Read a stream to string, keeping at most MAX_OUTPUT_SIZE bytes.
///
/// Excess data is drained and discarded so the writer never sees a broken pipe.
fn read_stream_to_string<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&chunk[..to_copy]);
                if to_copy < n {
                    let mut discard = [0u8; 8192];
                    while stream.read(&mut discard).unwrap_or(0) > 0 {}
                    buf.extend_from_slice(b"\n[output truncated at 10MB]");
                    break;
                }
            }
            Err(_) => {
                if buf.is_empty() {
                    return "[error reading output]".to_string();
                }
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_command: &mut Command) {}

/// Kill a timed-out child and reap it.
///
/// On Unix the child leads its own process group, so helpers it spawned are
/// signalled too.
fn kill_child_process(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Ok(pid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
