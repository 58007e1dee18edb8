//! Child-process plumbing for pipeline execution.
//!
//! Every stage runs in its own forked child. The parent allocates the pipes,
//! forks, closes its copies of every pipe end and waits; each child rewires
//! its standard descriptors, closes every pipe end it inherited, applies
//! file redirections, and then either replaces itself with an external
//! program or runs a builtin and exits.

use crate::commands::external::find_executable;
use crate::commands::registry::BUILTINS;
use crate::errors::{ShellError, ShellResult};
use crate::redirection::{RedirectSpec, RedirectTarget};
use crate::state::ShellState;
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use tracing::{debug, trace, warn};

/// Exit status of a child whose program could not be found or executed.
pub const NOT_FOUND_STATUS: i32 = 127;

/// Exit status of a child that could not set up its descriptors.
pub const SETUP_FAILURE_STATUS: i32 = 1;

/// Exit status of a builtin that reported an error.
pub const BUILTIN_FAILURE_STATUS: i32 = 1;

/// Retry a system call interrupted by a signal.
fn syscall<F, T>(mut f: F) -> nix::Result<T>
where
    F: FnMut() -> nix::Result<T>,
{
    loop {
        match f() {
            Err(Errno::EINTR) => (),
            result => return result,
        }
    }
}

/// Which pipes a stage reads from and writes to, by pipe index.
///
/// Pipe `i` connects stage `i`'s stdout to stage `i + 1`'s stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageWiring {
    pub stdin_pipe: Option<usize>,
    pub stdout_pipe: Option<usize>,
}

impl StageWiring {
    /// True if this stage keeps any end of pipe `index` open.
    pub fn uses(&self, index: usize) -> bool {
        self.stdin_pipe == Some(index) || self.stdout_pipe == Some(index)
    }
}

/// Descriptor plan for a pipeline of `stages` commands.
pub fn plan_wiring(stages: usize) -> Vec<StageWiring> {
    (0..stages)
        .map(|index| StageWiring {
            stdin_pipe: index.checked_sub(1),
            stdout_pipe: (index + 1 < stages).then_some(index),
        })
        .collect()
}

/// The pipes of one pipeline run.
///
/// Dropping the value closes every end held by the current process.
#[derive(Debug)]
pub struct Pipes {
    ends: Vec<(OwnedFd, OwnedFd)>,
}

impl Pipes {
    pub fn allocate(count: usize) -> ShellResult<Self> {
        let ends = (0..count)
            .map(|_| syscall(unistd::pipe))
            .collect::<nix::Result<Vec<_>>>()?;
        trace!(count, "pipes.allocate");
        Ok(Self { ends })
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    fn read_end(&self, index: usize) -> RawFd {
        self.ends[index].0.as_raw_fd()
    }

    fn write_end(&self, index: usize) -> RawFd {
        self.ends[index].1.as_raw_fd()
    }

    /// Close every inherited pipe end in a child.
    ///
    /// The child never returns to drop `self`; it either execs or `_exit`s.
    fn close_all_in_child(&self) {
        for (read, write) in &self.ends {
            let _ = unistd::close(read.as_raw_fd());
            let _ = unistd::close(write.as_raw_fd());
        }
    }
}

/// What a forked child turns into once its descriptors are in place.
#[derive(Debug, Clone, Copy)]
pub enum ChildImage<'a> {
    /// Replace the process with the program named by `argv[0]`.
    External(&'a [String]),
    /// Run the builtin named by `argv[0]` and exit.
    Builtin(&'a [String]),
}

impl<'a> ChildImage<'a> {
    fn argv(&self) -> &'a [String] {
        match *self {
            ChildImage::External(argv) | ChildImage::Builtin(argv) => argv,
        }
    }
}

fn flush_std_streams() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

/// Flush buffered output and terminate the current (child) process without
/// running the parent's exit handlers.
pub fn exit_child(status: i32) -> ! {
    flush_std_streams();
    unsafe { libc::_exit(status) }
}

/// Fork one pipeline stage.
///
/// Returns the child's pid in the parent. The child never returns.
pub fn spawn(
    wiring: StageWiring,
    redirect: &RedirectSpec,
    pipes: &Pipes,
    image: ChildImage<'_>,
    state: &mut ShellState,
) -> ShellResult<Pid> {
    // Anything still buffered would otherwise be written by both processes.
    flush_std_streams();

    match syscall(|| unsafe { unistd::fork() })? {
        ForkResult::Parent { child } => {
            debug!(pid = %child, command = %image.argv()[0], ?wiring, "process.spawn");
            Ok(child)
        }
        ForkResult::Child => run_child(wiring, redirect, pipes, image, state),
    }
}

fn run_child(
    wiring: StageWiring,
    redirect: &RedirectSpec,
    pipes: &Pipes,
    image: ChildImage<'_>,
    state: &mut ShellState,
) -> ! {
    let argv = image.argv();
    restore_default_signals();

    if let Err(err) = wire_pipes(wiring, pipes) {
        eprintln!("{}: {}", argv[0], err);
        exit_child(SETUP_FAILURE_STATUS);
    }
    pipes.close_all_in_child();

    if let Err(err) = apply_redirects(redirect) {
        eprintln!("{}: {}", argv[0], err);
        exit_child(SETUP_FAILURE_STATUS);
    }

    let status = match image {
        ChildImage::External(argv) => exec_external(argv),
        ChildImage::Builtin(argv) => run_builtin(argv, state),
    };
    exit_child(status)
}

/// The Rust runtime ignores SIGPIPE and the disposition survives `execv`;
/// a pipeline stage must die when its reader goes away.
fn restore_default_signals() {
    let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };
}

fn wire_pipes(wiring: StageWiring, pipes: &Pipes) -> ShellResult<()> {
    if let Some(index) = wiring.stdin_pipe {
        syscall(|| unistd::dup2(pipes.read_end(index), libc::STDIN_FILENO))?;
    }
    if let Some(index) = wiring.stdout_pipe {
        syscall(|| unistd::dup2(pipes.write_end(index), libc::STDOUT_FILENO))?;
    }
    Ok(())
}

fn redirect_to(target: &RedirectTarget, fd: RawFd) -> ShellResult<()> {
    let file = target.open().map_err(|source| ShellError::RedirectOpen {
        path: target.path.clone(),
        source,
    })?;
    syscall(|| unistd::dup2(file.as_raw_fd(), fd))?;
    Ok(())
}

/// File redirections override the pipe wiring.
fn apply_redirects(redirect: &RedirectSpec) -> ShellResult<()> {
    if let Some(target) = &redirect.stderr {
        redirect_to(target, libc::STDERR_FILENO)?;
    }
    if let Some(target) = &redirect.stdout {
        redirect_to(target, libc::STDOUT_FILENO)?;
    }
    Ok(())
}

fn to_cstring(bytes: &[u8]) -> Option<CString> {
    CString::new(bytes).ok()
}

/// Exec `argv[0]` resolved on the search path. Only returns on failure,
/// after reporting the command as not found on stdout.
fn exec_external(argv: &[String]) -> i32 {
    let name = &argv[0];

    if let Some(path) = find_executable(name) {
        let program = to_cstring(path.as_os_str().as_bytes());
        let args: Option<Vec<CString>> = argv.iter().map(|arg| to_cstring(arg.as_bytes())).collect();
        if let (Some(program), Some(args)) = (program, args) {
            match unistd::execv(&program, &args) {
                Ok(never) => match never {},
                Err(errno) => warn!(command = %name, path = %path.display(), %errno, "process.exec failed"),
            }
        }
    }

    println!("{}", ShellError::CommandNotFound(name.clone()));
    NOT_FOUND_STATUS
}

fn run_builtin(argv: &[String], state: &mut ShellState) -> i32 {
    let result = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        BUILTINS.dispatch(argv, state, &mut out)
    };

    match result {
        Some(Ok(_)) => 0,
        Some(Err(err)) => {
            eprintln!("{}", err);
            BUILTIN_FAILURE_STATUS
        }
        None => exec_external(argv),
    }
}

/// Integer status of a finished child; signals map to `128 + signo`.
fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}

/// Block until `pid` has terminated and return its status.
pub fn wait_child(pid: Pid) -> ShellResult<i32> {
    loop {
        let status = syscall(|| waitpid(pid, None))?;
        if let Some(code) = exit_code(status) {
            debug!(pid = %pid, code, "process.wait complete");
            return Ok(code);
        }
        trace!(pid = %pid, ?status, "process.wait");
    }
}

/// Reap every child in order, even if an earlier wait fails.
pub fn wait_all(children: &[Pid]) -> ShellResult<Vec<i32>> {
    let mut codes = Vec::with_capacity(children.len());
    let mut first_error = None;
    for &pid in children {
        match wait_child(pid) {
            Ok(code) => codes.push(code),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(codes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stage_uses_no_pipes() {
        assert_eq!(
            plan_wiring(1),
            vec![StageWiring {
                stdin_pipe: None,
                stdout_pipe: None
            }]
        );
    }

    #[test]
    fn test_three_stage_wiring() {
        let plan = plan_wiring(3);
        assert_eq!(plan[0], StageWiring { stdin_pipe: None, stdout_pipe: Some(0) });
        assert_eq!(plan[1], StageWiring { stdin_pipe: Some(0), stdout_pipe: Some(1) });
        assert_eq!(plan[2], StageWiring { stdin_pipe: Some(1), stdout_pipe: None });
    }

    #[test]
    fn test_every_pipe_has_exactly_one_reader_and_writer() {
        for stages in 1..8 {
            let plan = plan_wiring(stages);
            assert_eq!(plan.len(), stages);
            for pipe in 0..stages.saturating_sub(1) {
                let writers = plan.iter().filter(|w| w.stdout_pipe == Some(pipe)).count();
                let readers = plan.iter().filter(|w| w.stdin_pipe == Some(pipe)).count();
                let users = plan.iter().filter(|w| w.uses(pipe)).count();
                assert_eq!((writers, readers, users), (1, 1, 2));
            }
        }
    }

    #[test]
    fn test_pipes_allocate_requested_count() {
        let pipes = Pipes::allocate(3).unwrap();
        assert_eq!(pipes.len(), 3);
        assert!(Pipes::allocate(0).unwrap().is_empty());
    }

    #[test]
    fn test_exit_codes_from_wait_status() {
        let pid = Pid::from_raw(42);
        assert_eq!(exit_code(WaitStatus::Exited(pid, 3)), Some(3));
        assert_eq!(
            exit_code(WaitStatus::Signaled(pid, Signal::SIGKILL, false)),
            Some(137)
        );
        assert_eq!(exit_code(WaitStatus::StillAlive), None);
    }

    #[test]
    fn test_syscall_retries_interrupted_calls() {
        let mut attempts = 0;
        let result = syscall(|| {
            attempts += 1;
            if attempts < 3 {
                Err(Errno::EINTR)
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result, Ok(3));
    }
}
