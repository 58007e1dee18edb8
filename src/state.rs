use crate::history::History;
use nix::unistd::{getpid, Pid};

/// Process-local interpreter state, written only by the read loop.
#[derive(Debug)]
pub struct ShellState {
    pub history: History,
    shell_pid: Pid,
}

impl ShellState {
    /// Record the calling process as the top-level shell.
    pub fn new(history: History) -> Self {
        Self {
            history,
            shell_pid: getpid(),
        }
    }

    /// False inside a child forked for a pipeline stage or redirected builtin.
    pub fn is_top_level(&self) -> bool {
        getpid() == self.shell_pid
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(History::new())
    }
}
