use std::env;
use std::path::PathBuf;

/// Environment variable naming the history file.
pub const HISTFILE_VAR: &str = "HISTFILE";

/// Environment variable holding the `tracing` filter directives.
pub const LOG_VAR: &str = "LOCALSHELL_LOG";

/// Filter used when `LOCALSHELL_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Loaded at startup and overwritten with the full log at exit.
    pub history_file: Option<PathBuf>,
    pub prompt: String,
    pub continuation_prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            prompt: "$ ".to_string(),
            continuation_prompt: "> ".to_string(),
        }
    }
}

impl ShellConfig {
    pub fn from_env() -> Self {
        Self {
            history_file: env::var_os(HISTFILE_VAR)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            ..Self::default()
        }
    }
}
