pub mod commands;
pub mod completion;
pub mod config;
pub mod errors;
pub mod history;
pub mod pipeline;
pub mod process;
pub mod redirection;
pub mod repl;
pub mod state;
pub mod tokenizer;

use config::ShellConfig;
use errors::ShellResult;
use repl::Repl;

/// Main entry point for the shell REPL. Returns the status to exit with.
pub fn run_shell(config: ShellConfig) -> ShellResult<i32> {
    Repl::new(config)?.run()
}
