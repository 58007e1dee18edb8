use crate::commands::registry::{BuiltinCommand, Flow};
use crate::errors::{ShellError, ShellResult};
use crate::process;
use crate::state::ShellState;
use std::io::Write;

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        if !state.is_top_level() {
            // Inside a pipeline or redirected child: end only this process.
            out.flush()?;
            process::exit_child(0);
        }

        let code = match args.get(1) {
            None => 0,
            Some(arg) => arg.parse::<i32>().map_err(|_| {
                ShellError::invalid_argument("exit", format!("{arg}: numeric argument required"))
            })?,
        };
        Ok(Flow::Exit(code))
    }
}
