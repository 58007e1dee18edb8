use crate::commands::registry::{BuiltinCommand, Flow};
use crate::errors::ShellResult;
use crate::state::ShellState;
use std::io::Write;

pub struct EchoCommand;

impl BuiltinCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn execute(
        &self,
        args: &[String],
        _state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        writeln!(out, "{}", args[1..].join(" "))?;
        Ok(Flow::Continue)
    }
}
