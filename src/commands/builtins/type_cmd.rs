use crate::commands::external::{find_executable_in, PATH_VAR};
use crate::commands::registry::{BuiltinCommand, Flow, BUILTINS};
use crate::errors::{ShellError, ShellResult};
use crate::state::ShellState;
use std::env;
use std::ffi::OsStr;
use std::io::Write;

pub struct TypeCommand;

/// Report how `name` would be run, resolving externals on `path_var`.
fn describe_in(name: &str, path_var: Option<&OsStr>, out: &mut dyn Write) -> ShellResult<()> {
    if BUILTINS.is_builtin(name) {
        writeln!(out, "{} is a shell builtin", name)?;
    } else if let Some(path) = find_executable_in(name, path_var) {
        writeln!(out, "{} is {}", name, path.display())?;
    } else {
        writeln!(out, "{}: not found", name)?;
    }
    Ok(())
}

impl BuiltinCommand for TypeCommand {
    fn name(&self) -> &'static str {
        "type"
    }

    fn execute(
        &self,
        args: &[String],
        _state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        let names = &args[1..];
        if names.is_empty() {
            return Err(ShellError::MissingArgument("type"));
        }

        let path_var = env::var_os(PATH_VAR);
        for name in names {
            describe_in(name, path_var.as_deref(), out)?;
        }
        Ok(Flow::Continue)
    }
}
