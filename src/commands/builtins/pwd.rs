use crate::commands::registry::{BuiltinCommand, Flow};
use crate::errors::{ShellError, ShellResult};
use crate::state::ShellState;
use std::env;
use std::io::Write;

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    fn execute(
        &self,
        _args: &[String],
        _state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        let current_dir = env::current_dir().map_err(|source| ShellError::CommandIo {
            command: "pwd",
            source,
        })?;
        writeln!(out, "{}", current_dir.display())?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtins::test_support::{args, lock_current_dir};

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = env::current_dir().unwrap();

        let mut out = Vec::new();
        PwdCommand
            .execute(&args(&["pwd"]), &mut ShellState::default(), &mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", cur.display()));
    }
}
