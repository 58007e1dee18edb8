use crate::commands::registry::{BuiltinCommand, Flow};
use crate::errors::{ShellError, ShellResult};
use crate::state::ShellState;
use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

const HOME_VAR: &str = "HOME";

pub struct CdCommand;

/// Expand a leading `~` or `~/` from `home`.
fn expand_home(path: &str, home: Option<OsString>) -> ShellResult<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home.ok_or_else(|| ShellError::invalid_argument("cd", "HOME not set"))?;
    let mut expanded = PathBuf::from(home);
    if let Some(sub) = rest.strip_prefix('/').filter(|sub| !sub.is_empty()) {
        expanded.push(sub);
    }
    Ok(expanded)
}

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn execute(
        &self,
        args: &[String],
        _state: &mut ShellState,
        _out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        let path = args.get(1).ok_or(ShellError::MissingArgument("cd"))?;
        let target = expand_home(path, env::var_os(HOME_VAR))?;

        env::set_current_dir(&target)
            .map_err(|_| ShellError::InvalidDirectory(target.display().to_string()))?;
        Ok(Flow::Continue)
    }
}
