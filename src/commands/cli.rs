use crate::errors::ShellError;
use clap::Parser;
use std::path::PathBuf;

/// Arguments of the `history` builtin.
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "history", disable_help_flag = true, disable_version_flag = true)]
pub struct HistoryArgs {
    /// Append the lines of FILE to the history list
    #[arg(short = 'r', value_name = "FILE", conflicts_with_all = ["write", "append", "count"])]
    pub read: Option<PathBuf>,

    /// Overwrite FILE with the whole history list
    #[arg(short = 'w', value_name = "FILE", conflicts_with_all = ["append", "count"])]
    pub write: Option<PathBuf>,

    /// Append the entries not yet written to FILE
    #[arg(short = 'a', value_name = "FILE", conflicts_with = "count")]
    pub append: Option<PathBuf>,

    /// Show only the last N entries
    #[arg(value_name = "N")]
    pub count: Option<String>,
}

/// What a `history` invocation asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum HistoryAction {
    List(Option<usize>),
    Read(PathBuf),
    Write(PathBuf),
    Append(PathBuf),
}

impl HistoryArgs {
    /// Parse `args` (with `args[0] == "history"`) into an action.
    pub fn parse_action(args: &[String]) -> Result<HistoryAction, ShellError> {
        let parsed = HistoryArgs::try_parse_from(args).map_err(|err| {
            let rendered = err.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            ShellError::invalid_argument("history", first.trim_start_matches("error: "))
        })?;
        parsed.into_action()
    }

    fn into_action(self) -> Result<HistoryAction, ShellError> {
        if let Some(path) = self.read {
            return Ok(HistoryAction::Read(path));
        }
        if let Some(path) = self.write {
            return Ok(HistoryAction::Write(path));
        }
        if let Some(path) = self.append {
            return Ok(HistoryAction::Append(path));
        }
        match self.count {
            None => Ok(HistoryAction::List(None)),
            Some(count) => count.parse::<usize>().map(|n| HistoryAction::List(Some(n))).map_err(|_| {
                ShellError::invalid_argument("history", format!("{count}: numeric argument required"))
            }),
        }
    }
}
