use crate::commands::cli::{HistoryAction, HistoryArgs};
use crate::commands::registry::{BuiltinCommand, Flow};
use crate::errors::ShellResult;
use crate::state::ShellState;
use std::io::Write;

pub struct HistoryCommand;

impl BuiltinCommand for HistoryCommand {
    fn name(&self) -> &'static str {
        "history"
    }

    fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow> {
        let history = &mut state.history;
        match HistoryArgs::parse_action(args)? {
            HistoryAction::List(count) => {
                for (index, entry) in history.tail(count.unwrap_or(usize::MAX)) {
                    writeln!(out, "{:>5}  {}", index, entry)?;
                }
            }
            HistoryAction::Read(path) => {
                history.read_from(&path)?;
            }
            HistoryAction::Write(path) => history.write_to(&path)?,
            HistoryAction::Append(path) => history.append_to(&path)?,
        }
        Ok(Flow::Continue)
    }
}
