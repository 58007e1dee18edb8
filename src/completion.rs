use crate::commands::external::{executables_with_prefix, executables_with_prefix_in};
use crate::commands::registry::BUILTINS;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::collections::BTreeSet;
use std::ffi::OsStr;

fn with_builtins(prefix: &str, mut names: BTreeSet<String>) -> Vec<String> {
    names.extend(
        BUILTINS
            .builtin_names()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string),
    );
    names.into_iter().collect()
}

/// Command names starting with `prefix`: builtins and executables on `PATH`,
/// sorted and de-duplicated.
pub fn complete_command(prefix: &str) -> Vec<String> {
    with_builtins(prefix, executables_with_prefix(prefix))
}

/// [`complete_command`] against an explicit search path.
pub fn complete_command_in(prefix: &str, path_var: Option<&OsStr>) -> Vec<String> {
    with_builtins(prefix, executables_with_prefix_in(prefix, path_var))
}

/// Shell completer for tab completion of commands
#[derive(Clone, Default)]
pub struct ShellCompleter;

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        let prefix = input.trim_start();

        // Only the command word is completed.
        if prefix.contains([' ', '\t']) {
            return Ok((pos, Vec::new()));
        }

        let mut candidates: Vec<Pair> = complete_command(prefix)
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();

        if let [only] = candidates.as_mut_slice() {
            only.replacement.push(' ');
        }

        Ok((pos - prefix.len(), candidates))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ShellCompleter {}

impl Validator for ShellCompleter {}

impl Helper for ShellCompleter {}
