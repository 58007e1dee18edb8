use crate::commands::registry::{Flow, BUILTINS};
use crate::errors::{ShellError, ShellResult};
use crate::process::{self, ChildImage, Pipes};
use crate::redirection::{extract_redirects, RedirectSpec};
use crate::state::ShellState;
use crate::tokenizer::{words, Token};
use std::io;
use tracing::debug;

const PIPE: &str = "|";

/// One command of a pipeline with its own redirections.
///
/// Only [`parse_pipeline`] builds stages, so `args` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    args: Vec<String>,
    redirect: RedirectSpec,
}

impl PipelineStage {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn redirect(&self) -> &RedirectSpec {
        &self.redirect
    }

    pub fn command(&self) -> &str {
        &self.args[0]
    }

    fn is_builtin(&self) -> bool {
        BUILTINS.is_builtin(self.command())
    }
}

/// Split tokens on unquoted `|`.
///
/// A `|` at either end, or two in a row, is a syntax error. No tokens gives
/// no segments.
pub fn split_pipeline(tokens: Vec<Token>) -> ShellResult<Vec<Vec<Token>>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token.is_operator(PIPE) {
            if current.is_empty() {
                return Err(ShellError::UnexpectedToken(PIPE.to_string()));
            }
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }

    if current.is_empty() {
        if !segments.is_empty() {
            return Err(ShellError::UnexpectedToken(PIPE.to_string()));
        }
    } else {
        segments.push(current);
    }

    Ok(segments)
}

/// Turn a tokenized line into validated stages.
///
/// Fails without side effects if any segment is malformed, so a pipeline is
/// either run whole or not at all.
pub fn parse_pipeline(tokens: Vec<Token>) -> ShellResult<Vec<PipelineStage>> {
    let segments = split_pipeline(tokens)?;
    let last = segments.len().saturating_sub(1);

    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            let (args, redirect) = extract_redirects(segment)?;
            if args.is_empty() {
                return Err(ShellError::EmptyCommand);
            }
            let args = words(args);
            if index < last && redirect.stdout.is_some() {
                return Err(ShellError::MisplacedRedirection(args[0].clone()));
            }
            Ok(PipelineStage { args, redirect })
        })
        .collect()
}

/// Run stages to completion.
///
/// A lone builtin without redirections runs in the shell process so that
/// `cd` and `exit` can act on it; every other stage is forked, builtins
/// included.
pub fn execute_pipeline(stages: &[PipelineStage], state: &mut ShellState) -> ShellResult<Flow> {
    match stages {
        [] => Ok(Flow::Continue),
        [stage] if stage.is_builtin() && stage.redirect.is_empty() => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            BUILTINS
                .dispatch(&stage.args, state, &mut out)
                .unwrap_or(Ok(Flow::Continue))
        }
        _ => {
            let codes = spawn_and_wait(stages, state)?;
            debug!(stages = stages.len(), ?codes, status = codes.last().copied(), "pipeline.complete");
            Ok(Flow::Continue)
        }
    }
}

fn spawn_and_wait(stages: &[PipelineStage], state: &mut ShellState) -> ShellResult<Vec<i32>> {
    let pipes = Pipes::allocate(stages.len() - 1)?;
    debug!(stages = stages.len(), pipes = pipes.len(), "pipeline.start");

    let mut children = Vec::with_capacity(stages.len());
    let mut spawn_error = None;
    for (stage, wiring) in stages.iter().zip(process::plan_wiring(stages.len())) {
        let image = if stage.is_builtin() {
            ChildImage::Builtin(&stage.args)
        } else {
            ChildImage::External(&stage.args)
        };
        match process::spawn(wiring, &stage.redirect, &pipes, image, state) {
            Ok(pid) => children.push(pid),
            Err(err) => {
                spawn_error = Some(err);
                break;
            }
        }
    }

    // Readers only see end-of-stream once the parent's write ends are gone.
    drop(pipes);
    let codes = process::wait_all(&children);

    match spawn_error {
        Some(err) => Err(err),
        None => codes,
    }
}
