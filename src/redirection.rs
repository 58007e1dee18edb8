use crate::errors::{ShellError, ShellResult};
use crate::tokenizer::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

/// Matches the six redirection spellings: `>`, `1>`, `>>`, `1>>`, `2>`, `2>>`.
static REDIRECT_OPERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([12]?)(>>?)$").expect("redirection operator pattern"));

/// Permission bits for files created by redirection.
const REDIRECT_FILE_MODE: u32 = 0o644;

/// Redirection mode (overwrite or append)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionMode {
    Overwrite,
    Append,
}

/// A file a stream is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: PathBuf,
    pub mode: RedirectionMode,
}

impl RedirectTarget {
    /// Open the target write-only, creating it if absent.
    pub fn open(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(self.mode == RedirectionMode::Overwrite)
            .append(self.mode == RedirectionMode::Append)
            .mode(REDIRECT_FILE_MODE)
            .open(&self.path)
    }
}

/// Per-stage redirection intent. `None` means the stream is inherited from
/// the parent or the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectSpec {
    pub stdout: Option<RedirectTarget>,
    pub stderr: Option<RedirectTarget>,
}

impl RedirectSpec {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }
}

enum Stream {
    Stdout,
    Stderr,
}

fn classify(token: &Token) -> Option<(Stream, RedirectionMode)> {
    if token.is_quoted() {
        return None;
    }
    let caps = REDIRECT_OPERATOR.captures(token.as_str())?;
    let stream = match &caps[1] {
        "2" => Stream::Stderr,
        _ => Stream::Stdout,
    };
    let mode = match &caps[2] {
        ">>" => RedirectionMode::Append,
        _ => RedirectionMode::Overwrite,
    };
    Some((stream, mode))
}

/// Pull redirection operators and their targets out of a command's tokens.
///
/// Returns the remaining command tokens in order together with the collected
/// spec. A later operator for the same stream replaces the earlier one. An
/// operator without a filename after it is a syntax error.
pub fn extract_redirects(tokens: Vec<Token>) -> ShellResult<(Vec<Token>, RedirectSpec)> {
    let mut filtered = Vec::with_capacity(tokens.len());
    let mut spec = RedirectSpec::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let Some((stream, mode)) = classify(&token) else {
            filtered.push(token);
            continue;
        };

        let target = match iter.next() {
            Some(next) if classify(&next).is_none() && !next.is_operator("|") => next,
            _ => {
                return Err(ShellError::MissingRedirectTarget(token.into_string()));
            }
        };
        let target = Some(RedirectTarget {
            path: PathBuf::from(target.into_string()),
            mode,
        });

        match stream {
            Stream::Stdout => spec.stdout = target,
            Stream::Stderr => spec.stderr = target,
        }
    }

    Ok((filtered, spec))
}
