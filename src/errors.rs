use nix::errno::Errno;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Comprehensive error type for shell operations
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("syntax error near unexpected token `{0}'")]
    UnexpectedToken(String),

    #[error("syntax error: expected filename after '{0}'")]
    MissingRedirectTarget(String),

    #[error("{0}: output redirection is only allowed on the last command of a pipeline")]
    MisplacedRedirection(String),

    #[error("syntax error: missing command")]
    EmptyCommand,

    #[error("unexpected EOF while looking for matching quote")]
    UnterminatedQuote,

    #[error("cd: {0}: No such file or directory")]
    InvalidDirectory(String),

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("{command}: {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },

    #[error("{command}: {source}")]
    CommandIo {
        command: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("history: {}: {source}", .path.display())]
    HistoryFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    RedirectOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("fatal: {0}")]
    Os(#[from] Errno),
}

impl ShellError {
    /// Errors after which the interpreter cannot safely keep creating processes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Os(_))
    }

    /// Errors that discard the whole input line before anything runs.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ShellError::UnexpectedToken(_)
                | ShellError::MissingRedirectTarget(_)
                | ShellError::MisplacedRedirection(_)
                | ShellError::EmptyCommand
                | ShellError::UnterminatedQuote
        )
    }

    pub(crate) fn invalid_argument(command: &'static str, message: impl Into<String>) -> Self {
        ShellError::InvalidArgument {
            command,
            message: message.into(),
        }
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_shell_diagnostics() {
        assert_eq!(
            ShellError::CommandNotFound("invalidcmd".into()).to_string(),
            "invalidcmd: command not found"
        );
        assert_eq!(
            ShellError::UnexpectedToken("|".into()).to_string(),
            "syntax error near unexpected token `|'"
        );
        assert_eq!(
            ShellError::InvalidDirectory("/nonexistent".into()).to_string(),
            "cd: /nonexistent: No such file or directory"
        );
        assert_eq!(ShellError::MissingArgument("cd").to_string(), "cd: missing argument");
    }

    #[test]
    fn only_os_errors_are_fatal() {
        assert!(ShellError::Os(Errno::EAGAIN).is_fatal());
        assert!(!ShellError::EmptyCommand.is_fatal());
        assert!(ShellError::EmptyCommand.is_syntax());
        assert!(!ShellError::CommandNotFound("x".into()).is_syntax());
    }
}
