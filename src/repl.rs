use crate::commands::registry::Flow;
use crate::completion::ShellCompleter;
use crate::config::ShellConfig;
use crate::errors::{ShellError, ShellResult};
use crate::history::History;
use crate::pipeline::{execute_pipeline, parse_pipeline};
use crate::state::ShellState;
use crate::tokenizer::{tokenize, Token};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{ColorMode, CompletionType, Config, Editor};
use tracing::debug;

/// The interactive read-eval loop.
pub struct Repl {
    editor: Editor<ShellCompleter, DefaultHistory>,
    state: ShellState,
    config: ShellConfig,
}

impl Repl {
    pub fn new(config: ShellConfig) -> ShellResult<Self> {
        let editor_config = Config::builder()
            .color_mode(ColorMode::Enabled)
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();

        let mut editor = Editor::with_config(editor_config).map_err(|e| {
            ShellError::InputError(format!("Failed to create readline editor: {}", e))
        })?;
        editor.set_helper(Some(ShellCompleter));

        let mut history = History::new();
        if let Some(path) = &config.history_file {
            // A missing file on first start is normal.
            match history.read_from(path) {
                Ok(loaded) => debug!(path = %path.display(), loaded, "repl.history loaded"),
                Err(err) => debug!(%err, "repl.history not loaded"),
            }
        }
        for entry in history.entries() {
            let _ = editor.add_history_entry(entry.as_str());
        }

        Ok(Self {
            editor,
            state: ShellState::new(history),
            config,
        })
    }

    /// Read and run lines until end of input or `exit`, returning the
    /// interpreter's exit status.
    ///
    /// Only fatal errors escape; the history file is not written in that case.
    pub fn run(&mut self) -> ShellResult<i32> {
        let status = loop {
            let line = match self.editor.readline(&self.config.prompt) {
                Ok(line) => line,
                // Ctrl-C discards the line being edited
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break 0,
                Err(e) => return Err(ShellError::InputError(format!("Readline error: {}", e))),
            };

            // Every accepted line is logged, blank ones included.
            self.state.history.push(line.as_str());
            if line.trim().is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(line.as_str());

            match self.eval(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(code)) => break code,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => eprintln!("{}", err),
            }
        };

        self.save_history();
        debug!(status, "repl.exit");
        Ok(status)
    }

    fn eval(&mut self, line: &str) -> ShellResult<Flow> {
        let Self {
            editor,
            state,
            config,
        } = self;
        let tokens = tokenize(line, || editor.readline(&config.continuation_prompt).ok())?;
        handle_tokens(tokens, state)
    }

    fn save_history(&mut self) {
        if let Some(path) = &self.config.history_file {
            if let Err(err) = self.state.history.write_to(path) {
                eprintln!("{}", err);
            }
        }
    }
}

/// Parse one tokenized line and run it.
///
/// Nothing is spawned unless the whole line parses.
pub fn handle_tokens(tokens: Vec<Token>, state: &mut ShellState) -> ShellResult<Flow> {
    let stages = parse_pipeline(tokens)?;
    execute_pipeline(&stages, state)
}
