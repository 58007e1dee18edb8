use crate::errors::ShellResult;
use crate::state::ShellState;
use once_cell::sync::Lazy;
use std::io::Write;

/// What the read loop should do after a builtin returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Leave the read loop with this exit status.
    Exit(i32),
}

/// Trait that all builtin commands must implement
pub trait BuiltinCommand: Send + Sync {
    /// The command name (e.g., "echo", "cd", "pwd")
    fn name(&self) -> &'static str;

    /// Execute the command with the given arguments, writing regular output
    /// to `out`. `args[0]` is the command name itself.
    fn execute(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> ShellResult<Flow>;
}

/// Central registry for all builtin commands
pub struct BuiltinRegistry {
    commands: Vec<Box<dyn BuiltinCommand>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register<C: BuiltinCommand + 'static>(&mut self, cmd: C) {
        self.commands.push(Box::new(cmd));
    }

    /// Check if a command name is a builtin
    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c.name() == name)
    }

    /// Get all builtin command names (for completion and type command)
    pub fn builtin_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Execute a builtin by `args[0]`; `None` if no builtin has that name.
    pub fn dispatch(
        &self,
        args: &[String],
        state: &mut ShellState,
        out: &mut dyn Write,
    ) -> Option<ShellResult<Flow>> {
        let name = args.first()?;
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.execute(args, state, out))
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance
pub static BUILTINS: Lazy<BuiltinRegistry> = Lazy::new(|| {
    let mut registry = BuiltinRegistry::new();

    registry.register(super::builtins::CdCommand);
    registry.register(super::builtins::EchoCommand);
    registry.register(super::builtins::ExitCommand);
    registry.register(super::builtins::HistoryCommand);
    registry.register(super::builtins::PwdCommand);
    registry.register(super::builtins::TypeCommand);

    registry
});
