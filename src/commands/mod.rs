pub mod builtins;
pub mod cli;
pub mod external;
pub mod registry;

pub use registry::{BuiltinCommand, BuiltinRegistry, Flow, BUILTINS};
