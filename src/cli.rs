//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the injection engine.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{ClearCommands, Cli, Commands, ContentArgs, RequestArgs, SetCommands};
pub use route::RunContext;
