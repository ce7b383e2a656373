//! CLI command-name contract used for log spans.

use crate::cli::parse::{ClearCommands, Commands, SetCommands};

/// Command name string for logging (e.g. "render", "set.style").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Render { .. } => "render".to_string(),
        Commands::Check { .. } => "check".to_string(),
        Commands::Exec { .. } => "exec".to_string(),
        Commands::Set { command } => format!("set.{}", set_command_name(command)),
        Commands::Clear { command } => format!("clear.{}", clear_command_name(command)),
        Commands::List { .. } => "list".to_string(),
    }
}

pub fn set_command_name(command: &SetCommands) -> &'static str {
    match command {
        SetCommands::Style(_) => "style",
        SetCommands::Script(_) => "script",
        SetCommands::Server(_) => "server",
        SetCommands::Resource { .. } => "resource",
        SetCommands::Rules { .. } => "rules",
    }
}

pub fn clear_command_name(command: &ClearCommands) -> &'static str {
    match command {
        ClearCommands::Style => "style",
        ClearCommands::Script => "script",
        ClearCommands::Server => "server",
        ClearCommands::Resource { .. } => "resource",
        ClearCommands::Rules => "rules",
    }
}
