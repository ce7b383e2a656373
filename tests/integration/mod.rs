//! Integration tests for the codeweave injection engine

mod cli_commands;
mod pipeline_integration;
mod rules_matching;
mod store_integration;
