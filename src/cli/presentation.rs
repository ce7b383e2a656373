//! CLI presentation: text and json formatters per command family.

mod fragments;
mod render;

pub use fragments::{format_fragment_list_json, format_fragment_list_text, format_stored};
pub use render::{format_check_result, format_rendered};
