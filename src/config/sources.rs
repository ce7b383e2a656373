//! Config file sources, applied in order by [`super::ConfigLoader`].

pub mod global_file;
pub mod workspace_file;
