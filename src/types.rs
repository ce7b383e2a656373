//! Core fragment types shared by the store, sandbox, and pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a single content resource (page, post, ...).
pub type ResourceId = u64;

/// What a fragment contains and therefore how it is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Style sheet text, emitted inside a `<style>` block in the head.
    Style,
    /// Client script text, emitted inside a `<script>` block in the footer.
    ClientScript,
    /// Server-side script, executed by the sandbox; its output is emitted.
    ServerScript,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 3] = [
        FragmentKind::Style,
        FragmentKind::ClientScript,
        FragmentKind::ServerScript,
    ];

    /// Stable key used in persisted layouts and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Style => "style",
            FragmentKind::ClientScript => "client_script",
            FragmentKind::ServerScript => "server_script",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style" | "css" => Ok(FragmentKind::Style),
            "client_script" | "script" | "js" => Ok(FragmentKind::ClientScript),
            "server_script" | "server" => Ok(FragmentKind::ServerScript),
            other => Err(format!("Unknown fragment kind: {}", other)),
        }
    }
}

/// Where a fragment applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Resource(ResourceId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Resource(id) => write!(f, "resource:{}", id),
        }
    }
}

/// A stored piece of style, script, or server code text.
///
/// Empty content is the "no fragment" state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFragment {
    pub kind: FragmentKind,
    pub scope: Scope,
    pub content: String,
}

impl CodeFragment {
    pub fn new(kind: FragmentKind, scope: Scope, content: impl Into<String>) -> Self {
        Self {
            kind,
            scope,
            content: content.into(),
        }
    }

    /// An unset fragment for the given slot.
    pub fn empty(kind: FragmentKind, scope: Scope) -> Self {
        Self::new(kind, scope, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Short content digest (first 8 bytes of blake3, hex) for logs and listings.
    pub fn digest(&self) -> String {
        let hash = blake3::hash(self.content.as_bytes());
        hex::encode(&hash.as_bytes()[..8])
    }
}
