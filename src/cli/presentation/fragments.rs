//! Fragment store presentation: set confirmations and list text/json.

use crate::error::ApiError;
use crate::store::StoredFragment;
use crate::types::{FragmentKind, Scope};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

fn format_timestamp(updated_at_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(updated_at_ms)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_stored(kind: FragmentKind, scope: Scope, record: Option<&StoredFragment>) -> String {
    match record {
        Some(record) => format!(
            "Stored {} {} ({} bytes, digest {})",
            scope,
            kind,
            record.fragment.content.len(),
            record.fragment.digest()
        ),
        None => format!("Cleared {} {}", scope, kind),
    }
}

pub fn format_fragment_list_text(records: &[StoredFragment]) -> String {
    if records.is_empty() {
        return "No fragments stored.\n\nUse 'codeweave set' to add one.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Scope", "Kind", "Bytes", "Digest", "Updated"]);
    for record in records {
        table.add_row(vec![
            record.fragment.scope.to_string(),
            record.fragment.kind.to_string(),
            record.fragment.content.len().to_string(),
            record.fragment.digest(),
            format_timestamp(record.updated_at_ms),
        ]);
    }
    format!("{}\n\nTotal: {} fragment(s)", table, records.len())
}

pub fn format_fragment_list_json(records: &[StoredFragment]) -> Result<String, ApiError> {
    let fragments: Vec<_> = records
        .iter()
        .map(|record| {
            json!({
                "scope": record.fragment.scope.to_string(),
                "kind": record.fragment.kind.as_str(),
                "bytes": record.fragment.content.len(),
                "digest": record.fragment.digest(),
                "updated_at": format_timestamp(record.updated_at_ms),
                "content": record.fragment.content,
            })
        })
        .collect();
    let out = json!({ "fragments": fragments, "total": records.len() });
    serde_json::to_string_pretty(&out)
        .map_err(|e| ApiError::InvalidArgument(format!("Failed to encode list: {}", e)))
}
