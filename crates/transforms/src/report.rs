//! Mapping report emission.
//!
//! The ledger renders either as plain text or as a structured JSON value,
//! both in the stable report order (original namespace, then type, then
//! member) so diffs between runs are meaningful.

use serde_json::{json, Value};
use std::io::Write;
use umbra_core::map::{ObfuscationMap, ObfuscationStatus};

fn status_label(status: &ObfuscationStatus) -> &'static str {
    match status {
        ObfuscationStatus::Unknown => "unknown",
        ObfuscationStatus::Skipped(_) => "skipped",
        ObfuscationStatus::WillRename(_) => "will-rename",
        ObfuscationStatus::Renamed(_) => "renamed",
    }
}

/// Writes the mapping as plain text, one line per symbol.
pub fn write_text_map<W: Write>(map: &ObfuscationMap, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Mapping")?;
    writeln!(out, "=======")?;
    for (key, status) in map.iter_ordered() {
        match status {
            ObfuscationStatus::Renamed(name) => {
                writeln!(out, "{} {} -> {}", key.kind(), key.fullname(), name)?;
            }
            ObfuscationStatus::Skipped(reason) => {
                writeln!(out, "{} {} skipped: {}", key.kind(), key.fullname(), reason)?;
            }
            other => {
                writeln!(
                    out,
                    "{} {} {}",
                    key.kind(),
                    key.fullname(),
                    status_label(other)
                )?;
            }
        }
    }
    if !map.resources().is_empty() {
        writeln!(out)?;
        writeln!(out, "Resources")?;
        writeln!(out, "=========")?;
        for (name, status) in map.resources() {
            match status {
                ObfuscationStatus::Renamed(new_name) => {
                    writeln!(out, "{name} -> {new_name}")?;
                }
                ObfuscationStatus::Skipped(reason) => {
                    writeln!(out, "{name} skipped: {reason}")?;
                }
                other => writeln!(out, "{name} {}", status_label(other))?,
            }
        }
    }
    Ok(())
}

/// Renders the mapping as a structured JSON document.
pub fn json_map(map: &ObfuscationMap) -> Value {
    let symbols: Vec<Value> = map
        .iter_ordered()
        .into_iter()
        .map(|(key, status)| {
            json!({
                "kind": key.kind(),
                "scope": key.type_key().scope,
                "name": key.fullname(),
                "status": status_label(status),
                "value": status.text(),
            })
        })
        .collect();
    let resources: Vec<Value> = map
        .resources()
        .iter()
        .map(|(name, status)| {
            json!({
                "name": name,
                "status": status_label(status),
                "value": status.text(),
            })
        })
        .collect();
    json!({ "symbols": symbols, "resources": resources })
}
