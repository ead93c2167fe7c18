//! Summary metrics over a finished obfuscation run, collected from the
//! status ledger and the transformed module set. Consumed by the CLI
//! summary and serializable into the structured report.

use serde::{Deserialize, Serialize};
use umbra_core::map::{ObfuscationMap, SymbolKey};
use umbra_core::model::ModuleSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub modules: usize,
    pub types_renamed: usize,
    pub types_skipped: usize,
    pub fields_renamed: usize,
    pub fields_skipped: usize,
    pub methods_renamed: usize,
    pub methods_skipped: usize,
    pub properties_renamed: usize,
    pub properties_skipped: usize,
    pub events_renamed: usize,
    pub events_skipped: usize,
    pub resources_renamed: usize,
    pub resources_skipped: usize,
    pub hidden_strings: usize,
}

/// Tallies the ledger per symbol kind and counts hidden strings per module.
pub fn collect_metrics(map: &ObfuscationMap, set: &ModuleSet) -> RunMetrics {
    let mut metrics = RunMetrics {
        modules: set.modules.iter().filter(|m| !m.external).count(),
        ..RunMetrics::default()
    };

    for (key, status) in map.iter() {
        let (renamed, skipped) = match key {
            SymbolKey::Type(_) => (&mut metrics.types_renamed, &mut metrics.types_skipped),
            SymbolKey::Field(_) => (&mut metrics.fields_renamed, &mut metrics.fields_skipped),
            SymbolKey::Method(_) => (&mut metrics.methods_renamed, &mut metrics.methods_skipped),
            SymbolKey::Property(_) => (
                &mut metrics.properties_renamed,
                &mut metrics.properties_skipped,
            ),
            SymbolKey::Event(_) => (&mut metrics.events_renamed, &mut metrics.events_skipped),
        };
        if status.is_renamed() {
            *renamed += 1;
        } else if status.is_skipped() {
            *skipped += 1;
        }
    }

    for (_, status) in map.resources() {
        if status.is_renamed() {
            metrics.resources_renamed += 1;
        } else if status.is_skipped() {
            metrics.resources_skipped += 1;
        }
    }

    metrics.hidden_strings = set
        .modules
        .iter()
        .filter_map(|m| m.hidden_strings.as_ref())
        .map(|h| h.entries.len())
        .sum();

    metrics
}
