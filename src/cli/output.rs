use anyhow::Result;
use serde_json::Value;

use crate::workflow::{IndexOutcome, SearchOutcome};

/// Print a plain-text representation of the search outcome.
pub(crate) fn print_plain(outcome: &SearchOutcome) {
    for line in plain_lines(outcome) {
        println!("{line}");
    }
}

fn plain_lines(outcome: &SearchOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(err) = &outcome.error {
        lines.push(format!("Search failed: {err}"));
    }
    if outcome.indices.is_empty() && outcome.error.is_none() {
        lines.push("No results".to_owned());
    }
    for index in &outcome.indices {
        lines.push(index_header(index));
        lines.extend(index.hits.iter().map(|hit| format!("  {}", hit_label(hit))));
    }
    lines
}

fn index_header(index: &IndexOutcome) -> String {
    let name = if index.index_id == index.index_name {
        index.index_id.clone()
    } else {
        format!("{} ({})", index.index_id, index.index_name)
    };
    let hits = if index.nb_hits == 1 { "hit" } else { "hits" };
    format!(
        "{name}: {} {hits}, page {}/{}",
        index.nb_hits,
        index.page,
        index.nb_pages.max(1)
    )
}

/// First string field of a hit, or the whole hit as compact JSON.
fn hit_label(hit: &Value) -> String {
    hit.as_object()
        .and_then(|fields| {
            fields
                .iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .find_map(|(_, value)| value.as_str())
        })
        .map_or_else(|| hit.to_string(), str::to_owned)
}

/// Format the search outcome as a JSON string.
pub(crate) fn format_outcome_json(outcome: &SearchOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Print the JSON representation of the search outcome.
pub(crate) fn print_json(outcome: &SearchOutcome) -> Result<()> {
    println!("{}", format_outcome_json(outcome)?);
    Ok(())
}
