use std::time::Duration;

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;

use vizion::DEFAULT_STALLED_SEARCH_DELAY;

use crate::cli::CliArgs;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// What to search for, as read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchSection {
    pub(super) index: Option<String>,
    pub(super) secondary_indices: Option<Vec<String>>,
    pub(super) query: Option<String>,
    pub(super) page: Option<u32>,
    pub(super) per_page: Option<u32>,
    pub(super) per_page_choices: Option<Vec<u32>>,
    /// `attribute=value` pairs.
    pub(super) facets: Option<Vec<String>>,
    pub(super) stalled_search_delay_ms: Option<u64>,
    pub(super) timeout_ms: Option<u64>,
}

pub(super) struct SearchSettings {
    pub(super) index: String,
    pub(super) secondary_indices: Vec<String>,
    pub(super) query: String,
    pub(super) page: u32,
    pub(super) per_page: Option<u32>,
    pub(super) per_page_choices: Vec<u32>,
    pub(super) facets: IndexMap<String, Vec<String>>,
    pub(super) stalled_search_delay: Duration,
    pub(super) timeout: Duration,
}

impl SearchSection {
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(index) = cli.index.clone() {
            self.index = Some(index);
        }
        if let Some(indices) = cli.secondary_index.clone() {
            self.secondary_indices = Some(indices);
        }
        if let Some(query) = cli.query.clone() {
            self.query = Some(query);
        }
        if let Some(page) = cli.page {
            self.page = Some(page);
        }
        if let Some(per_page) = cli.per_page {
            self.per_page = Some(per_page);
        }
        if let Some(facets) = cli.facet.clone() {
            self.facets = Some(facets);
        }
        if let Some(delay) = cli.stalled_search_delay_ms {
            self.stalled_search_delay_ms = Some(delay);
        }
        if let Some(timeout) = cli.timeout_ms {
            self.timeout_ms = Some(timeout);
        }
    }

    pub(super) fn resolve(self) -> Result<SearchSettings> {
        let index = self
            .index
            .map(|index| index.trim().to_owned())
            .filter(|index| !index.is_empty())
            .context("no index configured; pass --index or set search.index")?;

        let secondary_indices = sanitize_names(self.secondary_indices.unwrap_or_default());
        let facets = parse_facets(self.facets.unwrap_or_default())?;

        let mut per_page_choices = self.per_page_choices.unwrap_or_default();
        if per_page_choices.is_empty()
            && let Some(per_page) = self.per_page
        {
            per_page_choices.push(per_page);
        }

        Ok(SearchSettings {
            index,
            secondary_indices,
            query: self.query.unwrap_or_default(),
            page: self.page.unwrap_or(1),
            per_page: self.per_page,
            per_page_choices,
            facets,
            stalled_search_delay: self
                .stalled_search_delay_ms
                .map_or(DEFAULT_STALLED_SEARCH_DELAY, Duration::from_millis),
            timeout: self.timeout_ms.map_or(DEFAULT_TIMEOUT, Duration::from_millis),
        })
    }
}

/// Trim names and drop blanks and repeats, keeping the first occurrence.
fn sanitize_names(names: Vec<String>) -> Vec<String> {
    let mut sanitized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !sanitized.iter().any(|seen| seen == name) {
            sanitized.push(name.to_owned());
        }
    }
    sanitized
}

/// Group `attribute=value` pairs by attribute, in first-seen order.
pub(super) fn parse_facets(pairs: Vec<String>) -> Result<IndexMap<String, Vec<String>>> {
    let mut facets: IndexMap<String, Vec<String>> = IndexMap::new();
    for pair in pairs {
        let Some((attribute, value)) = pair.split_once('=') else {
            bail!("facet '{pair}' must be written as attribute=value");
        };
        let (attribute, value) = (attribute.trim(), value.trim());
        if attribute.is_empty() || value.is_empty() {
            bail!("facet '{pair}' must name both an attribute and a value");
        }
        facets
            .entry(attribute.to_owned())
            .or_default()
            .push(value.to_owned());
    }
    Ok(facets)
}
