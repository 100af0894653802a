use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use vizion::CacheMode;

mod errors;
mod sources;
mod summary;
mod validation;

pub(crate) use errors::ConfigError;
pub(crate) use sources::{ConfigSources, SettingSource};

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub dataset: PathBuf,
    pub initial_results: Option<PathBuf>,
    pub cache: CacheMode,
    pub index: String,
    pub secondary_indices: Vec<String>,
    pub query: String,
    pub page: u32,
    pub per_page: Option<u32>,
    pub per_page_choices: Vec<u32>,
    /// Selected values per facet attribute.
    pub facets: IndexMap<String, Vec<String>>,
    pub stalled_search_delay: Duration,
    pub timeout: Duration,
}

impl ResolvedConfig {
    pub(super) fn validate(&self, sources: &ConfigSources) -> Result<(), ConfigError> {
        validation::validate(self, sources)
    }

    /// Print a human readable summary of the effective configuration.
    pub fn print_summary(&self) {
        summary::print_summary(self);
    }
}

#[cfg(test)]
pub(crate) fn sample() -> ResolvedConfig {
    ResolvedConfig {
        dataset: PathBuf::from("/tmp/dataset.json"),
        initial_results: None,
        cache: CacheMode::Structured,
        index: "products".into(),
        secondary_indices: Vec::new(),
        query: String::new(),
        page: 1,
        per_page: None,
        per_page_choices: Vec::new(),
        facets: IndexMap::new(),
        stalled_search_delay: vizion::DEFAULT_STALLED_SEARCH_DELAY,
        timeout: Duration::from_secs(5),
    }
}
