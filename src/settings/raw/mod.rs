use anyhow::{Error, Result};
use serde::Deserialize;
use std::env;

use crate::cli::CliArgs;

use super::resolved::{ConfigSources, ResolvedConfig, SettingSource};

mod dataset;
mod search;

use dataset::DatasetSection;
use search::SearchSection;

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
    dataset: DatasetSection,
    search: SearchSection,
}

impl RawConfig {
    /// Apply CLI overrides on top of the raw configuration values.
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        self.dataset.apply_cli_overrides(cli);
        self.search.apply_cli_overrides(cli);
    }

    /// Convert the raw configuration into a [`ResolvedConfig`], validating and
    /// filling defaults where required.
    pub(super) fn resolve(self, cli: &CliArgs) -> Result<ResolvedConfig> {
        let sources = ConfigSources {
            page: detect_source(
                cli.page.is_some(),
                self.search.page.is_some(),
                "VIZION__SEARCH__PAGE",
                "--page",
                "search.page",
            ),
            per_page: detect_source(
                cli.per_page.is_some(),
                self.search.per_page.is_some(),
                "VIZION__SEARCH__PER_PAGE",
                "--per-page",
                "search.per_page",
            ),
            timeout: detect_source(
                cli.timeout_ms.is_some(),
                self.search.timeout_ms.is_some(),
                "VIZION__SEARCH__TIMEOUT_MS",
                "--timeout-ms",
                "search.timeout_ms",
            ),
        };

        let dataset = self.dataset.resolve()?;
        let search = self.search.resolve()?;

        let config = ResolvedConfig {
            dataset: dataset.path,
            initial_results: dataset.initial_results,
            cache: dataset.cache,
            index: search.index,
            secondary_indices: search.secondary_indices,
            query: search.query,
            page: search.page,
            per_page: search.per_page,
            per_page_choices: search.per_page_choices,
            facets: search.facets,
            stalled_search_delay: search.stalled_search_delay,
            timeout: search.timeout,
        };

        config.validate(&sources).map_err(Error::new)?;

        Ok(config)
    }
}

fn detect_source(
    cli_present: bool,
    value_present: bool,
    env_var: &'static str,
    cli_flag: &'static str,
    key: &'static str,
) -> Option<SettingSource> {
    if !value_present {
        return None;
    }

    if cli_present {
        return Some(SettingSource::CliFlag(cli_flag));
    }

    if env::var_os(env_var).is_some() {
        return Some(SettingSource::Environment(env_var));
    }

    Some(SettingSource::ConfigKey(key))
}
