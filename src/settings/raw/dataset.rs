use std::path::PathBuf;

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use vizion::CacheMode;

use crate::cli::CliArgs;

/// Where records come from and how the client caches responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct DatasetSection {
    pub(super) path: Option<PathBuf>,
    pub(super) initial_results: Option<PathBuf>,
    pub(super) cache: Option<String>,
}

pub(super) struct DatasetSettings {
    pub(super) path: PathBuf,
    pub(super) initial_results: Option<PathBuf>,
    pub(super) cache: CacheMode,
}

impl DatasetSection {
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(path) = cli.dataset.clone() {
            self.path = Some(path);
        }
        if let Some(path) = cli.initial_results.clone() {
            self.initial_results = Some(path);
        }
        if let Some(cache) = cli.cache {
            self.cache = Some(cache.as_str().to_owned());
        }
    }

    pub(super) fn resolve(self) -> Result<DatasetSettings> {
        let path = self
            .path
            .context("no dataset configured; pass --dataset or set dataset.path")?;
        ensure!(path.is_file(), "dataset {} is not a file", path.display());

        if let Some(initial) = &self.initial_results {
            ensure!(
                initial.is_file(),
                "initial results {} is not a file",
                initial.display()
            );
        }

        Ok(DatasetSettings {
            path,
            initial_results: self.initial_results,
            cache: parse_cache(self.cache.as_deref())?,
        })
    }
}

pub(super) fn parse_cache(value: Option<&str>) -> Result<CacheMode> {
    let Some(value) = value else {
        return Ok(CacheMode::default());
    };
    Ok(match value.trim().to_ascii_lowercase().as_str() {
        "structured" => CacheMode::Structured,
        "legacy" => CacheMode::Legacy { enabled: true },
        "legacy-disabled" => CacheMode::Legacy { enabled: false },
        "none" => CacheMode::None,
        other => bail!(
            "unknown cache mode '{other}' (expected structured, legacy, legacy-disabled or none)"
        ),
    })
}
