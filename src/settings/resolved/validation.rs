use super::{ConfigError, ConfigSources, ResolvedConfig};

pub(super) fn validate(config: &ResolvedConfig, sources: &ConfigSources) -> Result<(), ConfigError> {
    if config.page == 0 {
        return Err(ConfigError::invalid(
            "search.page",
            "0",
            sources.source_for_page(),
            "pages start at 1",
        ));
    }

    if let Some(per_page) = config.per_page {
        if per_page == 0 {
            return Err(ConfigError::invalid(
                "search.per_page",
                "0",
                sources.source_for_per_page(),
                "must be greater than zero",
            ));
        }
        if !config.per_page_choices.contains(&per_page) {
            return Err(ConfigError::invalid(
                "search.per_page",
                per_page.to_string(),
                sources.source_for_per_page(),
                "must be one of search.per_page_choices",
            ));
        }
    }

    if config.timeout.is_zero() {
        return Err(ConfigError::invalid(
            "search.timeout_ms",
            "0",
            sources.source_for_timeout(),
            "must be greater than zero",
        ));
    }

    Ok(())
}
