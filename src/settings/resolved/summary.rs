use vizion::CacheMode;

use super::ResolvedConfig;

pub(super) fn print_summary(config: &ResolvedConfig) {
    for line in summary_lines(config) {
        println!("{line}");
    }
}

fn summary_lines(config: &ResolvedConfig) -> Vec<String> {
    let mut lines = vec![
        "Effective configuration:".to_owned(),
        format!("  Dataset: {}", config.dataset.display()),
    ];
    if let Some(path) = &config.initial_results {
        lines.push(format!("  Initial results: {}", path.display()));
    }
    lines.push(format!("  Cache: {}", cache_label(config.cache)));
    lines.push(format!("  Index: {}", config.index));
    if config.secondary_indices.is_empty() {
        lines.push("  Secondary indices: (none)".to_owned());
    } else {
        lines.push(format!(
            "  Secondary indices: {}",
            config.secondary_indices.join(", ")
        ));
    }
    if !config.query.is_empty() {
        lines.push(format!("  Query: {}", config.query));
    }
    lines.push(format!("  Page: {}", config.page));
    match config.per_page {
        Some(per_page) => lines.push(format!("  Hits per page: {per_page}")),
        None => lines.push("  Hits per page: (index default)".to_owned()),
    }
    for (attribute, values) in &config.facets {
        lines.push(format!("  Facet {attribute}: {}", values.join(", ")));
    }
    lines.push(format!(
        "  Stalled search delay: {} ms",
        config.stalled_search_delay.as_millis()
    ));
    lines.push(format!("  Timeout: {} ms", config.timeout.as_millis()));
    lines
}

fn cache_label(cache: CacheMode) -> &'static str {
    match cache {
        CacheMode::None => "none",
        CacheMode::Structured => "structured",
        CacheMode::Legacy { enabled: true } => "legacy",
        CacheMode::Legacy { enabled: false } => "legacy (disabled)",
    }
}

#[cfg(test)]
mod tests {
    use super::super::sample;
    use super::*;

    #[test]
    fn summary_lists_facets_and_defaults() {
        let mut config = sample();
        config.facets.insert("brand".into(), vec!["acme".into(), "globex".into()]);

        let lines = summary_lines(&config);

        assert!(lines.contains(&"  Facet brand: acme, globex".to_owned()));
        assert!(lines.contains(&"  Hits per page: (index default)".to_owned()));
        assert!(lines.contains(&"  Cache: structured".to_owned()));
    }

    #[test]
    fn summary_prints_without_panic() {
        print_summary(&sample());
    }
}
