use clap::ValueEnum;

/// Client cache modes selectable from the CLI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum CacheArg {
    Structured,
    Legacy,
    LegacyDisabled,
    None,
}

impl CacheArg {
    /// Return the identifier consumed by configuration loading.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CacheArg::Structured => "structured",
            CacheArg::Legacy => "legacy",
            CacheArg::LegacyDisabled => "legacy-disabled",
            CacheArg::None => "none",
        }
    }
}

/// Output formats supported by the CLI utility.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Plain,
    Json,
}
