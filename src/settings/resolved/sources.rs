use std::fmt;

/// Where a setting's effective value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SettingSource {
    CliFlag(&'static str),
    Environment(&'static str),
    ConfigKey(&'static str),
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CliFlag(flag) => write!(f, "CLI flag `{flag}`"),
            Self::Environment(var) => write!(f, "environment variable `{var}`"),
            Self::ConfigKey(key) => write!(f, "configuration key `{key}`"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ConfigSources {
    pub(crate) page: Option<SettingSource>,
    pub(crate) per_page: Option<SettingSource>,
    pub(crate) timeout: Option<SettingSource>,
}

impl ConfigSources {
    pub(crate) fn source_for_page(&self) -> SettingSource {
        self.page
            .clone()
            .unwrap_or(SettingSource::ConfigKey("search.page"))
    }

    pub(crate) fn source_for_per_page(&self) -> SettingSource {
        self.per_page
            .clone()
            .unwrap_or(SettingSource::ConfigKey("search.per_page"))
    }

    pub(crate) fn source_for_timeout(&self) -> SettingSource {
        self.timeout
            .clone()
            .unwrap_or(SettingSource::ConfigKey("search.timeout_ms"))
    }
}
