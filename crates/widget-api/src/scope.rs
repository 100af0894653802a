use std::fmt;

/// Which index a widget's contributions apply to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Contributions apply to every index queried in a search cycle.
    #[default]
    Global,
    /// The widget declares an index. Its contributions are folded before any
    /// other widget targeting the same index.
    SingleIndex(String),
    /// The widget lives under an index declaration and targets that index.
    MultiIndexTarget(String),
}

impl Scope {
    pub fn single_index(id: impl Into<String>) -> Self {
        Self::SingleIndex(id.into())
    }

    pub fn targeting(id: impl Into<String>) -> Self {
        Self::MultiIndexTarget(id.into())
    }

    /// Index targeted by this scope, or `None` for globally scoped widgets.
    ///
    /// An index declaration with an empty id does not declare anything and
    /// behaves like [`Scope::Global`].
    #[must_use]
    pub fn index_id(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::SingleIndex(id) if id.is_empty() => None,
            Self::SingleIndex(id) | Self::MultiIndexTarget(id) => Some(id),
        }
    }

    /// Returns `true` for widgets that declare an index.
    #[must_use]
    pub fn is_index_declaration(&self) -> bool {
        matches!(self, Self::SingleIndex(id) if !id.is_empty())
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.index_id().is_none()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index_id() {
            None => f.write_str("global"),
            Some(id) if self.is_index_declaration() => write!(f, "index({id})"),
            Some(id) => write!(f, "target({id})"),
        }
    }
}
