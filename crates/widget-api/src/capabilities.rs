use bitflags::bitflags;

use crate::scope::Scope;

bitflags! {
    /// Hooks a widget implements. The registry filters on these flags instead
    /// of probing the widget.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// The widget reports [`Metadata`](crate::Metadata).
        const METADATA = 1 << 0;
        /// The widget refines [`SearchParameters`](crate::SearchParameters).
        const SEARCH_PARAMETERS = 1 << 1;
        /// The widget may adjust externally driven state jumps.
        const TRANSITION_STATE = 1 << 2;
    }
}

/// Capabilities and scope captured when a widget is registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WidgetDescriptor {
    pub capabilities: Capabilities,
    pub scope: Scope,
}

impl WidgetDescriptor {
    #[must_use]
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            scope: Scope::Global,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn contributes_metadata(&self) -> bool {
        self.capabilities.contains(Capabilities::METADATA)
    }

    #[must_use]
    pub fn contributes_search_parameters(&self) -> bool {
        self.capabilities.contains(Capabilities::SEARCH_PARAMETERS)
    }

    #[must_use]
    pub fn transitions_state(&self) -> bool {
        self.capabilities.contains(Capabilities::TRANSITION_STATE)
    }
}
