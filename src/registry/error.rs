use thiserror::Error;

use super::WidgetId;

/// Errors that can occur when mutating the [`WidgetRegistry`](super::WidgetRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The same widget instance was registered twice.
    #[error("widget is already registered as {id}")]
    AlreadyRegistered { id: WidgetId },

    /// The identifier does not belong to a registered widget.
    #[error("{id} is not registered")]
    UnknownWidget { id: WidgetId },
}
