//! Registry of the widgets currently mounted.

mod error;

pub use error::RegistryError;

use std::fmt;
use std::rc::Rc;

use vizion_widget_api::{Capabilities, Scope, Widget, WidgetDescriptor};

/// Identifier handed out on registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// A widget together with the descriptor captured from it.
#[derive(Clone)]
pub struct RegisteredWidget {
    id: WidgetId,
    widget: Rc<dyn Widget>,
    descriptor: WidgetDescriptor,
}

impl RegisteredWidget {
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    #[must_use]
    pub fn widget(&self) -> &dyn Widget {
        self.widget.as_ref()
    }

    #[must_use]
    pub fn descriptor(&self) -> &WidgetDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.descriptor.scope
    }

    #[must_use]
    pub fn has(&self, capability: Capabilities) -> bool {
        self.descriptor.capabilities.contains(capability)
    }

    fn is(&self, widget: &Rc<dyn Widget>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.widget), Rc::as_ptr(widget))
    }
}

impl fmt::Debug for RegisteredWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredWidget")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered set of mounted widgets.
///
/// Mutations schedule a single pending update; the coordinator consumes it with
/// [`take_scheduled_update`](Self::take_scheduled_update), so any number of
/// changes made in one turn result in one update.
#[derive(Debug, Default)]
pub struct WidgetRegistry {
    widgets: Vec<RegisteredWidget>,
    next_id: u64,
    update_scheduled: bool,
}

impl WidgetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a widget at the end of the registration order.
    pub fn register(&mut self, widget: Rc<dyn Widget>) -> Result<WidgetId, RegistryError> {
        if let Some(existing) = self.widgets.iter().find(|entry| entry.is(&widget)) {
            return Err(RegistryError::AlreadyRegistered { id: existing.id });
        }

        self.next_id = self.next_id.wrapping_add(1);
        let id = WidgetId(self.next_id);
        let descriptor = widget.descriptor();
        self.widgets.push(RegisteredWidget {
            id,
            widget,
            descriptor,
        });
        self.update_scheduled = true;
        Ok(id)
    }

    pub fn unregister(&mut self, id: WidgetId) -> Result<(), RegistryError> {
        let position = self.position(id)?;
        self.widgets.remove(position);
        self.update_scheduled = true;
        Ok(())
    }

    /// Record that a widget's inputs changed. Its descriptor is read again.
    pub fn widget_changed(&mut self, id: WidgetId) -> Result<(), RegistryError> {
        let position = self.position(id)?;
        let entry = &mut self.widgets[position];
        entry.descriptor = entry.widget.descriptor();
        self.update_scheduled = true;
        Ok(())
    }

    fn position(&self, id: WidgetId) -> Result<usize, RegistryError> {
        self.widgets
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(RegistryError::UnknownWidget { id })
    }

    /// Registered widgets in registration order.
    #[must_use]
    pub fn widgets(&self) -> &[RegisteredWidget] {
        &self.widgets
    }

    /// Owned copy of the registration order, stable while widgets are called.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RegisteredWidget> {
        self.widgets.clone()
    }

    /// Widgets advertising `capability`, in registration order.
    pub fn with_capability(
        &self,
        capability: Capabilities,
    ) -> impl Iterator<Item = &RegisteredWidget> + '_ {
        self.widgets
            .iter()
            .filter(move |entry| entry.has(capability))
    }

    #[must_use]
    pub fn get(&self, id: WidgetId) -> Option<&RegisteredWidget> {
        self.widgets.iter().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    #[must_use]
    pub fn has_scheduled_update(&self) -> bool {
        self.update_scheduled
    }

    /// Consume the pending update, if any.
    pub fn take_scheduled_update(&mut self) -> bool {
        std::mem::take(&mut self.update_scheduled)
    }
}

#[cfg(test)]
mod tests;
