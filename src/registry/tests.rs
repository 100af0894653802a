use std::cell::Cell;
use std::rc::Rc;

use vizion_widget_api::{Capabilities, Scope, Widget, WidgetDescriptor};

use super::*;

struct Probe {
    capabilities: Cell<Capabilities>,
    scope: Scope,
}

impl Probe {
    fn new(capabilities: Capabilities) -> Rc<Self> {
        Rc::new(Self {
            capabilities: Cell::new(capabilities),
            scope: Scope::Global,
        })
    }

    fn scoped(capabilities: Capabilities, scope: Scope) -> Rc<Self> {
        Rc::new(Self {
            capabilities: Cell::new(capabilities),
            scope,
        })
    }
}

impl Widget for Probe {
    fn descriptor(&self) -> WidgetDescriptor {
        WidgetDescriptor::new(self.capabilities.get()).with_scope(self.scope.clone())
    }
}

#[test]
fn registration_order_is_preserved() {
    let mut registry = WidgetRegistry::new();
    let first = registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("first");
    let second = registry
        .register(Probe::scoped(
            Capabilities::SEARCH_PARAMETERS,
            Scope::single_index("articles"),
        ))
        .expect("second");

    let ids: Vec<_> = registry.widgets().iter().map(RegisteredWidget::id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(
        registry.get(second).map(RegisteredWidget::scope),
        Some(&Scope::single_index("articles"))
    );
}

#[test]
fn registering_the_same_instance_twice_is_rejected() {
    let mut registry = WidgetRegistry::new();
    let widget: Rc<dyn Widget> = Probe::new(Capabilities::METADATA);
    let id = registry.register(Rc::clone(&widget)).expect("register");

    let err = registry.register(widget).unwrap_err();

    assert_eq!(err, RegistryError::AlreadyRegistered { id });
    assert_eq!(registry.len(), 1);
}

#[test]
fn distinct_instances_of_the_same_type_are_independent() {
    let mut registry = WidgetRegistry::new();
    registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("first");
    registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("second");

    assert_eq!(registry.len(), 2);
}

#[test]
fn unregister_removes_only_the_given_widget() {
    let mut registry = WidgetRegistry::new();
    let first = registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("first");
    let second = registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("second");

    registry.unregister(first).expect("unregister");

    let ids: Vec<_> = registry.widgets().iter().map(RegisteredWidget::id).collect();
    assert_eq!(ids, vec![second]);
    assert_eq!(
        registry.unregister(first),
        Err(RegistryError::UnknownWidget { id: first })
    );
}

#[test]
fn mutations_coalesce_into_one_scheduled_update() {
    let mut registry = WidgetRegistry::new();
    assert!(!registry.has_scheduled_update());

    let a = registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("a");
    registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("b");
    registry.widget_changed(a).expect("changed");

    assert!(registry.take_scheduled_update());
    assert!(!registry.take_scheduled_update());
}

#[test]
fn widget_changed_reads_the_descriptor_again() {
    let mut registry = WidgetRegistry::new();
    let probe = Probe::new(Capabilities::METADATA);
    let id = registry
        .register(Rc::clone(&probe) as Rc<dyn Widget>)
        .expect("register");
    assert_eq!(registry.with_capability(Capabilities::SEARCH_PARAMETERS).count(), 0);

    probe
        .capabilities
        .set(Capabilities::METADATA | Capabilities::SEARCH_PARAMETERS);
    registry.widget_changed(id).expect("changed");

    assert_eq!(registry.with_capability(Capabilities::SEARCH_PARAMETERS).count(), 1);
}

#[test]
fn unknown_widget_changes_are_errors() {
    let mut registry = WidgetRegistry::new();
    let id = registry
        .register(Probe::new(Capabilities::METADATA))
        .expect("register");
    registry.unregister(id).expect("unregister");
    registry.take_scheduled_update();

    assert_eq!(
        registry.widget_changed(id),
        Err(RegistryError::UnknownWidget { id })
    );
    assert!(!registry.has_scheduled_update());
}
