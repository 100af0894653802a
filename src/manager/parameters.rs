use indexmap::IndexMap;
use serde::Serialize;
use vizion_widget_api::{Capabilities, SearchParameters, SearchState};

use crate::registry::RegisteredWidget;

/// Parameters for one secondary index.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedParameters {
    pub index_id: String,
    pub parameters: SearchParameters,
}

/// Outcome of folding every contributing widget for one search cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterPlan {
    pub main: SearchParameters,
    pub derived: Vec<DerivedParameters>,
}

impl ParameterPlan {
    #[must_use]
    pub fn is_multi_index(&self) -> bool {
        !self.derived.is_empty()
    }

    #[must_use]
    pub fn derived_for(&self, index_id: &str) -> Option<&SearchParameters> {
        self.derived
            .iter()
            .find(|derived| derived.index_id == index_id)
            .map(|derived| &derived.parameters)
    }
}

/// Fold the contributions of `widgets` into main and derived parameters.
///
/// Global widgets produce the shared parameters every index starts from.
/// Widgets scoped to `main_index` refine the main parameters; the rest are
/// grouped per index, in the order their index is first seen. Within a group
/// index declarations are folded first.
pub(crate) fn assemble(
    widgets: &[RegisteredWidget],
    base: &SearchParameters,
    main_index: &str,
    state: &SearchState,
) -> ParameterPlan {
    let contributors = widgets
        .iter()
        .filter(|entry| entry.has(Capabilities::SEARCH_PARAMETERS));

    let mut shared_widgets = Vec::new();
    let mut main_widgets = Vec::new();
    let mut derived_widgets = Vec::new();
    for entry in contributors {
        match entry.scope().index_id() {
            None => shared_widgets.push(entry),
            Some(index_id) if index_id == main_index => main_widgets.push(entry),
            Some(_) => derived_widgets.push(entry),
        }
    }

    let shared = fold(&shared_widgets, base.clone(), state);

    index_declarations_first(&mut main_widgets);
    let main = fold(&main_widgets, shared.clone(), state);

    index_declarations_first(&mut derived_widgets);
    let mut groups: IndexMap<&str, Vec<&RegisteredWidget>> = IndexMap::new();
    for entry in derived_widgets {
        if let Some(index_id) = entry.scope().index_id() {
            groups.entry(index_id).or_default().push(entry);
        }
    }

    let derived = groups
        .into_iter()
        .map(|(index_id, group)| DerivedParameters {
            index_id: index_id.to_owned(),
            parameters: fold(&group, shared.clone(), state),
        })
        .collect();

    ParameterPlan { main, derived }
}

fn index_declarations_first(widgets: &mut [&RegisteredWidget]) {
    widgets.sort_by_key(|entry| !entry.scope().is_index_declaration());
}

fn fold(
    widgets: &[&RegisteredWidget],
    initial: SearchParameters,
    state: &SearchState,
) -> SearchParameters {
    widgets.iter().fold(initial, |parameters, entry| {
        entry.widget().search_parameters(parameters, state)
    })
}
