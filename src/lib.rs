//! State synchronization core for search widgets.
//!
//! A [`VizionManager`] owns the [`Store`] every widget renders from and the
//! [`WidgetRegistry`] every widget contributes through. It folds widget
//! refinements into search parameters, dispatches one search per cycle across
//! the primary and derived indices, and writes the outcome back to the store.
//! Server-rendered results can be fed back through [`hydration`] so the first
//! client-side search is answered from cache.

pub mod app_dirs;
pub mod client;
pub mod helper;
pub mod hydration;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod store;
pub mod widgets;

pub use client::{CacheMode, Dataset, MemoryClient, SearchClient, SearchError, SearchRequest};
pub use helper::{LocalHelper, SearchHelper};
pub use hydration::{
    HydrationOutcome, InitialResults, ServerResults, hydrate_results_state, hydrate_search_client,
};
pub use manager::{
    DEFAULT_STALLED_SEARCH_DELAY, ManagerOptions, ParameterPlan, PumpReport, VizionManager,
};
pub use registry::{RegisteredWidget, RegistryError, WidgetId, WidgetRegistry};
pub use store::{AppState, Store, Subscription};

pub use vizion_widget_api as widget_api;
