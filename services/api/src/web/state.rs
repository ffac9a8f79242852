//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use quest_core::clock::Clock;
use quest_core::ports::{
    ProfileRepository, ProgressionStore, QuestRepository, ReflectionRepository,
};
use quest_core::progression::ProgressionRules;
use quest_core::service::ProgressionService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub progression: Arc<ProgressionService>,
    pub reflections: Arc<dyn ReflectionRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every port to one adapter that implements all of them.
    pub fn with_store<S>(store: Arc<S>, clock: Arc<dyn Clock>, config: Arc<Config>) -> Self
    where
        S: ProgressionStore + QuestRepository + ReflectionRepository + ProfileRepository + 'static,
    {
        let rules = ProgressionRules {
            apply_streak_bonus: config.apply_streak_bonus,
        };
        let progression = ProgressionService::new(store.clone(), store.clone(), clock, rules);
        Self {
            progression: Arc::new(progression),
            reflections: store.clone(),
            profiles: store,
            config,
        }
    }
}
