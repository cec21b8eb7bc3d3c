//! Per-host registry of features taking part in the initialization chain.
//!
//! The registry lives in the [`World`] as a resource and is passed to features
//! through it, so tests can build a bare `World`, insert a registry and drive
//! features without an [`App`].

mod chain;

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use hashbrown::HashMap;
use thiserror::Error;

use crate::init_state::{FeatureName, InitState, InitStateChanged};

pub use chain::{
    check_default_initialization, request_checks, try_advance, try_to_change_init_state,
};

/// Behaviour a feature plugs into the chain.
///
/// Drivers are stateless; per-host data lives in components on the host and
/// is read through the [`World`].
pub trait InitStateFeature: Send + Sync + 'static {
    /// Whether the feature on `host` may move from `current` to `desired`.
    fn can_change_init_state(
        &self,
        world: &World,
        host: Entity,
        current: Option<InitState>,
        desired: InitState,
    ) -> bool;

    /// Runs after a transition has been committed.
    fn handle_change_init_state(
        &self,
        _world: &mut World,
        _host: Entity,
        _current: Option<InitState>,
        _desired: InitState,
    ) {
    }

    /// Called when another feature on the same host transitions.
    fn on_actor_init_state_changed(&self, _world: &mut World, _event: &InitStateChanged) {}
}

/// Failures reported by [`FeatureRegistry`] bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The feature name is already taken on the host.
    #[error("feature {feature} is already registered on {host:?}")]
    AlreadyRegistered {
        /// Host the registration targeted.
        host: Entity,
        /// Duplicate feature name.
        feature: FeatureName,
    },
    /// The feature is not known on the host.
    #[error("feature {feature} is not registered on {host:?}")]
    NotRegistered {
        /// Host the lookup targeted.
        host: Entity,
        /// Missing feature name.
        feature: FeatureName,
    },
    /// The requested state is not the next stage of the chain.
    #[error("feature {feature} cannot move from {current:?} to {desired}")]
    OutOfOrder {
        /// Feature that attempted the move.
        feature: FeatureName,
        /// State at the time of the attempt.
        current: Option<InitState>,
        /// Requested state.
        desired: InitState,
    },
}

struct FeatureEntry {
    name: FeatureName,
    state: Option<InitState>,
    driver: Arc<dyn InitStateFeature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InitRequest {
    host: Entity,
    feature: FeatureName,
}

/// Resource tracking, per host, each feature's position in the chain.
///
/// Features are kept in registration order, which is also the order in which
/// siblings are notified of transitions.
#[derive(Resource, Default)]
pub struct FeatureRegistry {
    hosts: HashMap<Entity, Vec<FeatureEntry>>,
    pending: VecDeque<InitRequest>,
    draining: bool,
}

impl FeatureRegistry {
    /// Registers `feature` on `host` with no state yet.
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyRegistered`] when the name is taken.
    pub fn register_feature(
        &mut self,
        host: Entity,
        feature: FeatureName,
        driver: Arc<dyn InitStateFeature>,
    ) -> Result<(), RegistryError> {
        let entries = self.hosts.entry(host).or_default();
        if entries.iter().any(|e| e.name == feature) {
            return Err(RegistryError::AlreadyRegistered { host, feature });
        }
        entries.push(FeatureEntry {
            name: feature,
            state: None,
            driver,
        });
        Ok(())
    }

    /// Removes `feature` from `host`, dropping any queued checks for it.
    /// Returns whether it was registered.
    pub fn unregister_feature(&mut self, host: Entity, feature: FeatureName) -> bool {
        let Some(entries) = self.hosts.get_mut(&host) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.name != feature);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.hosts.remove(&host);
        }
        self.pending
            .retain(|r| !(r.host == host && r.feature == feature));
        removed
    }

    /// Whether `feature` is registered on `host`.
    #[must_use]
    pub fn is_registered(&self, host: Entity, feature: FeatureName) -> bool {
        self.entry(host, feature).is_some()
    }

    /// Current state of `feature`, `None` when unregistered or not spawned.
    #[must_use]
    pub fn init_state(&self, host: Entity, feature: FeatureName) -> Option<InitState> {
        self.entry(host, feature).and_then(|e| e.state)
    }

    /// Whether `feature` on `host` is at `state` or further along.
    #[must_use]
    pub fn has_feature_reached_init_state(
        &self,
        host: Entity,
        feature: FeatureName,
        state: InitState,
    ) -> bool {
        self.init_state(host, feature).is_some_and(|s| s >= state)
    }

    /// Whether every feature registered on `host` is at `state` or further.
    /// Unknown hosts have not reached anything.
    #[must_use]
    pub fn have_all_features_reached_init_state(&self, host: Entity, state: InitState) -> bool {
        self.hosts.get(&host).is_some_and(|entries| {
            entries
                .iter()
                .all(|e| e.state.is_some_and(|s| s >= state))
        })
    }

    /// Names of the features on `host`, in registration order.
    #[must_use]
    pub fn feature_names(&self, host: Entity) -> Vec<FeatureName> {
        self.hosts
            .get(&host)
            .map(|entries| entries.iter().map(|e| e.name).collect())
            .unwrap_or_default()
    }

    /// Number of chain checks waiting to run.
    #[must_use]
    pub fn pending_checks(&self) -> usize {
        self.pending.len()
    }

    fn entry(&self, host: Entity, feature: FeatureName) -> Option<&FeatureEntry> {
        self.hosts
            .get(&host)
            .and_then(|entries| entries.iter().find(|e| e.name == feature))
    }

    fn driver(&self, host: Entity, feature: FeatureName) -> Option<Arc<dyn InitStateFeature>> {
        self.entry(host, feature).map(|e| Arc::clone(&e.driver))
    }

    fn siblings(&self, host: Entity, feature: FeatureName) -> Vec<Arc<dyn InitStateFeature>> {
        self.hosts
            .get(&host)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.name != feature)
                    .map(|e| Arc::clone(&e.driver))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn commit(
        &mut self,
        host: Entity,
        feature: FeatureName,
        desired: InitState,
    ) -> Result<Option<InitState>, RegistryError> {
        let entry = self
            .hosts
            .get_mut(&host)
            .and_then(|entries| entries.iter_mut().find(|e| e.name == feature))
            .ok_or(RegistryError::NotRegistered { host, feature })?;
        if !InitState::is_next_after(desired, entry.state) {
            return Err(RegistryError::OutOfOrder {
                feature,
                current: entry.state,
                desired,
            });
        }
        let previous = entry.state;
        entry.state = Some(desired);
        Ok(previous)
    }

    fn enqueue(&mut self, host: Entity, feature: FeatureName) {
        let request = InitRequest { host, feature };
        if !self.pending.contains(&request) {
            self.pending.push_back(request);
        }
    }
}
