//! Driving features through the chain.
//!
//! Transition handlers and sibling notifications frequently ask for more
//! checks while a check is already running. Those requests are queued on the
//! registry and drained by the outermost caller until no feature can move,
//! so the call stack stays flat however long the cascade gets.

use bevy::prelude::*;
use log::{debug, error, warn};

use super::{FeatureRegistry, InitStateFeature};
use crate::init_state::{FeatureName, InitState, InitStateChanged};

/// Attempts to move `feature` on `host` straight to `desired`.
///
/// Only the stage directly after the feature's current one is accepted.
/// Returns whether the transition was committed. Any checks requested by the
/// transition's handlers run before this returns.
pub fn try_to_change_init_state(
    world: &mut World,
    host: Entity,
    feature: FeatureName,
    desired: InitState,
) -> bool {
    let outermost = begin_drain(world);
    let changed = step_to(world, host, feature, desired);
    if outermost {
        drain(world);
    }
    changed
}

/// Attempts a single step along the chain. Returns whether it happened.
pub fn try_advance(world: &mut World, host: Entity, feature: FeatureName) -> bool {
    let Some(registry) = world.get_resource::<FeatureRegistry>() else {
        warn!("no FeatureRegistry in world; {feature} on {host:?} cannot advance");
        return false;
    };
    if !registry.is_registered(host, feature) {
        return false;
    }
    match InitState::after(registry.init_state(host, feature)) {
        Some(next) => try_to_change_init_state(world, host, feature, next),
        None => false,
    }
}

/// Walks `feature` as far along the chain as its predicates allow.
pub fn check_default_initialization(world: &mut World, host: Entity, feature: FeatureName) {
    request_checks(world, host, &[feature]);
}

/// Queues a chain walk for each of `features`, in order, and drains the queue
/// unless a drain is already running further up the stack.
pub fn request_checks(world: &mut World, host: Entity, features: &[FeatureName]) {
    let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() else {
        warn!("no FeatureRegistry in world; skipping checks on {host:?}");
        return;
    };
    for feature in features {
        registry.enqueue(host, *feature);
    }
    if begin_drain(world) {
        drain(world);
    }
}

fn begin_drain(world: &mut World) -> bool {
    match world.get_resource_mut::<FeatureRegistry>() {
        Some(mut registry) if !registry.draining => {
            registry.draining = true;
            true
        }
        _ => false,
    }
}

fn drain(world: &mut World) {
    loop {
        let popped = world
            .get_resource_mut::<FeatureRegistry>()
            .and_then(|mut registry| registry.pending.pop_front());
        let Some(request) = popped else {
            break;
        };
        walk_chain(world, request.host, request.feature);
    }
    if let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() {
        registry.draining = false;
    }
}

fn walk_chain(world: &mut World, host: Entity, feature: FeatureName) {
    loop {
        let after = match world.get_resource::<FeatureRegistry>() {
            Some(registry) if registry.is_registered(host, feature) => {
                InitState::after(registry.init_state(host, feature))
            }
            _ => return,
        };
        let Some(next) = after else {
            return;
        };
        if !step_to(world, host, feature, next) {
            return;
        }
    }
}

fn step_to(world: &mut World, host: Entity, feature: FeatureName, desired: InitState) -> bool {
    let Some((current, driver)) = lookup(world, host, feature) else {
        debug!("{feature} on {host:?} is not registered");
        return false;
    };
    if !InitState::is_next_after(desired, current) {
        debug!("{feature} on {host:?} cannot jump from {current:?} to {desired}");
        return false;
    }
    if !driver.can_change_init_state(world, host, current, desired) {
        debug!("{feature} on {host:?} is waiting at {current:?} for {desired}");
        return false;
    }

    let committed = world
        .resource_mut::<FeatureRegistry>()
        .commit(host, feature, desired);
    if let Err(e) = committed {
        // The predicate itself moved us; nothing left to do here.
        error!("{e}");
        return false;
    }
    debug!("{feature} on {host:?}: {current:?} -> {desired}");

    driver.handle_change_init_state(world, host, current, desired);

    let event = InitStateChanged {
        host,
        feature,
        state: desired,
    };
    let siblings = world
        .get_resource::<FeatureRegistry>()
        .map(|registry| registry.siblings(host, feature))
        .unwrap_or_default();
    for sibling in siblings {
        sibling.on_actor_init_state_changed(world, &event);
    }
    world.trigger(event);
    true
}

fn lookup(
    world: &World,
    host: Entity,
    feature: FeatureName,
) -> Option<(Option<InitState>, std::sync::Arc<dyn InitStateFeature>)> {
    let registry = world.get_resource::<FeatureRegistry>()?;
    let driver = registry.driver(host, feature)?;
    Some((registry.init_state(host, feature), driver))
}
