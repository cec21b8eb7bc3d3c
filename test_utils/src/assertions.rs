//! Assertion helpers over a `World`, returning `anyhow` errors so tests can
//! use `?`.

use anyhow::{ensure, Context, Result};
use bevy::prelude::*;
use possession::input::InputComponent;
use possession::{FeatureName, FeatureRegistry, InitState};

/// State of `feature` on `pawn`.
///
/// # Errors
/// Fails when the world has no registry.
pub fn init_state(world: &World, pawn: Entity, feature: FeatureName) -> Result<Option<InitState>> {
    let registry = world
        .get_resource::<FeatureRegistry>()
        .context("FeatureRegistry resource missing")?;
    Ok(registry.init_state(pawn, feature))
}

/// Checks that `feature` on `pawn` is at `expected`.
///
/// # Errors
/// Fails when the state differs or the registry is missing.
pub fn ensure_init_state(
    world: &World,
    pawn: Entity,
    feature: FeatureName,
    expected: InitState,
) -> Result<()> {
    let actual = init_state(world, pawn, feature)?;
    ensure!(
        actual == Some(expected),
        "expected {feature} on {pawn:?} at {expected}, got {actual:?}"
    );
    Ok(())
}

/// Number of bindings `pawn` owns on `controller`'s input component.
///
/// # Errors
/// Fails when the controller has no input component.
pub fn binding_count(world: &World, controller: Entity, pawn: Entity) -> Result<usize> {
    let input = world
        .get::<InputComponent>(controller)
        .context("controller has no InputComponent")?;
    Ok(input.binding_count_for(pawn))
}
