//! Possession glue: pairing controllers with pawns and keeping the hero's
//! input bindings in step with who controls the pawn.

mod deferred;

use std::sync::Arc;

use bevy::prelude::*;
use log::{debug, info, warn};

use crate::ability_system::AbilitySystem;
use crate::components::{Controller, Pawn};
use crate::hero::{self, Hero};
use crate::input::InputComponent;
use crate::pawn_data::PawnConfig;
use crate::pawn_extension::{self, PawnExtension};

pub use deferred::{
    cancel_rebind, run_deferred_rebinds, schedule_rebind, DeferredRebinds, PendingRebind,
};

/// A character that carries its own ability system and a fallback config.
#[derive(Component, Debug, Clone, Default)]
pub struct PossessionCharacter {
    /// Config applied at begin play when the pawn has none.
    pub default_pawn_config: Option<Arc<PawnConfig>>,
}

/// Makes `controller` possess `pawn`.
///
/// A controller already holding `pawn` lets go of it first. A pawn whose hero
/// has not bound input yet gets one rebind scheduled for the next tick.
pub fn possess(world: &mut World, controller: Entity, pawn: Entity) {
    let Some(previous) = world.get::<Controller>(controller).map(|c| c.pawn) else {
        warn!("{controller:?} is not a controller");
        return;
    };
    if world.get::<Pawn>(pawn).is_none() {
        warn!("{pawn:?} is not a pawn");
        return;
    }
    let holder = world.get::<Pawn>(pawn).and_then(|p| p.controller);
    if let Some(other) = holder.filter(|c| *c != controller) {
        debug!("{other:?} loses {pawn:?} to {controller:?}");
        unpossess(world, other, false);
    }
    if previous.is_some_and(|p| p != pawn) {
        unpossess(world, controller, false);
    }

    let player_state = world
        .get_mut::<Controller>(controller)
        .and_then(|mut c| {
            c.pawn = Some(pawn);
            c.player_state
        });
    if let Some(mut p) = world.get_mut::<Pawn>(pawn) {
        p.controller = Some(controller);
        p.player_state = player_state;
    }
    info!("{controller:?} possessed {pawn:?}");

    if world.get::<PawnExtension>(pawn).is_some() {
        pawn_extension::handle_controller_changed(world, pawn);
    }

    let has_hero = world.get::<Hero>(pawn).is_some();
    if !has_hero || world.get::<InputComponent>(controller).is_none() {
        return;
    }
    if hero::is_ready_to_bind_inputs(world, pawn) {
        debug!("{pawn:?} already has input bound; no rebind needed");
    } else {
        schedule_rebind(world, pawn, controller);
    }
}

/// Releases the pawn possessed by `controller`, dropping its input bindings.
///
/// With `force` the bindings are cleared even when the hero does not know of
/// any.
pub fn unpossess(world: &mut World, controller: Entity, force: bool) {
    let Some(pawn) = world.get::<Controller>(controller).and_then(|c| c.pawn) else {
        return;
    };
    cancel_rebind(world, pawn);
    if world.get::<Hero>(pawn).is_some() && world.get::<InputComponent>(controller).is_some() {
        hero::reset_inputs(world, pawn, controller, force);
    }

    if let Some(mut c) = world.get_mut::<Controller>(controller) {
        c.pawn = None;
    }
    if let Some(mut p) = world.get_mut::<Pawn>(pawn) {
        p.controller = None;
        p.player_state = None;
    }
    info!("{controller:?} released {pawn:?}");

    if world.get::<PawnExtension>(pawn).is_some() {
        pawn_extension::handle_controller_changed(world, pawn);
    }
}

/// Seeds a [`PossessionCharacter`] with its default config and grants the
/// config's ability sets to the character's own ability system.
pub fn character_begin_play(world: &mut World, pawn: Entity) {
    let Some(default_config) = world
        .get::<PossessionCharacter>(pawn)
        .map(|c| c.default_pawn_config.clone())
    else {
        return;
    };
    if pawn_extension::pawn_config(world, pawn).is_none() {
        if let Some(config) = default_config {
            if let Err(e) = pawn_extension::set_pawn_config(world, pawn, config) {
                warn!("{pawn:?} kept no default config: {e}");
            }
        }
    }

    let Some(config) = pawn_extension::pawn_config(world, pawn) else {
        return;
    };
    let Some(mut asc) = world.get_mut::<AbilitySystem>(pawn) else {
        warn!("character {pawn:?} has no ability system to grant [{}] to", config.name);
        return;
    };
    for set in &config.ability_sets {
        let granted = asc.give_ability_set(set);
        debug!("granted {} abilities from [{}] to {pawn:?}", granted.len(), set.name);
    }
    if let Some(mut p) = world.get_mut::<Pawn>(pawn) {
        p.force_net_update();
    }
}
