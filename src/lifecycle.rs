//! Begin/end play for pawns hosting the init-state features.
//!
//! Every feature on a pawn registers before any of them starts walking the
//! chain, so the pawn extension's barrier sees the whole set.

use bevy::prelude::*;
use log::info;

use crate::hero::{self, Hero};
use crate::pawn_extension::{self, PawnExtension};
use crate::plugin::{PossessionSyncError, PossessionSyncErrorContext};
use crate::possession::{self, PossessionCharacter};

/// Marks a pawn whose features still have to begin play.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PendingBeginPlay;

/// Registers and starts every feature on `pawn`.
pub fn begin_play(world: &mut World, pawn: Entity) {
    let has_extension = world.get::<PawnExtension>(pawn).is_some();
    let has_hero = world.get::<Hero>(pawn).is_some();

    if has_extension {
        if let Err(e) = pawn_extension::on_register(world, pawn) {
            report(world, &e.to_string());
        }
    }
    if has_hero {
        if let Err(e) = hero::on_register(world, pawn) {
            report(world, &e.to_string());
        }
    }
    if has_extension {
        pawn_extension::begin_play(world, pawn);
    }
    if has_hero {
        hero::begin_play(world, pawn);
    }
    if world.get::<PossessionCharacter>(pawn).is_some() {
        possession::character_begin_play(world, pawn);
    }
    info!("{pawn:?} began play");
}

/// Stops every feature on `pawn` and releases what it holds.
pub fn end_play(world: &mut World, pawn: Entity) {
    possession::cancel_rebind(world, pawn);
    if world.get::<Hero>(pawn).is_some() {
        hero::end_play(world, pawn);
    }
    if world.get::<PawnExtension>(pawn).is_some() {
        pawn_extension::end_play(world, pawn);
    }
    info!("{pawn:?} ended play");
}

fn report(world: &mut World, detail: &str) {
    world.trigger(PossessionSyncError::new(
        PossessionSyncErrorContext::BeginPlay,
        detail,
    ));
}

/// Runs [`begin_play`] for every pawn tagged [`PendingBeginPlay`].
pub fn begin_play_pending_hosts(world: &mut World) {
    let mut query = world.query_filtered::<Entity, With<PendingBeginPlay>>();
    let hosts: Vec<Entity> = query.iter(world).collect();
    for pawn in hosts {
        world.entity_mut(pawn).remove::<PendingBeginPlay>();
        begin_play(world, pawn);
    }
}
