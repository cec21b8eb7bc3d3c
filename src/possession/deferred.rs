//! One-tick deferred input rebinds.
//!
//! Possession can arrive before the hero is able to bind input. A rebind is
//! then parked here and fired by [`run_deferred_rebinds`] on a later tick,
//! unless unpossession cancels it first.

use bevy::prelude::*;
use hashbrown::HashMap;
use log::debug;

use crate::components::controller_of;
use crate::constants::DEFERRED_REBIND_DELAY_TICKS;
use crate::hero::{self, HERO_FEATURE};
use crate::init_state::InitState;
use crate::plugin::{PossessionSyncError, PossessionSyncErrorContext};
use crate::registry::FeatureRegistry;

/// A rebind waiting for its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRebind {
    /// Controller that possessed the pawn.
    pub controller: Entity,
    /// Tick on which the rebind fires.
    pub due_tick: u64,
}

/// Pending rebinds, at most one per pawn.
#[derive(Resource, Debug, Default)]
pub struct DeferredRebinds {
    tick: u64,
    pending: HashMap<Entity, PendingRebind>,
}

impl DeferredRebinds {
    /// Schedules a rebind of `pawn` for the next tick, replacing any pending
    /// one. Returns the replaced entry.
    pub fn schedule(&mut self, pawn: Entity, controller: Entity) -> Option<PendingRebind> {
        let due_tick = self.tick + DEFERRED_REBIND_DELAY_TICKS;
        self.pending.insert(
            pawn,
            PendingRebind {
                controller,
                due_tick,
            },
        )
    }

    /// Drops the pending rebind of `pawn`. Returns whether one existed.
    pub fn cancel(&mut self, pawn: Entity) -> bool {
        self.pending.remove(&pawn).is_some()
    }

    /// Pending rebind of `pawn`.
    #[must_use]
    pub fn pending(&self, pawn: Entity) -> Option<PendingRebind> {
        self.pending.get(&pawn).copied()
    }

    /// Number of pending rebinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Ticks elapsed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    fn advance(&mut self) -> Vec<(Entity, PendingRebind)> {
        self.tick += 1;
        let tick = self.tick;
        let mut due: Vec<(Entity, PendingRebind)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_tick <= tick)
            .map(|(pawn, p)| (*pawn, *p))
            .collect();
        due.sort_by_key(|(pawn, _)| *pawn);
        for (pawn, _) in &due {
            self.pending.remove(pawn);
        }
        due
    }
}

/// Schedules a rebind of `pawn` through the world's [`DeferredRebinds`].
pub fn schedule_rebind(world: &mut World, pawn: Entity, controller: Entity) {
    let Some(mut rebinds) = world.get_resource_mut::<DeferredRebinds>() else {
        debug!("no DeferredRebinds in world; {pawn:?} will not be rebound");
        return;
    };
    if rebinds.schedule(pawn, controller).is_some() {
        debug!("replaced pending rebind of {pawn:?}");
    }
}

/// Cancels the pending rebind of `pawn`. Returns whether one existed.
pub fn cancel_rebind(world: &mut World, pawn: Entity) -> bool {
    world
        .get_resource_mut::<DeferredRebinds>()
        .is_some_and(|mut rebinds| rebinds.cancel(pawn))
}

/// Advances the rebind clock and fires every rebind that came due.
pub fn run_deferred_rebinds(world: &mut World) {
    let due = match world.get_resource_mut::<DeferredRebinds>() {
        Some(mut rebinds) => rebinds.advance(),
        None => return,
    };
    for (pawn, pending) in due {
        fire(world, pawn, pending);
    }
}

fn fire(world: &mut World, pawn: Entity, pending: PendingRebind) {
    if controller_of(world, pawn) != Some(pending.controller) {
        debug!("{pawn:?} changed hands before its rebind; dropping it");
        return;
    }
    if hero::is_ready_to_bind_inputs(world, pawn) {
        debug!("{pawn:?} already bound its input");
        return;
    }
    let initialized = world.get_resource::<FeatureRegistry>().is_some_and(|r| {
        r.has_feature_reached_init_state(pawn, HERO_FEATURE, InitState::DataInitialized)
    });
    if !initialized {
        // The hero binds on its own when it reaches data initialization.
        debug!("hero on {pawn:?} is not initialized yet; leaving the bind to it");
        return;
    }
    if let Err(e) = hero::initialize_player_input(world, pawn) {
        world.trigger(PossessionSyncError::new(
            PossessionSyncErrorContext::Rebind,
            e.to_string(),
        ));
    }
}
