//! Binding pawns to ability systems, including stale avatars left behind by
//! respawn races.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bevy::prelude::*;
use possession::pawn_extension::{self, BindingCallback};
use possession::{AbilitySystem, NetRole};
use rstest::{fixture, rstest};
use test_utils::{hero_pawn_config, spawn_hero_pawn, spawn_player, world_with_registry, PlayerKind};

struct Race {
    world: World,
    ability_system: Entity,
    stale: Entity,
    fresh: Entity,
}

#[fixture]
fn race() -> Race {
    let mut world = world_with_registry();
    let player = spawn_player(&mut world, PlayerKind::Remote);
    let stale = spawn_hero_pawn(&mut world, NetRole::SimulatedProxy);
    let fresh = spawn_hero_pawn(&mut world, NetRole::SimulatedProxy);
    Race {
        world,
        ability_system: player.player_state,
        stale,
        fresh,
    }
}

fn counting(counter: &Arc<AtomicUsize>) -> BindingCallback {
    let shared = Arc::clone(counter);
    Box::new(move |_, _| {
        shared.fetch_add(1, Ordering::SeqCst);
    })
}

fn avatar(world: &World, ability_system: Entity) -> Option<Entity> {
    world
        .get::<AbilitySystem>(ability_system)
        .and_then(AbilitySystem::avatar_actor)
}

#[rstest]
fn stale_simulated_avatar_is_evicted(mut race: Race) {
    let Race {
        ref mut world,
        ability_system,
        stale,
        fresh,
    } = race;
    pawn_extension::initialize_ability_system(world, stale, ability_system, ability_system);
    let released = Arc::new(AtomicUsize::new(0));
    let watcher = world.spawn_empty().id();
    pawn_extension::on_ability_system_uninitialized_register(
        world,
        stale,
        watcher,
        counting(&released),
    );

    pawn_extension::initialize_ability_system(world, fresh, ability_system, ability_system);

    assert_eq!(avatar(world, ability_system), Some(fresh));
    assert_eq!(pawn_extension::ability_system_of(world, fresh), Some(ability_system));
    assert_eq!(pawn_extension::ability_system_of(world, stale), None);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[rstest]
fn authoritative_avatar_is_not_evicted(mut race: Race) {
    let Race {
        ref mut world,
        ability_system,
        stale,
        fresh,
    } = race;
    if let Some(mut pawn) = world.get_mut::<possession::Pawn>(stale) {
        pawn.role = NetRole::Authority;
    }
    pawn_extension::initialize_ability_system(world, stale, ability_system, ability_system);
    pawn_extension::initialize_ability_system(world, fresh, ability_system, ability_system);

    assert_eq!(avatar(world, ability_system), Some(stale));
    assert_eq!(pawn_extension::ability_system_of(world, fresh), None);
}

#[rstest]
fn switching_systems_releases_the_old_one_first(mut race: Race) {
    let Race {
        ref mut world,
        ability_system,
        fresh,
        ..
    } = race;
    let other = spawn_player(world, PlayerKind::Remote).player_state;
    let watcher = world.spawn_empty().id();
    let bound = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    pawn_extension::on_ability_system_initialized_register_and_call(
        world,
        fresh,
        watcher,
        counting(&bound),
    );
    pawn_extension::on_ability_system_uninitialized_register(
        world,
        fresh,
        watcher,
        counting(&released),
    );

    pawn_extension::initialize_ability_system(world, fresh, ability_system, ability_system);
    pawn_extension::initialize_ability_system(world, fresh, other, other);

    assert_eq!(bound.load(Ordering::SeqCst), 2);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(avatar(world, ability_system), None);
    assert_eq!(avatar(world, other), Some(fresh));
}

#[rstest]
fn controller_changes_refresh_actor_info(mut race: Race) {
    let Race {
        ref mut world,
        ability_system,
        fresh,
        ..
    } = race;
    pawn_extension::initialize_ability_system(world, fresh, ability_system, ability_system);
    pawn_extension::handle_controller_changed(world, fresh);

    let system = world.get::<AbilitySystem>(ability_system).expect("ability system");
    assert_eq!(system.actor_info_refreshes(), 1);
    assert_eq!(system.avatar_actor(), Some(fresh));
}

#[rstest]
fn tag_relationships_follow_the_pawn_config(mut race: Race) {
    let Race {
        ref mut world,
        ability_system,
        fresh,
        ..
    } = race;
    pawn_extension::on_rep_pawn_config(world, fresh, hero_pawn_config())
        .expect("replicated config applies");
    pawn_extension::initialize_ability_system(world, fresh, ability_system, ability_system);

    let system = world.get::<AbilitySystem>(ability_system).expect("ability system");
    let mapping = system
        .tag_relationship_mapping()
        .expect("mapping applied");
    assert_eq!(mapping.name, "TagRelationships_Test");
}
