//! Spawning players and hero pawns into a bare `World`.

use bevy::prelude::*;
use possession::input::{EnhancedInputSubsystem, InputComponent, LocalPlayer};
use possession::{
    AbilitySystem, CameraComponent, Character, Controller, DeferredRebinds, FeatureRegistry, Hero,
    NetRole, Pawn, PawnExtension, PlayerState,
};

use crate::configs::hero_settings;

/// Which kind of controller a player gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    /// Local human with a local player and an input component.
    Local,
    /// Local AI without input.
    Bot,
    /// Controller of another machine that still carries an input component.
    Remote,
}

/// Controller and player state spawned together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    /// The controller.
    pub controller: Entity,
    /// Its player state, which carries the ability system.
    pub player_state: Entity,
}

/// A world with the registry and deferred rebind resources.
#[must_use]
pub fn world_with_registry() -> World {
    let mut world = World::new();
    world.init_resource::<FeatureRegistry>();
    world.init_resource::<DeferredRebinds>();
    world
}

/// Spawns a controller of `kind` paired with a fresh player state.
pub fn spawn_player(world: &mut World, kind: PlayerKind) -> Player {
    let controller = match kind {
        PlayerKind::Local => world
            .spawn((
                Controller::local_player(),
                LocalPlayer {
                    input: EnhancedInputSubsystem::with_user_settings(),
                },
                InputComponent::default(),
            ))
            .id(),
        PlayerKind::Bot => world.spawn(Controller::bot()).id(),
        PlayerKind::Remote => world
            .spawn((Controller::remote(), InputComponent::default()))
            .id(),
    };
    let player_state = world
        .spawn((
            PlayerState {
                owner: Some(controller),
            },
            AbilitySystem::default(),
        ))
        .id();
    if let Some(mut c) = world.get_mut::<Controller>(controller) {
        c.player_state = Some(player_state);
    }
    Player {
        controller,
        player_state,
    }
}

/// Spawns a pawn with both features, a camera and a character, without
/// beginning play.
pub fn spawn_hero_pawn(world: &mut World, role: NetRole) -> Entity {
    world
        .spawn((
            Pawn::with_role(role),
            PawnExtension::default(),
            Hero::new(hero_settings()),
            CameraComponent::default(),
            Character::default(),
        ))
        .id()
}
