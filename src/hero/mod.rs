//! Hero feature: turns a possessed pawn into something a player can drive.
//!
//! The hero waits for the pawn extension to finish data initialization, then
//! binds the player state's ability system, the controller's input and the
//! pawn's camera.

mod handlers;
mod input_binding;

use std::sync::Arc;

use bevy::prelude::*;
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::ability_system::AbilitySpecHandle;
use crate::camera::{CameraComponent, CameraMode};
use crate::components::{
    controller_of, is_bot_controlled, is_locally_controlled, player_state_of, Controller, NetRole,
    Pawn, PlayerState,
};
use crate::init_state::{FeatureName, InitState, InitStateChanged};
use crate::input::{BindingHandle, InputComponent, InputMappingContextAndPriority, LocalPlayer};
use crate::pawn_extension::{self, PAWN_EXTENSION_FEATURE};
use crate::registry::{self, FeatureRegistry, InitStateFeature, RegistryError};

pub use handlers::{
    dispatch_input, input_ability_tag_pressed, input_ability_tag_released, input_auto_run,
    input_crouch, input_look_mouse, input_look_stick, input_move,
};
pub use input_binding::{
    add_additional_input_config, initialize_player_input, is_ready_to_bind_inputs,
    remove_additional_input_config, reset_inputs, BindInputsNow, InputBindingError,
};

/// Registry name of the hero.
pub const HERO_FEATURE: FeatureName = FeatureName("Hero");

/// Designer-facing hero settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSettings {
    /// Mapping contexts applied whenever input is bound.
    #[serde(default)]
    pub default_input_mappings: Vec<InputMappingContextAndPriority>,
}

/// Per-pawn hero state.
#[derive(Component, Debug, Clone, Default)]
pub struct Hero {
    settings: HeroSettings,
    ready_to_bind_inputs: bool,
    bind_handles: Vec<BindingHandle>,
    ability_camera_mode: Option<CameraMode>,
    ability_camera_mode_owner: Option<AbilitySpecHandle>,
}

impl Hero {
    /// A hero using `settings`.
    #[must_use]
    pub fn new(settings: HeroSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Settings the hero was created with.
    #[must_use]
    pub const fn settings(&self) -> &HeroSettings {
        &self.settings
    }

    /// Whether input has been bound since the last reset.
    #[must_use]
    pub const fn ready_to_bind_inputs(&self) -> bool {
        self.ready_to_bind_inputs
    }

    /// Handles of the bindings this hero installed.
    #[must_use]
    pub fn bind_handles(&self) -> &[BindingHandle] {
        &self.bind_handles
    }

    /// Camera mode requested by a running ability.
    #[must_use]
    pub const fn ability_camera_mode(&self) -> Option<&CameraMode> {
        self.ability_camera_mode.as_ref()
    }
}

/// Chain driver for [`Hero`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HeroFeature;

impl InitStateFeature for HeroFeature {
    fn can_change_init_state(
        &self,
        world: &World,
        host: Entity,
        current: Option<InitState>,
        desired: InitState,
    ) -> bool {
        match (current, desired) {
            (None, InitState::Spawned) => world.get::<Pawn>(host).is_some(),
            (Some(InitState::Spawned), InitState::DataAvailable) => data_available(world, host),
            (Some(InitState::DataAvailable), InitState::DataInitialized) => {
                player_state_of(world, host).is_some()
                    && world.get_resource::<FeatureRegistry>().is_some_and(|r| {
                        r.has_feature_reached_init_state(
                            host,
                            PAWN_EXTENSION_FEATURE,
                            InitState::DataInitialized,
                        )
                    })
            }
            (Some(InitState::DataInitialized), InitState::GameplayReady) => true,
            _ => false,
        }
    }

    fn handle_change_init_state(
        &self,
        world: &mut World,
        host: Entity,
        current: Option<InitState>,
        desired: InitState,
    ) {
        if current == Some(InitState::DataAvailable) && desired == InitState::DataInitialized {
            initialize_hero(world, host);
        }
    }

    fn on_actor_init_state_changed(&self, world: &mut World, event: &InitStateChanged) {
        if event.feature == PAWN_EXTENSION_FEATURE && event.state == InitState::DataInitialized {
            check_default_initialization(world, event.host);
        }
    }
}

fn data_available(world: &World, pawn: Entity) -> bool {
    let Some(player_state) = player_state_of(world, pawn) else {
        return false;
    };
    let Some(role) = world.get::<Pawn>(pawn).map(|p| p.role) else {
        return false;
    };
    if role != NetRole::SimulatedProxy {
        let paired = controller_of(world, pawn).is_some_and(|controller| {
            world
                .get::<Controller>(controller)
                .is_some_and(|c| c.player_state == Some(player_state))
                && world
                    .get::<PlayerState>(player_state)
                    .is_some_and(|ps| ps.owner == Some(controller))
        });
        if !paired {
            return false;
        }
    }
    if is_locally_controlled(world, pawn) && !is_bot_controlled(world, pawn) {
        let Some(controller) = controller_of(world, pawn) else {
            return false;
        };
        if world.get::<InputComponent>(controller).is_none()
            || world.get::<LocalPlayer>(controller).is_none()
        {
            return false;
        }
    }
    true
}

fn initialize_hero(world: &mut World, pawn: Entity) {
    let Some(player_state) = player_state_of(world, pawn) else {
        error!("hero on {pawn:?} reached data initialization without a player state");
        return;
    };
    let config = pawn_extension::pawn_config(world, pawn);
    if world.get::<pawn_extension::PawnExtension>(pawn).is_some() {
        // The player state carries the ability system and owns it.
        pawn_extension::initialize_ability_system(world, pawn, player_state, player_state);
    }

    let player_controller = controller_of(world, pawn).filter(|c| {
        world.get::<LocalPlayer>(*c).is_some() && world.get::<InputComponent>(*c).is_some()
    });
    if player_controller.is_some() {
        if let Err(e) = initialize_player_input(world, pawn) {
            error!("{e}");
        }
    }

    let has_camera_mode = config
        .as_deref()
        .is_some_and(|c| c.default_camera_mode.is_some());
    if has_camera_mode {
        if let Some(mut camera) = world.get_mut::<CameraComponent>(pawn) {
            camera.bind_mode_resolver(pawn);
        }
    }
}

/// Registers the hero of `pawn` with the registry.
///
/// # Errors
/// Propagates [`RegistryError::AlreadyRegistered`].
pub fn on_register(world: &mut World, pawn: Entity) -> Result<(), RegistryError> {
    if world.get::<Pawn>(pawn).is_none() {
        warn!("hero on {pawn:?} can only be added to pawns");
    }
    let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() else {
        warn!("no FeatureRegistry in world; {pawn:?} stays unregistered");
        return Ok(());
    };
    registry.register_feature(pawn, HERO_FEATURE, Arc::new(HeroFeature))
}

/// Forces the hero to [`InitState::Spawned`] unless the pawn extension's
/// begin play already moved it, then walks the chain.
pub fn begin_play(world: &mut World, pawn: Entity) {
    let unspawned = world
        .get_resource::<FeatureRegistry>()
        .is_some_and(|r| r.init_state(pawn, HERO_FEATURE).is_none());
    if unspawned
        && !registry::try_to_change_init_state(world, pawn, HERO_FEATURE, InitState::Spawned)
    {
        error!("hero on {pawn:?} failed to reach {}", InitState::Spawned);
    }
    check_default_initialization(world, pawn);
}

/// Leaves the registry.
pub fn end_play(world: &mut World, pawn: Entity) {
    if let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() {
        registry.unregister_feature(pawn, HERO_FEATURE);
    }
}

/// Walks the hero along the chain as far as it can go.
pub fn check_default_initialization(world: &mut World, pawn: Entity) {
    registry::check_default_initialization(world, pawn, HERO_FEATURE);
}

/// Camera mode the hero on `pawn` wants: the ability override if any, else
/// the pawn config's default.
#[must_use]
pub fn determine_camera_mode(world: &World, pawn: Entity) -> Option<CameraMode> {
    if let Some(mode) = world
        .get::<Hero>(pawn)
        .and_then(|h| h.ability_camera_mode.clone())
    {
        return Some(mode);
    }
    pawn_extension::pawn_config(world, pawn).and_then(|c| c.default_camera_mode.clone())
}

/// Lets the ability `owner` override the camera mode.
pub fn set_ability_camera_mode(
    world: &mut World,
    pawn: Entity,
    mode: Option<CameraMode>,
    owner: AbilitySpecHandle,
) {
    let Some(requested) = mode else {
        return;
    };
    if let Some(mut hero) = world.get_mut::<Hero>(pawn) {
        hero.ability_camera_mode = Some(requested);
        hero.ability_camera_mode_owner = Some(owner);
    }
}

/// Drops the override, but only if `owner` set it.
pub fn clear_ability_camera_mode(world: &mut World, pawn: Entity, owner: AbilitySpecHandle) {
    if let Some(mut hero) = world.get_mut::<Hero>(pawn) {
        if hero.ability_camera_mode_owner == Some(owner) {
            hero.ability_camera_mode = None;
            hero.ability_camera_mode_owner = None;
        }
    }
}
