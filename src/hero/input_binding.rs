//! Binding the controller's input to the hero.

use bevy::prelude::*;
use log::{debug, error, warn};
use thiserror::Error;

use super::Hero;
use crate::components::controller_of;
use crate::input::{
    BindingHandle, InputComponent, InputConfig, LocalPlayer, ModifyContextOptions, NativeInput,
    TriggerEvent,
};
use crate::pawn_extension;
use crate::tags::{
    GameplayTag, INPUT_TAG_AUTO_RUN, INPUT_TAG_CROUCH, INPUT_TAG_LOOK_MOUSE, INPUT_TAG_LOOK_STICK,
    INPUT_TAG_MOVE,
};

const NATIVE_BINDINGS: [(GameplayTag, NativeInput); 5] = [
    (INPUT_TAG_MOVE, NativeInput::Move),
    (INPUT_TAG_LOOK_MOUSE, NativeInput::LookMouse),
    (INPUT_TAG_LOOK_STICK, NativeInput::LookStick),
    (INPUT_TAG_CROUCH, NativeInput::Crouch),
    (INPUT_TAG_AUTO_RUN, NativeInput::AutoRun),
];

/// Fired once a hero has bound its input.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindInputsNow {
    /// Controller whose input component holds the bindings.
    pub controller: Entity,
    /// Pawn the bindings drive.
    pub pawn: Entity,
}

/// Collaborators missing when input is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputBindingError {
    /// The pawn has no hero.
    #[error("{pawn:?} has no hero")]
    MissingHero {
        /// Pawn being bound.
        pawn: Entity,
    },
    /// The pawn is not possessed.
    #[error("{pawn:?} has no controller to bind input on")]
    MissingController {
        /// Pawn being bound.
        pawn: Entity,
    },
    /// The controller has no local player.
    #[error("controller {controller:?} has no local player")]
    MissingLocalPlayer {
        /// Controller being bound.
        controller: Entity,
    },
    /// The controller has no input component.
    #[error("controller {controller:?} has no input component")]
    MissingInputComponent {
        /// Controller being bound.
        controller: Entity,
    },
}

/// Whether the hero on `pawn` has bound its input.
#[must_use]
pub fn is_ready_to_bind_inputs(world: &World, pawn: Entity) -> bool {
    world
        .get::<Hero>(pawn)
        .is_some_and(Hero::ready_to_bind_inputs)
}

/// Binds the hero on `pawn` to its controller's input from scratch.
///
/// Previous bindings of the pawn are dropped first, so calling this again
/// leaves exactly one set of bindings.
///
/// # Errors
/// Returns [`InputBindingError`] when the hero, controller, local player or
/// input component is missing.
pub fn initialize_player_input(world: &mut World, pawn: Entity) -> Result<(), InputBindingError> {
    let default_mappings = world
        .get::<Hero>(pawn)
        .ok_or(InputBindingError::MissingHero { pawn })?
        .settings
        .default_input_mappings
        .clone();
    let controller =
        controller_of(world, pawn).ok_or(InputBindingError::MissingController { pawn })?;
    if world.get::<LocalPlayer>(controller).is_none() {
        return Err(InputBindingError::MissingLocalPlayer { controller });
    }
    if world.get::<InputComponent>(controller).is_none() {
        return Err(InputBindingError::MissingInputComponent { controller });
    }
    let config = pawn_extension::pawn_config(world, pawn);

    let mut query = world.query::<(&mut LocalPlayer, &mut InputComponent)>();
    let Ok((mut local_player, mut input)) = query.get_mut(world, controller) else {
        return Err(InputBindingError::MissingInputComponent { controller });
    };
    let subsystem = &mut local_player.input;
    subsystem.clear_all_mappings();
    let dropped = input.remove_bindings_for_owner(pawn);
    if dropped > 0 {
        debug!("dropped {dropped} stale bindings of {pawn:?}");
    }

    let mut handles: Vec<BindingHandle> = Vec::new();
    if let Some(input_config) = config.as_deref().and_then(|c| c.input_config.as_ref()) {
        for mapping in &default_mappings {
            // Contexts not flagged for settings are left unapplied.
            if !mapping.register_with_settings {
                continue;
            }
            if let Some(settings) = subsystem.user_settings_mut() {
                settings.register_input_mapping_context(&mapping.input_mapping);
            }
            subsystem.add_mapping_context(
                &mapping.input_mapping,
                mapping.priority,
                ModifyContextOptions::default(),
            );
        }

        input.add_input_mappings(input_config, subsystem);
        handles.extend(input.bind_ability_actions(input_config, pawn));
        for (tag, native) in &NATIVE_BINDINGS {
            if let Some(handle) =
                input.bind_native_action(input_config, tag, TriggerEvent::Triggered, pawn, *native, true)
            {
                handles.push(handle);
            }
        }
    }

    if let Some(mut hero) = world.get_mut::<Hero>(pawn) {
        hero.bind_handles = handles;
        if hero.ready_to_bind_inputs {
            error!("hero on {pawn:?} bound its input twice without a reset");
        } else {
            hero.ready_to_bind_inputs = true;
        }
    }

    world.trigger(BindInputsNow { controller, pawn });
    Ok(())
}

/// Binds the ability actions of an extra input config on top of the
/// existing bindings.
pub fn add_additional_input_config(world: &mut World, pawn: Entity, config: &InputConfig) {
    let Some(controller) = controller_of(world, pawn) else {
        return;
    };
    if world.get::<LocalPlayer>(controller).is_none() {
        return;
    }
    let Some(mut input) = world.get_mut::<InputComponent>(controller) else {
        warn!("controller {controller:?} has no input component for [{}]", config.name);
        return;
    };
    let handles = input.bind_ability_actions(config, pawn);
    if let Some(mut hero) = world.get_mut::<Hero>(pawn) {
        hero.bind_handles.extend(handles);
    }
}

/// Unbinding extra configs is not supported; this only logs.
pub fn remove_additional_input_config(_world: &mut World, pawn: Entity, config: &InputConfig) {
    warn!("removing input config [{}] from {pawn:?} is not supported", config.name);
}

/// Drops the bindings the hero on `pawn` installed on `controller` and
/// clears its ready flag. Without `force` nothing is removed unless the hero
/// knows of bindings. Returns how many bindings went.
pub fn reset_inputs(world: &mut World, pawn: Entity, controller: Entity, force: bool) -> usize {
    let Some(mut hero) = world.get_mut::<Hero>(pawn) else {
        return 0;
    };
    hero.ready_to_bind_inputs = false;
    let known = std::mem::take(&mut hero.bind_handles);
    if known.is_empty() && !force {
        return 0;
    }
    let Some(mut input) = world.get_mut::<InputComponent>(controller) else {
        return 0;
    };
    let removed = input.remove_bindings_for_owner(pawn);
    debug!("removed {removed} bindings of {pawn:?} from {controller:?}");
    removed
}
