//! Handlers the hero's input bindings run.

use bevy::prelude::*;
use glam::{Quat, Vec3};
use log::debug;

use crate::ability_system::AbilitySystem;
use crate::components::{controller_of, Character, Controller, Pawn};
use crate::constants::{LOOK_PITCH_RATE, LOOK_YAW_RATE};
use crate::input::{InputAction, InputActionValue, InputComponent, InputHandler, NativeInput, TriggerEvent};
use crate::pawn_extension;
use crate::tags::GameplayTag;

/// Routes one input event on `controller` through every matching binding.
/// Returns how many handlers ran.
pub fn dispatch_input(
    world: &mut World,
    controller: Entity,
    action: &InputAction,
    trigger: TriggerEvent,
    value: InputActionValue,
) -> usize {
    let Some(input) = world.get::<InputComponent>(controller) else {
        return 0;
    };
    let matching = input.matching(action, trigger);
    for (pawn, handler) in &matching {
        match handler {
            InputHandler::AbilityPressed(tag) => input_ability_tag_pressed(world, *pawn, tag),
            InputHandler::AbilityReleased(tag) => input_ability_tag_released(world, *pawn, tag),
            InputHandler::Native(native) => run_native(world, *pawn, *native, value),
        }
    }
    matching.len()
}

fn run_native(world: &mut World, pawn: Entity, native: NativeInput, value: InputActionValue) {
    match native {
        NativeInput::Move => input_move(world, pawn, value),
        NativeInput::LookMouse => input_look_mouse(world, pawn, value),
        NativeInput::LookStick => input_look_stick(world, pawn, value),
        NativeInput::Crouch => input_crouch(world, pawn),
        NativeInput::AutoRun => input_auto_run(world, pawn),
    }
}

fn bound_ability_system(world: &mut World, pawn: Entity) -> Option<Mut<'_, AbilitySystem>> {
    let ability_system = pawn_extension::ability_system_of(world, pawn)?;
    world.get_mut::<AbilitySystem>(ability_system)
}

/// Forwards a press of `tag` to the ability system bound to `pawn`.
pub fn input_ability_tag_pressed(world: &mut World, pawn: Entity, tag: &GameplayTag) {
    if let Some(mut asc) = bound_ability_system(world, pawn) {
        asc.ability_input_tag_pressed(tag);
    } else {
        debug!("{pawn:?} has no ability system for {tag}");
    }
}

/// Forwards a release of `tag` to the ability system bound to `pawn`.
pub fn input_ability_tag_released(world: &mut World, pawn: Entity, tag: &GameplayTag) {
    if let Some(mut asc) = bound_ability_system(world, pawn) {
        asc.ability_input_tag_released(tag);
    }
}

/// Adds movement relative to the controller's yaw and stops auto-running.
pub fn input_move(world: &mut World, pawn: Entity, value: InputActionValue) {
    let Some(controller) = controller_of(world, pawn) else {
        return;
    };
    let Some(mut c) = world.get_mut::<Controller>(controller) else {
        return;
    };
    c.auto_running = false;
    let yaw = Quat::from_rotation_z(c.control_yaw.to_radians());
    let axes = value.as_axis2d();
    let Some(mut p) = world.get_mut::<Pawn>(pawn) else {
        return;
    };
    if axes.x != 0.0 {
        p.pending_movement += yaw * Vec3::Y * axes.x;
    }
    if axes.y != 0.0 {
        p.pending_movement += yaw * Vec3::X * axes.y;
    }
}

/// Adds mouse look as yaw (x) and pitch (y) input.
pub fn input_look_mouse(world: &mut World, pawn: Entity, value: InputActionValue) {
    let axes = value.as_axis2d();
    add_rotation_input(world, pawn, axes.x, axes.y);
}

/// Adds stick look scaled by the look rates and the frame delta.
pub fn input_look_stick(world: &mut World, pawn: Entity, value: InputActionValue) {
    let delta = world
        .get_resource::<Time>()
        .map_or(0.0, |time| time.delta_secs());
    let axes = value.as_axis2d();
    add_rotation_input(
        world,
        pawn,
        axes.x * LOOK_YAW_RATE * delta,
        axes.y * LOOK_PITCH_RATE * delta,
    );
}

fn add_rotation_input(world: &mut World, pawn: Entity, yaw: f32, pitch: f32) {
    let Some(controller) = controller_of(world, pawn) else {
        return;
    };
    if let Some(mut c) = world.get_mut::<Controller>(controller) {
        if yaw != 0.0 {
            c.rotation_input.x += yaw;
        }
        if pitch != 0.0 {
            c.rotation_input.y += pitch;
        }
    }
}

/// Toggles crouch on characters.
pub fn input_crouch(world: &mut World, pawn: Entity) {
    if let Some(mut character) = world.get_mut::<Character>(pawn) {
        character.toggle_crouch();
    }
}

/// Toggles auto-run on the possessing controller.
pub fn input_auto_run(world: &mut World, pawn: Entity) {
    let Some(controller) = controller_of(world, pawn) else {
        return;
    };
    if let Some(mut c) = world.get_mut::<Controller>(controller) {
        c.auto_running = !c.auto_running;
    }
}
