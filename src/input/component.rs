//! Controller-side table of input bindings.

use bevy::prelude::*;
use glam::Vec2;

use super::config::{InputAction, InputConfig};
use super::subsystem::EnhancedInputSubsystem;
use crate::tags::GameplayTag;

/// Phase of an input action a binding reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// The action began.
    Started,
    /// The action fired (every frame while held for continuous actions).
    Triggered,
    /// The action ended.
    Completed,
}

/// Value carried by an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputActionValue {
    /// Digital button.
    Bool(bool),
    /// Single axis.
    Axis1D(f32),
    /// Two axes, e.g. a stick.
    Axis2D(Vec2),
}

impl InputActionValue {
    /// The value as two axes; buttons map to `x`.
    #[must_use]
    pub const fn as_axis2d(self) -> Vec2 {
        match self {
            Self::Bool(pressed) => Vec2::new(if pressed { 1.0 } else { 0.0 }, 0.0),
            Self::Axis1D(x) => Vec2::new(x, 0.0),
            Self::Axis2D(v) => v,
        }
    }
}

/// Dedicated handlers for non-ability actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeInput {
    /// Planar movement.
    Move,
    /// Mouse look.
    LookMouse,
    /// Gamepad stick look.
    LookStick,
    /// Crouch toggle.
    Crouch,
    /// Auto-run toggle.
    AutoRun,
}

/// What a binding does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputHandler {
    /// Forward a press of the tag to the ability system.
    AbilityPressed(GameplayTag),
    /// Forward a release of the tag to the ability system.
    AbilityReleased(GameplayTag),
    /// Run a native handler.
    Native(NativeInput),
}

/// Handle returned by [`InputComponent::bind_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingHandle(pub u32);

/// One bound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    /// Removal handle.
    pub handle: BindingHandle,
    /// Action listened to.
    pub action: InputAction,
    /// Phase listened to.
    pub trigger: TriggerEvent,
    /// Pawn whose handlers run.
    pub owner: Entity,
    /// Handler to run.
    pub handler: InputHandler,
}

/// Input bindings of a controller.
#[derive(Component, Debug, Clone, Default)]
pub struct InputComponent {
    bindings: Vec<InputBinding>,
    next_handle: u32,
}

impl InputComponent {
    /// Adds a binding and returns its handle.
    pub fn bind_action(
        &mut self,
        action: &InputAction,
        trigger: TriggerEvent,
        owner: Entity,
        handler: InputHandler,
    ) -> BindingHandle {
        self.next_handle += 1;
        let handle = BindingHandle(self.next_handle);
        self.bindings.push(InputBinding {
            handle,
            action: action.clone(),
            trigger,
            owner,
            handler,
        });
        handle
    }

    /// Removes one binding. Returns whether it existed.
    pub fn remove_binding_by_handle(&mut self, handle: BindingHandle) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.handle != handle);
        before != self.bindings.len()
    }

    /// Removes every binding in `handles` and empties the list.
    pub fn remove_binds(&mut self, handles: &mut Vec<BindingHandle>) {
        for handle in handles.drain(..) {
            self.remove_binding_by_handle(handle);
        }
    }

    /// Removes every binding owned by `owner`. Returns how many went.
    pub fn remove_bindings_for_owner(&mut self, owner: Entity) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.owner != owner);
        before - self.bindings.len()
    }

    /// All bindings.
    #[must_use]
    pub fn bindings(&self) -> &[InputBinding] {
        &self.bindings
    }

    /// How many bindings `owner` has.
    #[must_use]
    pub fn binding_count_for(&self, owner: Entity) -> usize {
        self.bindings.iter().filter(|b| b.owner == owner).count()
    }

    /// Owners and handlers of bindings that react to `action` in `trigger`.
    #[must_use]
    pub fn matching(&self, action: &InputAction, trigger: TriggerEvent) -> Vec<(Entity, InputHandler)> {
        self.bindings
            .iter()
            .filter(|b| &b.action == action && b.trigger == trigger)
            .map(|b| (b.owner, b.handler.clone()))
            .collect()
    }

    /// Applies the player's own key mappings for `config`.
    pub fn add_input_mappings(&self, config: &InputConfig, subsystem: &mut EnhancedInputSubsystem) {
        subsystem.add_player_mapped_config(&config.name);
    }

    /// Binds `native` to the action tagged `tag` in `config`, if present.
    pub fn bind_native_action(
        &mut self,
        config: &InputConfig,
        tag: &GameplayTag,
        trigger: TriggerEvent,
        owner: Entity,
        native: NativeInput,
        log_if_not_found: bool,
    ) -> Option<BindingHandle> {
        let action = config
            .find_native_input_action_for_tag(tag, log_if_not_found)?
            .clone();
        Some(self.bind_action(&action, trigger, owner, InputHandler::Native(native)))
    }

    /// Binds every ability action of `config`: presses on
    /// [`TriggerEvent::Triggered`], releases on [`TriggerEvent::Completed`].
    pub fn bind_ability_actions(&mut self, config: &InputConfig, owner: Entity) -> Vec<BindingHandle> {
        let mut handles = Vec::new();
        for action in &config.ability_input_actions {
            if !action.input_action.is_valid() || !action.input_tag.is_valid() {
                continue;
            }
            handles.push(self.bind_action(
                &action.input_action,
                TriggerEvent::Triggered,
                owner,
                InputHandler::AbilityPressed(action.input_tag.clone()),
            ));
            handles.push(self.bind_action(
                &action.input_action,
                TriggerEvent::Completed,
                owner,
                InputHandler::AbilityReleased(action.input_tag.clone()),
            ));
        }
        handles
    }
}
