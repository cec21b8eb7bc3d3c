//! Data assets mapping input actions to gameplay tags.

use std::fmt;

use log::error;
use serde::{Deserialize, Serialize};

use crate::tags::GameplayTag;

/// Name of an input action, e.g. `IA_Move`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputAction(pub String);

impl InputAction {
    /// Builds an action from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Whether the action refers to anything.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An input action paired with the tag that identifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedInputAction {
    /// The action to bind.
    pub input_action: InputAction,
    /// The tag handlers are keyed by.
    pub input_tag: GameplayTag,
}

/// Input actions a pawn binds, split into native and ability actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Display name.
    pub name: String,
    /// Actions bound to dedicated handlers (movement, look, ...).
    #[serde(default)]
    pub native_input_actions: Vec<TaggedInputAction>,
    /// Actions forwarded to the ability system by tag.
    #[serde(default)]
    pub ability_input_actions: Vec<TaggedInputAction>,
}

impl InputConfig {
    /// Native action bound to `tag`.
    #[must_use]
    pub fn find_native_input_action_for_tag(
        &self,
        tag: &GameplayTag,
        log_if_not_found: bool,
    ) -> Option<&InputAction> {
        Self::find(&self.native_input_actions, tag).or_else(|| {
            if log_if_not_found {
                error!(
                    "can't find native input action for tag [{tag}] on input config [{}]",
                    self.name
                );
            }
            None
        })
    }

    /// Ability action bound to `tag`.
    #[must_use]
    pub fn find_ability_input_action_for_tag(
        &self,
        tag: &GameplayTag,
        log_if_not_found: bool,
    ) -> Option<&InputAction> {
        Self::find(&self.ability_input_actions, tag).or_else(|| {
            if log_if_not_found {
                error!(
                    "can't find ability input action for tag [{tag}] on input config [{}]",
                    self.name
                );
            }
            None
        })
    }

    fn find<'a>(actions: &'a [TaggedInputAction], tag: &GameplayTag) -> Option<&'a InputAction> {
        actions
            .iter()
            .find(|a| a.input_action.is_valid() && &a.input_tag == tag)
            .map(|a| &a.input_action)
    }
}

/// Name of an input mapping context, e.g. `IMC_Default`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputMappingContext(pub String);

impl InputMappingContext {
    /// Builds a context from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// A mapping context the hero installs whenever it binds input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMappingContextAndPriority {
    /// The context.
    pub input_mapping: InputMappingContext,
    /// Higher priorities win key conflicts.
    #[serde(default)]
    pub priority: i32,
    /// Whether the player can remap this context through user settings.
    #[serde(default)]
    pub register_with_settings: bool,
}
