//! The local player's input subsystem and its persisted user settings.

use bevy::prelude::*;

use super::config::InputMappingContext;

/// Options applied when adding a mapping context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifyContextOptions {
    /// Ignore keys that were already down until they are released.
    pub ignore_all_pressed_keys_until_release: bool,
    /// Force an immediate rebuild of the key mappings.
    pub force_immediately: bool,
}

/// A mapping context currently applied to the subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMappingContext {
    /// The context.
    pub context: InputMappingContext,
    /// Its priority.
    pub priority: i32,
    /// Options used when adding it.
    pub options: ModifyContextOptions,
}

/// Player-remappable settings persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputUserSettings {
    registered: Vec<InputMappingContext>,
}

impl InputUserSettings {
    /// Registers `context` for remapping. Returns false if already known.
    pub fn register_input_mapping_context(&mut self, context: &InputMappingContext) -> bool {
        if self.registered.contains(context) {
            return false;
        }
        self.registered.push(context.clone());
        true
    }

    /// Contexts registered for remapping.
    #[must_use]
    pub fn registered_contexts(&self) -> &[InputMappingContext] {
        &self.registered
    }
}

/// Live key mapping state of one local player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancedInputSubsystem {
    mappings: Vec<AppliedMappingContext>,
    user_settings: Option<InputUserSettings>,
    player_mapped_configs: Vec<String>,
}

impl EnhancedInputSubsystem {
    /// A subsystem with user settings enabled.
    #[must_use]
    pub fn with_user_settings() -> Self {
        Self {
            user_settings: Some(InputUserSettings::default()),
            ..Self::default()
        }
    }

    /// Removes every applied mapping context.
    pub fn clear_all_mappings(&mut self) {
        self.mappings.clear();
        self.player_mapped_configs.clear();
    }

    /// Applies `context` at `priority`, replacing an earlier application of
    /// the same context.
    pub fn add_mapping_context(
        &mut self,
        context: &InputMappingContext,
        priority: i32,
        options: ModifyContextOptions,
    ) {
        self.mappings.retain(|m| &m.context != context);
        self.mappings.push(AppliedMappingContext {
            context: context.clone(),
            priority,
            options,
        });
    }

    /// Applied contexts, in the order they were added.
    #[must_use]
    pub fn mapping_contexts(&self) -> &[AppliedMappingContext] {
        &self.mappings
    }

    /// Persisted settings, when enabled.
    pub const fn user_settings_mut(&mut self) -> Option<&mut InputUserSettings> {
        self.user_settings.as_mut()
    }

    /// Persisted settings, when enabled.
    #[must_use]
    pub const fn user_settings(&self) -> Option<&InputUserSettings> {
        self.user_settings.as_ref()
    }

    /// Records that the player's own key mappings for `config` are applied.
    pub fn add_player_mapped_config(&mut self, config: &str) {
        if !self.player_mapped_configs.iter().any(|c| c == config) {
            self.player_mapped_configs.push(config.to_owned());
        }
    }

    /// Input configs whose player mappings are applied.
    #[must_use]
    pub fn player_mapped_configs(&self) -> &[String] {
        &self.player_mapped_configs
    }
}

/// Attached to a controller that belongs to a local human player.
#[derive(Component, Debug, Clone, Default)]
pub struct LocalPlayer {
    /// The player's input subsystem.
    pub input: EnhancedInputSubsystem,
}
