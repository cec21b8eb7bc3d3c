#![cfg_attr(docsrs, feature(doc_cfg))]
//! Pawn initialization-state coordination and possession for Bevy.
//!
//! Features on a pawn register with a [`FeatureRegistry`] and step through
//! [`InitState`]s as their preconditions are met. The [`pawn_extension`]
//! feature owns the pawn config and ability system binding; the [`hero`]
//! feature binds player input and camera once the pawn is ready.
pub mod ability_system;
pub mod camera;
pub mod components;
pub mod constants;
pub mod hero;
pub mod init_state;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod pawn_data;
pub mod pawn_extension;
pub mod plugin;
pub mod possession;
pub mod registry;
pub mod tags;
pub use constants::*;

// Re-export commonly used items
pub use ability_system::{AbilitySet, AbilitySpecHandle, AbilitySystem};
pub use camera::{current_camera_mode, CameraComponent, CameraMode};
pub use components::{Character, Controller, NetRole, Pawn, PlayerState};
pub use hero::{BindInputsNow, Hero, HeroSettings, HERO_FEATURE};
pub use init_state::{FeatureName, InitState, InitStateChanged};
pub use lifecycle::{begin_play, end_play, PendingBeginPlay};
pub use logging::init as init_logging;
pub use pawn_data::{ConfigError, PawnConfig};
pub use pawn_extension::{PawnConfigError, PawnExtension, PAWN_EXTENSION_FEATURE};
pub use plugin::{PossessionPlugin, PossessionSyncError, PossessionSyncErrorContext};
pub use possession::{possess, unpossess, DeferredRebinds, PossessionCharacter};
pub use registry::{FeatureRegistry, InitStateFeature, RegistryError};
pub use tags::GameplayTag;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use possession::prelude::*;
    //! ```

    pub use crate::components::{Controller, Pawn, PlayerState};
    pub use crate::hero::Hero;
    pub use crate::init_state::InitState;
    pub use crate::pawn_data::PawnConfig;
    pub use crate::pawn_extension::PawnExtension;
    pub use crate::plugin::PossessionPlugin;
    pub use crate::registry::FeatureRegistry;
    pub use crate::PendingBeginPlay;
}
