//! Fixtures shared by the integration tests: pawn configs, worlds with
//! players and pawns ready to possess, and `anyhow`-based assertions.

pub mod assertions;
pub mod configs;
pub mod hosts;

pub use assertions::{binding_count, ensure_init_state, init_state};
pub use configs::{hero_input_config, hero_pawn_config, hero_settings};
pub use hosts::{spawn_hero_pawn, spawn_player, world_with_registry, Player, PlayerKind};
