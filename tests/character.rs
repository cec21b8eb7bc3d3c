//! Characters with their own ability system, config files and end of play.

use std::sync::Arc;

use anyhow::Result;
use bevy::prelude::*;
use possession::pawn_extension;
use possession::possession::PossessionCharacter;
use possession::{
    begin_play, end_play, possess, AbilitySystem, DeferredRebinds, FeatureRegistry, NetRole, Pawn,
    PawnConfig, HERO_FEATURE, PAWN_EXTENSION_FEATURE,
};
use rstest::{fixture, rstest};
use test_utils::{
    hero_pawn_config, spawn_hero_pawn, spawn_player, world_with_registry, PlayerKind,
};

const HERO_DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/hero_pawn.json");

#[fixture]
fn shipped_config() -> Arc<PawnConfig> {
    Arc::new(PawnConfig::from_json_file(HERO_DATA).expect("shipped config loads"))
}

#[rstest]
fn shipped_config_describes_a_playable_hero(shipped_config: Arc<PawnConfig>) {
    assert_eq!(shipped_config.name, "HeroData_Possessable");
    let input = shipped_config
        .input_config
        .as_ref()
        .expect("input config present");
    assert_eq!(input.native_input_actions.len(), 5);
    assert_eq!(input.ability_input_actions.len(), 1);
    assert!(shipped_config.default_camera_mode.is_some());
}

#[rstest]
fn missing_config_file_is_an_io_error() {
    let err = PawnConfig::from_json_file("does/not/exist.json").expect_err("no such file");
    assert!(matches!(err, possession::ConfigError::Io { .. }));
}

#[rstest]
fn character_seeds_its_default_config_and_grants_abilities(
    shipped_config: Arc<PawnConfig>,
) {
    let mut world = world_with_registry();
    let pawn = spawn_hero_pawn(&mut world, NetRole::Authority);
    world.entity_mut(pawn).insert((
        AbilitySystem::default(),
        PossessionCharacter {
            default_pawn_config: Some(Arc::clone(&shipped_config)),
        },
    ));
    begin_play(&mut world, pawn);

    let applied = pawn_extension::pawn_config(&world, pawn).expect("default config applied");
    assert!(Arc::ptr_eq(&applied, &shipped_config));
    let system = world.get::<AbilitySystem>(pawn).expect("ability system");
    let granted: Vec<&str> = system
        .granted_abilities()
        .iter()
        .map(|g| g.definition.name.as_str())
        .collect();
    assert_eq!(granted, vec!["GA_Jump", "GA_Respawn"]);
    let p = world.get::<Pawn>(pawn).expect("pawn");
    assert!(p.forced_net_updates >= 2);
}

#[rstest]
fn explicit_config_wins_over_the_default(shipped_config: Arc<PawnConfig>) -> Result<()> {
    let mut world = world_with_registry();
    let pawn = spawn_hero_pawn(&mut world, NetRole::Authority);
    world.entity_mut(pawn).insert((
        AbilitySystem::default(),
        PossessionCharacter {
            default_pawn_config: Some(shipped_config),
        },
    ));
    let explicit = hero_pawn_config();
    pawn_extension::set_pawn_config(&mut world, pawn, Arc::clone(&explicit))?;
    begin_play(&mut world, pawn);

    let applied = pawn_extension::pawn_config(&world, pawn).expect("config kept");
    assert!(Arc::ptr_eq(&applied, &explicit));
    Ok(())
}

#[rstest]
fn end_play_releases_the_ability_system_and_registry() -> Result<()> {
    let mut world = world_with_registry();
    let player = spawn_player(&mut world, PlayerKind::Local);
    let pawn = spawn_hero_pawn(&mut world, NetRole::Authority);
    begin_play(&mut world, pawn);
    possess(&mut world, player.controller, pawn);
    pawn_extension::set_pawn_config(&mut world, pawn, hero_pawn_config())?;
    assert_eq!(
        pawn_extension::ability_system_of(&world, pawn),
        Some(player.player_state)
    );

    end_play(&mut world, pawn);

    let registry = world.resource::<FeatureRegistry>();
    assert!(!registry.is_registered(pawn, PAWN_EXTENSION_FEATURE));
    assert!(!registry.is_registered(pawn, HERO_FEATURE));
    assert!(world.resource::<DeferredRebinds>().pending(pawn).is_none());
    assert_eq!(pawn_extension::ability_system_of(&world, pawn), None);
    let system = world
        .get::<AbilitySystem>(player.player_state)
        .expect("ability system");
    assert_eq!(system.avatar_actor(), None);
    Ok(())
}
