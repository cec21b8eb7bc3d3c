//! Demo binary: walks a local player's pawn through begin play, possession
//! and config assignment in a headless app, then logs where each feature
//! stopped.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bevy::prelude::*;
use clap::Parser;
use log::info;
use possession::input::{EnhancedInputSubsystem, InputComponent, LocalPlayer};
use possession::pawn_extension;
use possession::{
    init_logging, possess, AbilitySystem, CameraComponent, Character, Controller, FeatureRegistry,
    Hero, HeroSettings, Pawn, PawnConfig, PawnExtension, PendingBeginPlay, PlayerState,
    PossessionPlugin, HERO_FEATURE, PAWN_EXTENSION_FEATURE,
};

/// Walks a local player's pawn through initialization and possession
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Pawn config to apply (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ticks to run after possession
    #[arg(short, long, default_value_t = 3)]
    ticks: u32,
}

fn load_config(path: Option<&PathBuf>) -> Result<PawnConfig> {
    let Some(file) = path else {
        return Ok(PawnConfig {
            name: "HeroData_Default".to_owned(),
            ..PawnConfig::default()
        });
    };
    PawnConfig::from_json_file(file)
        .with_context(|| format!("loading pawn config from {}", file.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = Arc::new(load_config(args.config.as_ref())?);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(PossessionPlugin);
    app.finish();
    app.cleanup();

    let world = app.world_mut();
    let controller = world
        .spawn((
            Controller::local_player(),
            LocalPlayer {
                input: EnhancedInputSubsystem::with_user_settings(),
            },
            InputComponent::default(),
        ))
        .id();
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
    let pawn = world
        .spawn((
            Pawn::default(),
            PawnExtension::default(),
            Hero::new(HeroSettings::default()),
            CameraComponent::default(),
            Character::default(),
            PendingBeginPlay,
        ))
        .id();

    app.update();
    possess(app.world_mut(), controller, pawn);
    pawn_extension::set_pawn_config(app.world_mut(), pawn, config)?;
    for _ in 0..args.ticks {
        app.update();
    }

    let registry = app.world().resource::<FeatureRegistry>();
    info!(
        "{PAWN_EXTENSION_FEATURE}: {:?}, {HERO_FEATURE}: {:?}",
        registry.init_state(pawn, PAWN_EXTENSION_FEATURE),
        registry.init_state(pawn, HERO_FEATURE)
    );
    Ok(())
}
