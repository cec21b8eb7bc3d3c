//! Hero input binding, rebinding and unbinding on a local player's controller.

use std::sync::Arc;

use anyhow::Result;
use bevy::ecs::prelude::On;
use bevy::prelude::*;
use glam::Vec2;
use possession::hero::{self, dispatch_input};
use possession::input::{
    InputAction, InputActionValue, InputConfig, InputMappingContext, LocalPlayer, TaggedInputAction,
    TriggerEvent,
};
use possession::pawn_extension;
use possession::{
    begin_play, possess, unpossess, AbilitySystem, BindInputsNow, GameplayTag, NetRole, Pawn,
    PawnConfig,
};
use rstest::{fixture, rstest};
use test_utils::{
    binding_count, hero_input_config, hero_pawn_config, spawn_hero_pawn, spawn_player,
    world_with_registry, Player, PlayerKind,
};

/// Five native actions plus press and release for the jump ability.
const HERO_BINDINGS: usize = 7;

#[derive(Resource, Default)]
struct BindSignals(Vec<BindInputsNow>);

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_bind(event: On<BindInputsNow>, mut signals: ResMut<BindSignals>) {
    signals.0.push(*event.event());
}

struct Bound {
    world: World,
    player: Player,
    pawn: Entity,
}

#[fixture]
fn bound() -> Bound {
    let mut world = world_with_registry();
    world.init_resource::<BindSignals>();
    world.add_observer(record_bind);
    let player = spawn_player(&mut world, PlayerKind::Local);
    let pawn = spawn_hero_pawn(&mut world, NetRole::Authority);
    let config = hero_pawn_config();
    if let Some(mut system) = world.get_mut::<AbilitySystem>(player.player_state) {
        for set in &config.ability_sets {
            system.give_ability_set(set);
        }
    }
    begin_play(&mut world, pawn);
    pawn_extension::set_pawn_config(&mut world, pawn, config)
        .expect("authority accepts the config");
    possess(&mut world, player.controller, pawn);
    Bound {
        world,
        player,
        pawn,
    }
}

#[rstest]
fn binding_installs_mappings_and_actions(bound: Bound) -> Result<()> {
    let Bound {
        world,
        player,
        pawn,
    } = bound;
    assert!(hero::is_ready_to_bind_inputs(&world, pawn));
    assert_eq!(binding_count(&world, player.controller, pawn)?, HERO_BINDINGS);

    let local = world
        .get::<LocalPlayer>(player.controller)
        .expect("local player");
    let applied: Vec<&str> = local
        .input
        .mapping_contexts()
        .iter()
        .map(|m| m.context.0.as_str())
        .collect();
    // IMC_Debug is not flagged for settings, so it stays unapplied.
    assert_eq!(applied, vec!["IMC_Default"]);
    let registered = local
        .input
        .user_settings()
        .expect("settings enabled")
        .registered_contexts();
    assert_eq!(registered, [InputMappingContext::new("IMC_Default")]);
    assert_eq!(local.input.player_mapped_configs(), ["InputData_Hero".to_owned()]);

    let signals = &world.resource::<BindSignals>().0;
    assert_eq!(
        signals,
        &[BindInputsNow {
            controller: player.controller,
            pawn,
        }]
    );
    Ok(())
}

#[rstest]
fn rebinding_never_duplicates_actions(bound: Bound) -> Result<()> {
    let Bound {
        mut world,
        player,
        pawn,
    } = bound;
    hero::initialize_player_input(&mut world, pawn)?;
    assert_eq!(binding_count(&world, player.controller, pawn)?, HERO_BINDINGS);

    hero::reset_inputs(&mut world, pawn, player.controller, false);
    assert!(!hero::is_ready_to_bind_inputs(&world, pawn));
    hero::initialize_player_input(&mut world, pawn)?;
    assert_eq!(binding_count(&world, player.controller, pawn)?, HERO_BINDINGS);
    assert!(hero::is_ready_to_bind_inputs(&world, pawn));
    Ok(())
}

#[rstest]
#[case::gentle(false)]
#[case::forced(true)]
fn unpossession_leaves_no_bindings(bound: Bound, #[case] force: bool) -> Result<()> {
    let Bound {
        mut world,
        player,
        pawn,
    } = bound;
    unpossess(&mut world, player.controller, force);

    assert_eq!(binding_count(&world, player.controller, pawn)?, 0);
    assert!(!hero::is_ready_to_bind_inputs(&world, pawn));
    let p = world.get::<Pawn>(pawn).expect("pawn");
    assert!(p.controller.is_none());
    Ok(())
}

#[rstest]
fn repossession_binds_again_on_the_next_tick(bound: Bound) -> Result<()> {
    let Bound {
        mut world,
        player,
        pawn,
    } = bound;
    unpossess(&mut world, player.controller, false);
    possess(&mut world, player.controller, pawn);
    assert_eq!(binding_count(&world, player.controller, pawn)?, 0);

    possession::possession::run_deferred_rebinds(&mut world);
    assert_eq!(binding_count(&world, player.controller, pawn)?, HERO_BINDINGS);
    assert!(hero::is_ready_to_bind_inputs(&world, pawn));
    Ok(())
}

#[rstest]
fn ability_actions_reach_the_ability_system(bound: Bound) {
    let Bound {
        mut world,
        player,
        pawn,
    } = bound;
    let jump = InputAction::new("IA_Jump");
    let ran = dispatch_input(
        &mut world,
        player.controller,
        &jump,
        TriggerEvent::Triggered,
        InputActionValue::Bool(true),
    );
    assert_eq!(ran, 1);
    let pressed = world
        .get::<AbilitySystem>(player.player_state)
        .expect("ability system");
    assert_eq!(pressed.input_pressed().len(), 1);
    assert_eq!(pressed.input_held().len(), 1);

    dispatch_input(
        &mut world,
        player.controller,
        &jump,
        TriggerEvent::Completed,
        InputActionValue::Bool(false),
    );
    let released = world
        .get::<AbilitySystem>(player.player_state)
        .expect("ability system");
    assert_eq!(released.input_released().len(), 1);
    assert!(released.input_held().is_empty());

    let moved = dispatch_input(
        &mut world,
        player.controller,
        &InputAction::new("IA_Move"),
        TriggerEvent::Triggered,
        InputActionValue::Axis2D(Vec2::new(1.0, 0.0)),
    );
    assert_eq!(moved, 1);
    let p = world.get::<Pawn>(pawn).expect("pawn");
    assert!(p.pending_movement.length() > 0.0);
}

#[rstest]
fn additional_configs_only_add_ability_actions(bound: Bound) -> Result<()> {
    let Bound {
        mut world,
        player,
        pawn,
    } = bound;
    let extra = InputConfig {
        name: "InputData_Emotes".to_owned(),
        native_input_actions: vec![TaggedInputAction {
            input_action: InputAction::new("IA_Wave_Native"),
            input_tag: GameplayTag::from_static("InputTag.Move"),
        }],
        ability_input_actions: vec![TaggedInputAction {
            input_action: InputAction::new("IA_Wave"),
            input_tag: GameplayTag::from_static("InputTag.Emote.Wave"),
        }],
    };
    hero::add_additional_input_config(&mut world, pawn, &extra);
    assert_eq!(
        binding_count(&world, player.controller, pawn)?,
        HERO_BINDINGS + 2
    );

    hero::remove_additional_input_config(&mut world, pawn, &extra);
    assert_eq!(
        binding_count(&world, player.controller, pawn)?,
        HERO_BINDINGS + 2
    );

    unpossess(&mut world, player.controller, false);
    assert_eq!(binding_count(&world, player.controller, pawn)?, 0);
    Ok(())
}

#[rstest]
fn taking_a_pawn_from_another_controller_moves_its_bindings(bound: Bound) -> Result<()> {
    let Bound {
        mut world,
        player: first,
        pawn,
    } = bound;
    let second = spawn_player(&mut world, PlayerKind::Local);
    possess(&mut world, second.controller, pawn);

    assert_eq!(binding_count(&world, first.controller, pawn)?, 0);
    let released = world
        .get::<possession::Controller>(first.controller)
        .expect("controller");
    assert!(released.pawn.is_none());
    assert!(!hero::is_ready_to_bind_inputs(&world, pawn));

    possession::possession::run_deferred_rebinds(&mut world);
    assert_eq!(binding_count(&world, first.controller, pawn)?, 0);
    assert_eq!(binding_count(&world, second.controller, pawn)?, HERO_BINDINGS);
    assert!(hero::is_ready_to_bind_inputs(&world, pawn));

    unpossess(&mut world, second.controller, true);
    assert_eq!(binding_count(&world, first.controller, pawn)?, 0);
    assert_eq!(binding_count(&world, second.controller, pawn)?, 0);
    Ok(())
}

#[rstest]
fn missing_native_actions_are_skipped() -> Result<()> {
    let mut world = world_with_registry();
    let player = spawn_player(&mut world, PlayerKind::Local);
    let pawn = spawn_hero_pawn(&mut world, NetRole::Authority);
    let mut input = hero_input_config();
    input
        .native_input_actions
        .retain(|a| a.input_action == InputAction::new("IA_Move"));
    let config = PawnConfig {
        input_config: Some(input),
        ..(*hero_pawn_config()).clone()
    };
    begin_play(&mut world, pawn);
    pawn_extension::set_pawn_config(&mut world, pawn, Arc::new(config))?;
    possess(&mut world, player.controller, pawn);

    // Move plus press and release for the jump ability.
    assert_eq!(binding_count(&world, player.controller, pawn)?, 3);
    assert!(hero::is_ready_to_bind_inputs(&world, pawn));
    Ok(())
}
