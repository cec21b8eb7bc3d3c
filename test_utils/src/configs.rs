//! Pawn and hero configs used across tests.

use std::sync::Arc;

use possession::ability_system::{AbilityDefinition, AbilitySet, TagRelationshipMapping};
use possession::input::{
    InputAction, InputConfig, InputMappingContext, InputMappingContextAndPriority,
    TaggedInputAction,
};
use possession::tags::{
    ABILITY_BEHAVIOR_SURVIVES_DEATH, INPUT_TAG_AUTO_RUN, INPUT_TAG_CROUCH, INPUT_TAG_LOOK_MOUSE,
    INPUT_TAG_LOOK_STICK, INPUT_TAG_MOVE,
};
use possession::{CameraMode, GameplayTag, HeroSettings, PawnConfig};

fn tagged(action: &str, tag: GameplayTag) -> TaggedInputAction {
    TaggedInputAction {
        input_action: InputAction::new(action),
        input_tag: tag,
    }
}

/// Input config with every native action and a jump ability action.
#[must_use]
pub fn hero_input_config() -> InputConfig {
    InputConfig {
        name: "InputData_Hero".to_owned(),
        native_input_actions: vec![
            tagged("IA_Move", INPUT_TAG_MOVE),
            tagged("IA_Look_Mouse", INPUT_TAG_LOOK_MOUSE),
            tagged("IA_Look_Stick", INPUT_TAG_LOOK_STICK),
            tagged("IA_Crouch", INPUT_TAG_CROUCH),
            tagged("IA_AutoRun", INPUT_TAG_AUTO_RUN),
        ],
        ability_input_actions: vec![tagged(
            "IA_Jump",
            GameplayTag::from_static("InputTag.Jump"),
        )],
    }
}

/// A complete hero pawn config.
#[must_use]
pub fn hero_pawn_config() -> Arc<PawnConfig> {
    Arc::new(PawnConfig {
        name: "HeroData_Test".to_owned(),
        ability_sets: vec![AbilitySet {
            name: "AbilitySet_Hero".to_owned(),
            abilities: vec![
                AbilityDefinition {
                    name: "GA_Jump".to_owned(),
                    tags: Vec::new(),
                    input_tag: Some(GameplayTag::from_static("InputTag.Jump")),
                },
                AbilityDefinition {
                    name: "GA_Respawn".to_owned(),
                    tags: vec![ABILITY_BEHAVIOR_SURVIVES_DEATH],
                    input_tag: None,
                },
            ],
        }],
        input_config: Some(hero_input_config()),
        default_camera_mode: Some(CameraMode::new("CM_ThirdPerson")),
        tag_relationship_mapping: Some(TagRelationshipMapping {
            name: "TagRelationships_Test".to_owned(),
            relationships: Vec::new(),
        }),
    })
}

/// Hero settings with one remappable and one fixed mapping context.
#[must_use]
pub fn hero_settings() -> HeroSettings {
    HeroSettings {
        default_input_mappings: vec![
            InputMappingContextAndPriority {
                input_mapping: InputMappingContext::new("IMC_Default"),
                priority: 0,
                register_with_settings: true,
            },
            InputMappingContextAndPriority {
                input_mapping: InputMappingContext::new("IMC_Debug"),
                priority: 10,
                register_with_settings: false,
            },
        ],
    }
}
