//! Pawn configuration assets and their loading.
//!
//! A [`PawnConfig`] is immutable once assigned to a pawn and is shared
//! between pawns through an [`Arc`](std::sync::Arc).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ability_system::{AbilitySet, TagRelationshipMapping};
use crate::camera::CameraMode;
use crate::input::InputConfig;

/// Everything a pawn needs to become playable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PawnConfig {
    /// Display name.
    pub name: String,
    /// Ability sets granted to the pawn's ability system.
    #[serde(default)]
    pub ability_sets: Vec<AbilitySet>,
    /// Input actions the hero binds.
    #[serde(default)]
    pub input_config: Option<InputConfig>,
    /// Camera mode used when no ability overrides it.
    #[serde(default)]
    pub default_camera_mode: Option<CameraMode>,
    /// Blocking and cancelling rules between ability tags.
    #[serde(default)]
    pub tag_relationship_mapping: Option<TagRelationshipMapping>,
}

/// Failures while loading a [`PawnConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read pawn config {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The contents were not a valid config.
    #[error("invalid pawn config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PawnConfig {
    /// Parses a config from JSON text.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed input.
    ///
    /// ```rust
    /// use possession::PawnConfig;
    /// let config = PawnConfig::from_json_str(r#"{ "name": "HeroData" }"#)
    ///     .expect("config should parse");
    /// assert_eq!(config.name, "HeroData");
    /// assert!(config.input_config.is_none());
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] for malformed contents.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::INPUT_TAG_MOVE;
    use rstest::rstest;

    const HERO_JSON: &str = r#"{
        "name": "HeroData_Possessable",
        "ability_sets": [
            { "name": "AbilitySet_Hero", "abilities": [
                { "name": "GA_Jump", "input_tag": "InputTag.Jump" }
            ] }
        ],
        "input_config": {
            "name": "InputData_Hero",
            "native_input_actions": [
                { "input_action": "IA_Move", "input_tag": "InputTag.Move" }
            ]
        },
        "default_camera_mode": "CM_ThirdPerson",
        "tag_relationship_mapping": { "name": "TagRelationships_Default" }
    }"#;

    #[rstest]
    fn full_config_parses() {
        let config = PawnConfig::from_json_str(HERO_JSON).expect("config should parse");
        assert_eq!(config.ability_sets.len(), 1);
        assert_eq!(
            config.default_camera_mode,
            Some(CameraMode::new("CM_ThirdPerson"))
        );
        let input = config.input_config.expect("input config present");
        assert_eq!(
            input.native_input_actions.first().map(|a| &a.input_tag),
            Some(&INPUT_TAG_MOVE)
        );
        assert!(config.tag_relationship_mapping.is_some());
    }

    #[rstest]
    fn malformed_config_reports_parse_error() {
        let err = PawnConfig::from_json_str("{ \"name\": 3 }").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[rstest]
    fn missing_file_reports_its_path() {
        let err = PawnConfig::from_json_file("does/not/exist.json").expect_err("should fail");
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
