//! Gameplay tags used to key input actions and ability behaviours.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical, dot-separated gameplay tag such as `InputTag.Look.Mouse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameplayTag(Cow<'static, str>);

impl GameplayTag {
    /// Builds a tag from a string literal without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Builds a tag from an owned or borrowed name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the full tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag is non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns true when `self` equals `parent` or is nested beneath it.
    ///
    /// ```rust
    /// use possession::tags::GameplayTag;
    /// let look = GameplayTag::from_static("InputTag.Look.Mouse");
    /// assert!(look.matches(&GameplayTag::from_static("InputTag.Look")));
    /// assert!(!look.matches(&GameplayTag::from_static("InputTag.Lo")));
    /// ```
    #[must_use]
    pub fn matches(&self, parent: &Self) -> bool {
        match self.as_str().strip_prefix(parent.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for GameplayTag {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// Native movement input.
pub const INPUT_TAG_MOVE: GameplayTag = GameplayTag::from_static("InputTag.Move");
/// Mouse look input.
pub const INPUT_TAG_LOOK_MOUSE: GameplayTag = GameplayTag::from_static("InputTag.Look.Mouse");
/// Gamepad stick look input.
pub const INPUT_TAG_LOOK_STICK: GameplayTag = GameplayTag::from_static("InputTag.Look.Stick");
/// Crouch toggle input.
pub const INPUT_TAG_CROUCH: GameplayTag = GameplayTag::from_static("InputTag.Crouch");
/// Auto-run toggle input.
pub const INPUT_TAG_AUTO_RUN: GameplayTag = GameplayTag::from_static("InputTag.AutoRun");

/// Abilities carrying this tag are not cancelled when their avatar goes away.
pub const ABILITY_BEHAVIOR_SURVIVES_DEATH: GameplayTag =
    GameplayTag::from_static("Ability.Behavior.SurvivesDeath");
