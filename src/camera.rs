//! Camera component whose mode is resolved by a delegate feature.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::hero;

/// Name of a camera mode, e.g. `CM_ThirdPerson`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraMode(pub String);

impl CameraMode {
    /// Builds a mode from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for CameraMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Camera attached to a pawn.
#[derive(Component, Debug, Clone, Default)]
pub struct CameraComponent {
    mode_resolver: Option<Entity>,
}

impl CameraComponent {
    /// Makes the hero on `pawn` responsible for choosing camera modes.
    pub const fn bind_mode_resolver(&mut self, pawn: Entity) {
        self.mode_resolver = Some(pawn);
    }

    /// Pawn whose hero resolves camera modes.
    #[must_use]
    pub const fn mode_resolver(&self) -> Option<Entity> {
        self.mode_resolver
    }
}

/// Camera mode the camera on `pawn` should use right now.
#[must_use]
pub fn current_camera_mode(world: &World, pawn: Entity) -> Option<CameraMode> {
    let resolver = world.get::<CameraComponent>(pawn)?.mode_resolver()?;
    hero::determine_camera_mode(world, resolver)
}
