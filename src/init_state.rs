//! The shared initialization chain every pawn feature walks through.

use std::fmt;

use bevy::prelude::*;

/// Ordered stages of the initialization chain.
///
/// A feature starts outside the chain (`None`) and may only ever move to the
/// stage directly after its current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InitState {
    /// The owning host exists.
    Spawned,
    /// All data the feature needs is present, but not yet applied.
    DataAvailable,
    /// Data has been applied; dependent features may rely on it.
    DataInitialized,
    /// Ready for gameplay.
    GameplayReady,
}

/// The chain in progression order.
pub const INIT_STATE_CHAIN: [InitState; 4] = [
    InitState::Spawned,
    InitState::DataAvailable,
    InitState::DataInitialized,
    InitState::GameplayReady,
];

impl InitState {
    /// Returns the stage that follows `current`, or `None` at the end of the
    /// chain. A feature that has not spawned yet moves to [`InitState::Spawned`].
    ///
    /// ```rust
    /// use possession::InitState;
    /// assert_eq!(InitState::after(None), Some(InitState::Spawned));
    /// assert_eq!(InitState::after(Some(InitState::GameplayReady)), None);
    /// ```
    #[must_use]
    pub const fn after(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Spawned),
            Some(Self::Spawned) => Some(Self::DataAvailable),
            Some(Self::DataAvailable) => Some(Self::DataInitialized),
            Some(Self::DataInitialized) => Some(Self::GameplayReady),
            Some(Self::GameplayReady) => None,
        }
    }

    /// Whether `desired` is the single permitted step from `current`.
    #[must_use]
    pub fn is_next_after(desired: Self, current: Option<Self>) -> bool {
        Self::after(current) == Some(desired)
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Spawned => "InitState.Spawned",
            Self::DataAvailable => "InitState.DataAvailable",
            Self::DataInitialized => "InitState.DataInitialized",
            Self::GameplayReady => "InitState.GameplayReady",
        };
        f.write_str(name)
    }
}

/// Stable identifier of a feature participating in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureName(pub &'static str);

impl FeatureName {
    /// Returns the raw name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Raised whenever a feature on a host commits a transition.
///
/// Sibling features receive it through
/// [`InitStateFeature::on_actor_init_state_changed`](crate::registry::InitStateFeature::on_actor_init_state_changed);
/// it is also triggered on the [`World`] for observers.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStateChanged {
    /// Host the feature belongs to.
    pub host: Entity,
    /// Feature that transitioned.
    pub feature: FeatureName,
    /// State it reached.
    pub state: InitState,
}
