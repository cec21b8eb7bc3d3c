//! Bevy plugin wiring the registry, begin play and deferred rebinds into the
//! schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{debug, error};
use thiserror::Error;

use crate::init_state::InitStateChanged;
use crate::lifecycle::begin_play_pending_hosts;
use crate::possession::{run_deferred_rebinds, DeferredRebinds};
use crate::registry::FeatureRegistry;

/// Context carried by [`PossessionSyncError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PossessionSyncErrorContext {
    /// Failure surfaced while a pawn began play.
    BeginPlay,
    /// Failure surfaced while a deferred rebind fired.
    Rebind,
}

/// Event raised when a scheduled system hits an error path.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct PossessionSyncError {
    /// Where the failure occurred.
    pub context: PossessionSyncErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl PossessionSyncError {
    /// Convenience constructor used by systems to emit error events.
    pub fn new(context: PossessionSyncErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_possession_error(event: On<PossessionSyncError>) {
    let PossessionSyncError { context, detail } = event.event();
    error!("possession error during {context:?}: {detail}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_init_state_change(event: On<InitStateChanged>) {
    let InitStateChanged {
        host,
        feature,
        state,
    } = event.event();
    debug!("{feature} on {host:?} reached {state}");
}

/// Bevy plugin installing the init-state registry and possession systems.
#[derive(Default)]
pub struct PossessionPlugin;

impl Plugin for PossessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_possession_error);
        app.add_observer(log_init_state_change);

        app.init_resource::<FeatureRegistry>();
        app.init_resource::<DeferredRebinds>();
        app.add_systems(
            PreUpdate,
            (begin_play_pending_hosts, run_deferred_rebinds).chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn plugin_initialises_resources() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(PossessionPlugin);
        assert!(app.world().contains_resource::<FeatureRegistry>());
        assert!(app.world().contains_resource::<DeferredRebinds>());
        app.update();
        assert_eq!(app.world().resource::<DeferredRebinds>().tick(), 1);
    }
}
