//! Records `PossessionSyncError` events raised while a test app runs.
use bevy::ecs::prelude::On;
use bevy::prelude::*;
use possession::PossessionSyncError;

/// Captured `(context, detail)` pairs, in the order they were raised.
#[derive(Resource, Default, Debug)]
pub struct CapturedErrors(pub Vec<(String, String)>);

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_error(event: On<PossessionSyncError>, mut errors: ResMut<CapturedErrors>) {
    let err = event.event();
    errors
        .0
        .push((format!("{:?}", err.context), err.detail.clone()));
}

/// Installs the capturing observer and its resource on `app`.
pub fn install_error_observer(app: &mut App) {
    app.insert_resource(CapturedErrors::default());
    app.world_mut().add_observer(record_error);
}
