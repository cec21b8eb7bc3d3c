//! Tuning constants for input handling and possession.

/// Stick look speeds in degrees per second.
///
/// Stick deflection is scaled by these and the frame delta before it is
/// added to the control rotation.
pub const LOOK_YAW_RATE: f32 = 300.0;
/// Pitch counterpart of [`LOOK_YAW_RATE`].
pub const LOOK_PITCH_RATE: f32 = 165.0;

/// Ticks a possession waits before rebinding input.
pub const DEFERRED_REBIND_DELAY_TICKS: u64 = 1;
