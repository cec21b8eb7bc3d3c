//! ECS components standing in for the actors the features run on.
//! Pawns, controllers, player states and characters carry only what the
//! initialization chain and the input handlers read or write.
use bevy::prelude::*;
use glam::{Vec2, Vec3};

/// How much say the local copy of an actor has over its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetRole {
    /// The simulation side that owns the actor.
    #[default]
    Authority,
    /// A client copy driven by the local player.
    AutonomousProxy,
    /// A client copy that only mirrors replicated state.
    SimulatedProxy,
}

/// A controllable actor hosting initialization features.
#[derive(Component, Debug, Clone, Default)]
pub struct Pawn {
    /// Local network role.
    pub role: NetRole,
    /// Controller currently possessing the pawn.
    pub controller: Option<Entity>,
    /// Player state of the possessing controller, as replicated to the pawn.
    pub player_state: Option<Entity>,
    /// Movement requested by input since the last consume.
    pub pending_movement: Vec3,
    /// Count of forced network updates requested for this pawn.
    pub forced_net_updates: u32,
}

impl Pawn {
    /// A pawn with the given role and nothing attached.
    #[must_use]
    pub fn with_role(role: NetRole) -> Self {
        Self {
            role,
            ..Self::default()
        }
    }

    /// Whether this copy is authoritative.
    #[must_use]
    pub fn has_authority(&self) -> bool {
        self.role == NetRole::Authority
    }

    /// Asks replication to send this pawn's state as soon as possible.
    pub const fn force_net_update(&mut self) {
        self.forced_net_updates += 1;
    }

    /// Returns and clears the accumulated movement input.
    pub fn consume_movement_input(&mut self) -> Vec3 {
        std::mem::take(&mut self.pending_movement)
    }
}

/// Something that possesses pawns: a player or an AI.
#[derive(Component, Debug, Clone, Default)]
pub struct Controller {
    /// Possessed pawn.
    pub pawn: Option<Entity>,
    /// Player state owned by this controller.
    pub player_state: Option<Entity>,
    /// Whether this controller runs on this machine.
    pub is_local: bool,
    /// Whether this controller is an AI.
    pub is_bot: bool,
    /// Auto-run toggle state.
    pub auto_running: bool,
    /// Control rotation yaw in degrees.
    pub control_yaw: f32,
    /// Yaw (x) and pitch (y) input accumulated since the last consume.
    pub rotation_input: Vec2,
}

impl Controller {
    /// A local human player controller.
    #[must_use]
    pub fn local_player() -> Self {
        Self {
            is_local: true,
            ..Self::default()
        }
    }

    /// A local AI controller.
    #[must_use]
    pub fn bot() -> Self {
        Self {
            is_local: true,
            is_bot: true,
            ..Self::default()
        }
    }

    /// A controller belonging to another machine.
    #[must_use]
    pub fn remote() -> Self {
        Self::default()
    }

    /// Returns and clears the accumulated look input.
    pub fn consume_rotation_input(&mut self) -> Vec2 {
        std::mem::take(&mut self.rotation_input)
    }
}

/// Per-player data that survives pawn death; carries the ability system.
#[derive(Component, Debug, Clone, Default)]
pub struct PlayerState {
    /// Controller owning this player state.
    pub owner: Option<Entity>,
}

/// Marks a pawn as a character that can crouch.
#[derive(Component, Debug, Clone, Default)]
pub struct Character {
    /// Whether the character is currently crouched.
    pub crouched: bool,
}

impl Character {
    /// Flips the crouch state.
    pub const fn toggle_crouch(&mut self) {
        self.crouched = !self.crouched;
    }
}

/// Controller possessing `pawn`, if any.
#[must_use]
pub fn controller_of(world: &World, pawn: Entity) -> Option<Entity> {
    world.get::<Pawn>(pawn).and_then(|p| p.controller)
}

/// Player state attached to `pawn`, if any.
#[must_use]
pub fn player_state_of(world: &World, pawn: Entity) -> Option<Entity> {
    world
        .get::<Pawn>(pawn)
        .and_then(|p| p.player_state)
        .filter(|ps| world.get::<PlayerState>(*ps).is_some())
}

/// Whether `pawn` is possessed by a controller running on this machine.
#[must_use]
pub fn is_locally_controlled(world: &World, pawn: Entity) -> bool {
    controller_of(world, pawn)
        .and_then(|c| world.get::<Controller>(c))
        .is_some_and(|c| c.is_local)
}

/// Whether `pawn` is possessed by an AI controller.
#[must_use]
pub fn is_bot_controlled(world: &World, pawn: Entity) -> bool {
    controller_of(world, pawn)
        .and_then(|c| world.get::<Controller>(c))
        .is_some_and(|c| c.is_bot)
}

/// Whether `actor` is a pawn whose local copy is authoritative.
#[must_use]
pub fn has_authority(world: &World, actor: Entity) -> bool {
    world.get::<Pawn>(actor).is_some_and(Pawn::has_authority)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn local_control_follows_the_possessing_controller() {
        let mut world = World::new();
        let controller = world.spawn(Controller::local_player()).id();
        let pawn = world
            .spawn(Pawn {
                controller: Some(controller),
                ..Pawn::default()
            })
            .id();
        assert!(is_locally_controlled(&world, pawn));
        assert!(!is_bot_controlled(&world, pawn));
        assert!(has_authority(&world, pawn));
    }

    #[rstest]
    fn player_state_lookup_ignores_dangling_references() {
        let mut world = World::new();
        let not_a_player_state = world.spawn_empty().id();
        let pawn = world
            .spawn(Pawn {
                player_state: Some(not_a_player_state),
                ..Pawn::default()
            })
            .id();
        assert_eq!(player_state_of(&world, pawn), None);
    }

    #[rstest]
    fn consuming_movement_resets_it() {
        let mut pawn = Pawn::with_role(NetRole::SimulatedProxy);
        pawn.pending_movement = Vec3::X;
        assert_eq!(pawn.consume_movement_input(), Vec3::X);
        assert_eq!(pawn.pending_movement, Vec3::ZERO);
        assert!(!pawn.has_authority());
    }
}
