//! Pawn extension: the feature that owns a pawn's config and its binding to
//! an ability system, and that coordinates every other feature on the pawn.
//!
//! It cannot leave [`InitState::DataAvailable`] until all features on the
//! pawn have reached it, which makes it the barrier the hero waits on.

mod notify;

use std::sync::Arc;

use bevy::prelude::*;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::ability_system::AbilitySystem;
use crate::components::{controller_of, has_authority, is_locally_controlled, Pawn};
use crate::init_state::{FeatureName, InitState, InitStateChanged};
use crate::pawn_data::PawnConfig;
use crate::registry::{self, FeatureRegistry, InitStateFeature, RegistryError};
use crate::tags::ABILITY_BEHAVIOR_SURVIVES_DEATH;

pub use notify::{BindingCallback, Notifier};

/// Registry name of the pawn extension.
pub const PAWN_EXTENSION_FEATURE: FeatureName = FeatureName("PawnExtension");

/// Per-pawn state of the extension.
#[derive(Component, Debug, Default)]
pub struct PawnExtension {
    pawn_config: Option<Arc<PawnConfig>>,
    ability_system: Option<Entity>,
    on_initialized: Notifier,
    on_uninitialized: Notifier,
}

impl PawnExtension {
    /// Config assigned to the pawn.
    #[must_use]
    pub const fn pawn_config(&self) -> Option<&Arc<PawnConfig>> {
        self.pawn_config.as_ref()
    }

    /// Entity carrying the bound [`AbilitySystem`].
    #[must_use]
    pub const fn ability_system(&self) -> Option<Entity> {
        self.ability_system
    }
}

/// Rejected pawn config assignments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PawnConfigError {
    /// The pawn carries no [`PawnExtension`].
    #[error("{pawn:?} has no pawn extension")]
    MissingExtension {
        /// Target pawn.
        pawn: Entity,
    },
    /// Only the authority may assign a config.
    #[error("trying to set pawn config [{config}] on {pawn:?} without authority")]
    NotAuthoritative {
        /// Target pawn.
        pawn: Entity,
        /// Name of the rejected config.
        config: String,
    },
    /// A config is already in place.
    #[error("trying to set pawn config [{rejected}] on {pawn:?} that already has valid pawn config [{existing}]")]
    AlreadySet {
        /// Target pawn.
        pawn: Entity,
        /// Name of the config in place.
        existing: String,
        /// Name of the rejected config.
        rejected: String,
    },
}

/// Chain driver for [`PawnExtension`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PawnExtensionFeature;

impl InitStateFeature for PawnExtensionFeature {
    fn can_change_init_state(
        &self,
        world: &World,
        host: Entity,
        current: Option<InitState>,
        desired: InitState,
    ) -> bool {
        match (current, desired) {
            (None, InitState::Spawned) => world.get::<Pawn>(host).is_some(),
            (Some(InitState::Spawned), InitState::DataAvailable) => {
                let Some(ext) = world.get::<PawnExtension>(host) else {
                    return false;
                };
                if ext.pawn_config.is_none() {
                    return false;
                }
                let needs_controller =
                    has_authority(world, host) || is_locally_controlled(world, host);
                !needs_controller || controller_of(world, host).is_some()
            }
            (Some(InitState::DataAvailable), InitState::DataInitialized) => world
                .get_resource::<FeatureRegistry>()
                .is_some_and(|r| r.have_all_features_reached_init_state(host, InitState::DataAvailable)),
            (Some(InitState::DataInitialized), InitState::GameplayReady) => true,
            _ => false,
        }
    }

    fn on_actor_init_state_changed(&self, world: &mut World, event: &InitStateChanged) {
        if event.feature != PAWN_EXTENSION_FEATURE && event.state == InitState::DataAvailable {
            check_default_initialization(world, event.host);
        }
    }
}

/// Registers the extension of `pawn` with the registry.
///
/// # Errors
/// Propagates [`RegistryError::AlreadyRegistered`].
pub fn on_register(world: &mut World, pawn: Entity) -> Result<(), RegistryError> {
    if world.get::<Pawn>(pawn).is_none() {
        warn!("pawn extension on {pawn:?} can only be added to pawns");
    }
    let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() else {
        warn!("no FeatureRegistry in world; {pawn:?} stays unregistered");
        return Ok(());
    };
    registry.register_feature(pawn, PAWN_EXTENSION_FEATURE, Arc::new(PawnExtensionFeature))
}

/// Forces the extension to [`InitState::Spawned`] and walks the chain.
///
/// A sibling's begin play may already have walked the extension there.
pub fn begin_play(world: &mut World, pawn: Entity) {
    let unspawned = world
        .get_resource::<FeatureRegistry>()
        .is_some_and(|r| r.init_state(pawn, PAWN_EXTENSION_FEATURE).is_none());
    if unspawned
        && !registry::try_to_change_init_state(world, pawn, PAWN_EXTENSION_FEATURE, InitState::Spawned)
    {
        error!("pawn extension on {pawn:?} failed to reach {}", InitState::Spawned);
    }
    check_default_initialization(world, pawn);
}

/// Releases the ability system and leaves the registry.
pub fn end_play(world: &mut World, pawn: Entity) {
    uninitialize_ability_system(world, pawn);
    if let Some(mut registry) = world.get_resource_mut::<FeatureRegistry>() {
        registry.unregister_feature(pawn, PAWN_EXTENSION_FEATURE);
    }
}

/// Re-checks every other feature on `pawn`, then the extension itself.
pub fn check_default_initialization(world: &mut World, pawn: Entity) {
    let Some(registry) = world.get_resource::<FeatureRegistry>() else {
        return;
    };
    let mut features: Vec<FeatureName> = registry
        .feature_names(pawn)
        .into_iter()
        .filter(|f| *f != PAWN_EXTENSION_FEATURE)
        .collect();
    features.push(PAWN_EXTENSION_FEATURE);
    registry::request_checks(world, pawn, &features);
}

/// Assigns the pawn config. Only the authority may do this, and only once.
///
/// # Errors
/// Returns [`PawnConfigError`] when the pawn has no extension, is not
/// authoritative, or already has a config. Rejections are also logged.
pub fn set_pawn_config(
    world: &mut World,
    pawn: Entity,
    config: Arc<PawnConfig>,
) -> Result<(), PawnConfigError> {
    if !has_authority(world, pawn) {
        let err = PawnConfigError::NotAuthoritative {
            pawn,
            config: config.name.clone(),
        };
        error!("{err}");
        return Err(err);
    }
    store_pawn_config(world, pawn, config)?;
    if let Some(mut p) = world.get_mut::<Pawn>(pawn) {
        p.force_net_update();
    }
    check_default_initialization(world, pawn);
    Ok(())
}

/// Applies a config received through replication and walks the chain.
///
/// # Errors
/// Returns [`PawnConfigError::AlreadySet`] when a different config is already
/// in place.
pub fn on_rep_pawn_config(
    world: &mut World,
    pawn: Entity,
    config: Arc<PawnConfig>,
) -> Result<(), PawnConfigError> {
    let already_applied = world
        .get::<PawnExtension>(pawn)
        .and_then(|ext| ext.pawn_config.as_ref())
        .is_some_and(|existing| Arc::ptr_eq(existing, &config));
    if !already_applied {
        store_pawn_config(world, pawn, config)?;
    }
    check_default_initialization(world, pawn);
    Ok(())
}

fn store_pawn_config(
    world: &mut World,
    pawn: Entity,
    config: Arc<PawnConfig>,
) -> Result<(), PawnConfigError> {
    let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) else {
        let err = PawnConfigError::MissingExtension { pawn };
        error!("{err}");
        return Err(err);
    };
    if let Some(existing) = &ext.pawn_config {
        let err = PawnConfigError::AlreadySet {
            pawn,
            existing: existing.name.clone(),
            rejected: config.name.clone(),
        };
        error!("{err}");
        return Err(err);
    }
    ext.pawn_config = Some(config);
    Ok(())
}

/// Config assigned to `pawn`.
#[must_use]
pub fn pawn_config(world: &World, pawn: Entity) -> Option<Arc<PawnConfig>> {
    world
        .get::<PawnExtension>(pawn)
        .and_then(|ext| ext.pawn_config.clone())
}

/// Entity of the ability system bound to `pawn`.
#[must_use]
pub fn ability_system_of(world: &World, pawn: Entity) -> Option<Entity> {
    world.get::<PawnExtension>(pawn).and_then(PawnExtension::ability_system)
}

/// Binds `pawn` as avatar of the ability system on `ability_system`, owned by
/// `owner`.
///
/// Rebinding the same ability system does nothing. A different bound system
/// is released first. If another pawn is still the avatar it is evicted
/// unless it is authoritative, in which case the binding is refused.
pub fn initialize_ability_system(
    world: &mut World,
    pawn: Entity,
    ability_system: Entity,
    owner: Entity,
) {
    let Some(current) = world.get::<PawnExtension>(pawn).map(|ext| ext.ability_system) else {
        warn!("{pawn:?} has no pawn extension; not binding ability system {ability_system:?}");
        return;
    };
    if current == Some(ability_system) {
        return;
    }
    if current.is_some() {
        uninitialize_ability_system(world, pawn);
    }

    let Some(existing_avatar) = world
        .get::<AbilitySystem>(ability_system)
        .map(AbilitySystem::avatar_actor)
    else {
        warn!("{ability_system:?} carries no ability system");
        return;
    };
    debug!("setting up ability system {ability_system:?} on {pawn:?} owned by {owner:?}, existing avatar {existing_avatar:?}");

    if let Some(existing) = existing_avatar.filter(|e| *e != pawn) {
        if has_authority(world, existing) {
            error!("ensure failed: {ability_system:?} is still bound to authoritative avatar {existing:?}; refusing to bind {pawn:?} instead of evicting");
            return;
        }
        info!("evicting stale avatar {existing:?} from {ability_system:?}");
        if world.get::<PawnExtension>(existing).is_some() {
            uninitialize_ability_system(world, existing);
        }
    }

    let mapping = pawn_config(world, pawn).and_then(|c| c.tag_relationship_mapping.clone());
    if let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) {
        ext.ability_system = Some(ability_system);
    }
    if let Some(mut asc) = world.get_mut::<AbilitySystem>(ability_system) {
        asc.init_ability_actor_info(owner, pawn);
        if mapping.is_some() {
            asc.set_tag_relationship_mapping(mapping);
        }
    }
    broadcast(world, pawn, Signal::Initialized);
}

/// Releases the ability system bound to `pawn`, if any.
///
/// Only tears the ability system down while `pawn` is still its avatar;
/// the local binding is dropped either way.
pub fn uninitialize_ability_system(world: &mut World, pawn: Entity) {
    let Some(ability_system) = ability_system_of(world, pawn) else {
        return;
    };
    let still_avatar = world
        .get::<AbilitySystem>(ability_system)
        .is_some_and(|asc| asc.avatar_actor() == Some(pawn));
    if still_avatar {
        if let Some(mut asc) = world.get_mut::<AbilitySystem>(ability_system) {
            let cancelled = asc.cancel_abilities(&[ABILITY_BEHAVIOR_SURVIVES_DEATH]);
            asc.clear_ability_input();
            asc.remove_all_gameplay_cues();
            if asc.owner_actor().is_some() {
                asc.set_avatar_actor(None);
            } else {
                asc.clear_actor_info();
            }
            debug!("released {ability_system:?} from {pawn:?}, cancelled {cancelled} abilities");
        }
        broadcast(world, pawn, Signal::Uninitialized);
    }
    if let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) {
        ext.ability_system = None;
    }
}

/// Reacts to `pawn` gaining or losing its controller.
pub fn handle_controller_changed(world: &mut World, pawn: Entity) {
    if let Some(ability_system) = ability_system_of(world, pawn) {
        let state = world
            .get::<AbilitySystem>(ability_system)
            .filter(|asc| asc.avatar_actor() == Some(pawn))
            .map(|asc| asc.owner_actor().is_some());
        match state {
            Some(false) => uninitialize_ability_system(world, pawn),
            Some(true) => {
                if let Some(mut asc) = world.get_mut::<AbilitySystem>(ability_system) {
                    asc.refresh_ability_actor_info();
                }
            }
            None => {}
        }
    }
    check_default_initialization(world, pawn);
}

/// Reacts to the player state of `pawn` arriving through replication.
pub fn handle_player_state_replicated(world: &mut World, pawn: Entity) {
    check_default_initialization(world, pawn);
}

/// Reacts to the controller's input component becoming available.
pub fn setup_player_input_component(world: &mut World, pawn: Entity) {
    check_default_initialization(world, pawn);
}

/// Subscribes `subscriber` to ability system binds on `pawn`.
///
/// When an ability system is already bound, `callback` also runs right away.
pub fn on_ability_system_initialized_register_and_call(
    world: &mut World,
    pawn: Entity,
    subscriber: Entity,
    callback: BindingCallback,
) {
    if ability_system_of(world, pawn).is_some() {
        callback(world, pawn);
    }
    let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) else {
        warn!("{pawn:?} has no pawn extension; dropping subscription of {subscriber:?}");
        return;
    };
    ext.on_initialized.add(subscriber, callback);
}

/// Subscribes `subscriber` to ability system releases on `pawn`.
pub fn on_ability_system_uninitialized_register(
    world: &mut World,
    pawn: Entity,
    subscriber: Entity,
    callback: BindingCallback,
) {
    let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) else {
        warn!("{pawn:?} has no pawn extension; dropping subscription of {subscriber:?}");
        return;
    };
    ext.on_uninitialized.add(subscriber, callback);
}

#[derive(Clone, Copy)]
enum Signal {
    Initialized,
    Uninitialized,
}

fn broadcast(world: &mut World, pawn: Entity, signal: Signal) {
    let Some(mut ext) = world.get_mut::<PawnExtension>(pawn) else {
        return;
    };
    let notifier = match signal {
        Signal::Initialized => std::mem::take(&mut ext.on_initialized),
        Signal::Uninitialized => std::mem::take(&mut ext.on_uninitialized),
    };
    notifier.broadcast(world, pawn);
    // Callbacks may have subscribed more listeners meanwhile.
    if let Some(mut restored) = world.get_mut::<PawnExtension>(pawn) {
        let slot = match signal {
            Signal::Initialized => &mut restored.on_initialized,
            Signal::Uninitialized => &mut restored.on_uninitialized,
        };
        let added = std::mem::replace(slot, notifier);
        slot.merge(added);
    }
}
