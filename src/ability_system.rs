//! Minimal ability system the pawn features bind to.
//!
//! It records actor info, granted abilities, pending input and active cues
//! so the binding protocol can be observed; ability effects are not modelled.

use bevy::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::tags::GameplayTag;

/// Identifies a granted ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilitySpecHandle(pub u32);

/// Data describing an ability that can be granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Display name.
    pub name: String,
    /// Behaviour tags, e.g. [`ABILITY_BEHAVIOR_SURVIVES_DEATH`](crate::tags::ABILITY_BEHAVIOR_SURVIVES_DEATH).
    #[serde(default)]
    pub tags: Vec<GameplayTag>,
    /// Input tag that presses this ability.
    #[serde(default)]
    pub input_tag: Option<GameplayTag>,
}

/// A bundle of abilities granted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySet {
    /// Display name.
    pub name: String,
    /// Abilities in the set.
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
}

/// One rule of a tag relationship mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRelationship {
    /// Tag of the ability the rule applies to.
    pub ability_tag: GameplayTag,
    /// Abilities with these tags are blocked while it is active.
    #[serde(default)]
    pub block: Vec<GameplayTag>,
    /// Abilities with these tags are cancelled when it activates.
    #[serde(default)]
    pub cancel: Vec<GameplayTag>,
}

/// How ability tags block and cancel each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRelationshipMapping {
    /// Display name.
    pub name: String,
    /// Rules in the mapping.
    #[serde(default)]
    pub relationships: Vec<TagRelationship>,
}

/// An ability granted to an [`AbilitySystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedAbility {
    /// Handle issued at grant time.
    pub handle: AbilitySpecHandle,
    /// What was granted.
    pub definition: AbilityDefinition,
    /// Whether it is currently running.
    pub active: bool,
}

/// The ability system of a player state or character.
///
/// One instance outlives any single pawn; `avatar_actor` names the pawn it
/// currently animates.
#[derive(Component, Debug, Default)]
pub struct AbilitySystem {
    owner_actor: Option<Entity>,
    avatar_actor: Option<Entity>,
    granted: Vec<GrantedAbility>,
    next_handle: u32,
    input_pressed: Vec<AbilitySpecHandle>,
    input_held: Vec<AbilitySpecHandle>,
    input_released: Vec<AbilitySpecHandle>,
    gameplay_cues: Vec<GameplayTag>,
    tag_relationship_mapping: Option<TagRelationshipMapping>,
    actor_info_refreshes: u32,
}

impl AbilitySystem {
    /// The logical owner, usually a player state.
    #[must_use]
    pub const fn owner_actor(&self) -> Option<Entity> {
        self.owner_actor
    }

    /// The pawn currently acting for this ability system.
    #[must_use]
    pub const fn avatar_actor(&self) -> Option<Entity> {
        self.avatar_actor
    }

    /// Points the system at its owner and avatar.
    pub fn init_ability_actor_info(&mut self, owner: Entity, avatar: Entity) {
        debug!("ability system actor info: owner {owner:?}, avatar {avatar:?}");
        self.owner_actor = Some(owner);
        self.avatar_actor = Some(avatar);
    }

    /// Replaces only the avatar.
    pub const fn set_avatar_actor(&mut self, avatar: Option<Entity>) {
        self.avatar_actor = avatar;
    }

    /// Forgets both owner and avatar.
    pub const fn clear_actor_info(&mut self) {
        self.owner_actor = None;
        self.avatar_actor = None;
    }

    /// Re-reads cached actor info after a controller change.
    pub const fn refresh_ability_actor_info(&mut self) {
        self.actor_info_refreshes += 1;
    }

    /// How many times actor info was refreshed.
    #[must_use]
    pub const fn actor_info_refreshes(&self) -> u32 {
        self.actor_info_refreshes
    }

    /// Grants every ability of `set`, returning the new handles.
    pub fn give_ability_set(&mut self, set: &AbilitySet) -> Vec<AbilitySpecHandle> {
        set.abilities
            .iter()
            .map(|definition| {
                self.next_handle += 1;
                let handle = AbilitySpecHandle(self.next_handle);
                self.granted.push(GrantedAbility {
                    handle,
                    definition: definition.clone(),
                    active: false,
                });
                handle
            })
            .collect()
    }

    /// Granted abilities, in grant order.
    #[must_use]
    pub fn granted_abilities(&self) -> &[GrantedAbility] {
        &self.granted
    }

    /// Marks a granted ability as running. Returns false for unknown handles.
    pub fn activate_ability(&mut self, handle: AbilitySpecHandle) -> bool {
        match self.granted.iter_mut().find(|g| g.handle == handle) {
            Some(granted) => {
                granted.active = true;
                true
            }
            None => false,
        }
    }

    /// Handles of running abilities.
    #[must_use]
    pub fn active_abilities(&self) -> Vec<AbilitySpecHandle> {
        self.granted
            .iter()
            .filter(|g| g.active)
            .map(|g| g.handle)
            .collect()
    }

    /// Cancels running abilities unless they carry one of `ignore` (or a
    /// child of it). Returns how many were cancelled.
    pub fn cancel_abilities(&mut self, ignore: &[GameplayTag]) -> usize {
        let mut cancelled = 0;
        for granted in self.granted.iter_mut().filter(|g| g.active) {
            let survives = granted
                .definition
                .tags
                .iter()
                .any(|tag| ignore.iter().any(|skip| tag.matches(skip)));
            if !survives {
                granted.active = false;
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Records a press for every ability bound to `input_tag`.
    pub fn ability_input_tag_pressed(&mut self, input_tag: &GameplayTag) {
        if !input_tag.is_valid() {
            return;
        }
        for handle in self.handles_for_input(input_tag) {
            push_unique(&mut self.input_pressed, handle);
            push_unique(&mut self.input_held, handle);
        }
    }

    /// Records a release for every ability bound to `input_tag`.
    pub fn ability_input_tag_released(&mut self, input_tag: &GameplayTag) {
        if !input_tag.is_valid() {
            return;
        }
        for handle in self.handles_for_input(input_tag) {
            push_unique(&mut self.input_released, handle);
            self.input_held.retain(|h| *h != handle);
        }
    }

    /// Drops all pending input.
    pub fn clear_ability_input(&mut self) {
        self.input_pressed.clear();
        self.input_held.clear();
        self.input_released.clear();
    }

    /// Abilities pressed since the last clear.
    #[must_use]
    pub fn input_pressed(&self) -> &[AbilitySpecHandle] {
        &self.input_pressed
    }

    /// Abilities currently held.
    #[must_use]
    pub fn input_held(&self) -> &[AbilitySpecHandle] {
        &self.input_held
    }

    /// Abilities released since the last clear.
    #[must_use]
    pub fn input_released(&self) -> &[AbilitySpecHandle] {
        &self.input_released
    }

    /// Starts a persistent cue.
    pub fn add_gameplay_cue(&mut self, cue: GameplayTag) {
        self.gameplay_cues.push(cue);
    }

    /// Removes every active cue.
    pub fn remove_all_gameplay_cues(&mut self) {
        self.gameplay_cues.clear();
    }

    /// Active cues.
    #[must_use]
    pub fn gameplay_cues(&self) -> &[GameplayTag] {
        &self.gameplay_cues
    }

    /// Installs the mapping used to block and cancel abilities.
    pub fn set_tag_relationship_mapping(&mut self, mapping: Option<TagRelationshipMapping>) {
        self.tag_relationship_mapping = mapping;
    }

    /// The installed tag relationship mapping.
    #[must_use]
    pub const fn tag_relationship_mapping(&self) -> Option<&TagRelationshipMapping> {
        self.tag_relationship_mapping.as_ref()
    }

    fn handles_for_input(&self, input_tag: &GameplayTag) -> Vec<AbilitySpecHandle> {
        self.granted
            .iter()
            .filter(|g| g.definition.input_tag.as_ref() == Some(input_tag))
            .map(|g| g.handle)
            .collect()
    }
}

fn push_unique(handles: &mut Vec<AbilitySpecHandle>, handle: AbilitySpecHandle) {
    if !handles.contains(&handle) {
        handles.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::ABILITY_BEHAVIOR_SURVIVES_DEATH;
    use rstest::{fixture, rstest};

    #[fixture]
    fn jump_and_respawn() -> AbilitySet {
        AbilitySet {
            name: "Basics".to_owned(),
            abilities: vec![
                AbilityDefinition {
                    name: "Jump".to_owned(),
                    tags: Vec::new(),
                    input_tag: Some(GameplayTag::from_static("InputTag.Jump")),
                },
                AbilityDefinition {
                    name: "Respawn".to_owned(),
                    tags: vec![ABILITY_BEHAVIOR_SURVIVES_DEATH],
                    input_tag: None,
                },
            ],
        }
    }

    #[rstest]
    fn cancel_spares_death_survivors(jump_and_respawn: AbilitySet) {
        let mut asc = AbilitySystem::default();
        let handles = asc.give_ability_set(&jump_and_respawn);
        for handle in &handles {
            assert!(asc.activate_ability(*handle));
        }
        assert_eq!(asc.cancel_abilities(&[ABILITY_BEHAVIOR_SURVIVES_DEATH]), 1);
        assert_eq!(asc.active_abilities(), handles.get(1..).unwrap_or_default());
    }

    #[rstest]
    fn input_tags_route_to_bound_abilities(jump_and_respawn: AbilitySet) {
        let mut asc = AbilitySystem::default();
        let handles = asc.give_ability_set(&jump_and_respawn);
        let jump_only = handles.get(..1).unwrap_or_default();
        let jump = GameplayTag::from_static("InputTag.Jump");

        asc.ability_input_tag_pressed(&jump);
        asc.ability_input_tag_pressed(&jump);
        assert_eq!(asc.input_pressed(), jump_only);
        assert_eq!(asc.input_held(), jump_only);

        asc.ability_input_tag_released(&jump);
        assert!(asc.input_held().is_empty());
        assert_eq!(asc.input_released(), jump_only);

        asc.clear_ability_input();
        assert!(asc.input_pressed().is_empty());
        assert!(asc.input_released().is_empty());
    }

    #[rstest]
    fn clearing_actor_info_drops_owner_and_avatar() {
        let mut world = World::new();
        let owner = world.spawn_empty().id();
        let avatar = world.spawn_empty().id();
        let mut asc = AbilitySystem::default();
        asc.init_ability_actor_info(owner, avatar);
        asc.set_avatar_actor(None);
        assert_eq!(asc.owner_actor(), Some(owner));
        assert_eq!(asc.avatar_actor(), None);
        asc.clear_actor_info();
        assert_eq!(asc.owner_actor(), None);
    }
}
