//! The composition root: entities, types, interactions and the tick loop.
//!
//! [`World`] exclusively owns every character and object. Actions and
//! interactions receive `&mut World` explicitly and reach other entities by
//! id; nothing holds references across ticks.
//!
//! A tick visits characters in id order. A character either advances its
//! current action or, when it has none or the action just completed, asks
//! its controller for the next decision and prepares it. A freshly prepared
//! action first ticks on the following frame.

use std::collections::BTreeMap;

use tracing::debug;

use crate::action::ActiveAction;
use crate::character::Character;
use crate::config::WorldConfig;
use crate::error::{ActionError, PathError, WorldError};
use crate::geometry::{Footprint, Position};
use crate::ids::{CharacterId, ObjectId};
use crate::interaction::{CHARACTER_TYPE, Interaction};
use crate::navigator::{Destination, Navigator};
use crate::object::{Object, ObjectType};

/// Default walking speed in cells per second.
pub const DEFAULT_WALK_SPEED: f64 = 10.0;

/// All simulation state.
#[derive(Debug)]
pub struct World {
    width: u32,
    height: u32,
    characters: BTreeMap<CharacterId, Character>,
    objects: BTreeMap<ObjectId, Object>,
    types: BTreeMap<String, ObjectType>,
    interactions: BTreeMap<String, Interaction>,
    navigator: Navigator,
    walk_speed: f64,
    ticks: u64,
}

impl World {
    /// An empty world of `width` by `height` cells.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            characters: BTreeMap::new(),
            objects: BTreeMap::new(),
            types: BTreeMap::new(),
            interactions: BTreeMap::new(),
            navigator: Navigator::new(width, height),
            walk_speed: DEFAULT_WALK_SPEED,
            ticks: 0,
        }
    }

    /// An empty world sized and tuned from configuration.
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut world = Self::new(config.width, config.height);
        world.walk_speed = config.walk_speed;
        world
    }

    /// Width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Walking speed in cells per second.
    pub const fn walk_speed(&self) -> f64 {
        self.walk_speed
    }

    /// Number of ticks run so far.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Register an object type (and its interaction, if any).
    pub fn add_type(&mut self, name: impl Into<String>, ty: ObjectType) -> Result<(), WorldError> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(WorldError::DuplicateType(name));
        }
        if let Some(interaction) = &ty.interaction {
            self.interactions.insert(name.clone(), interaction.clone());
        }
        self.types.insert(name, ty);
        Ok(())
    }

    /// Register the interaction used when a character is the target.
    pub fn set_character_interaction(&mut self, interaction: Interaction) {
        self.interactions
            .insert(CHARACTER_TYPE.to_owned(), interaction);
    }

    /// Place an object. Its footprint and occlusion default come from its type.
    pub fn add_object(&mut self, mut object: Object) -> Result<(), WorldError> {
        if self.objects.contains_key(object.id()) {
            return Err(WorldError::DuplicateObject(object.id().clone()));
        }
        let ty = self
            .types
            .get(object.kind())
            .ok_or_else(|| WorldError::UnknownType(object.kind().to_owned()))?;
        object.apply_type(ty);

        if let Some(outside) = object.cells().find(|cell| !self.navigator.grid().contains(*cell)) {
            return Err(WorldError::OutOfBounds {
                id: object.id().to_string(),
                position: outside,
            });
        }
        if object.occludes() {
            for other in self.objects.values().filter(|o| o.occludes()) {
                if let Some(cell) = object
                    .cells()
                    .find(|cell| other.size().covers(other.position(), *cell))
                {
                    return Err(WorldError::Overlap {
                        object: object.id().clone(),
                        other: other.id().clone(),
                        cell,
                    });
                }
            }
        }

        debug!(object = %object.id(), kind = object.kind(), position = %object.position(), "object added");
        self.objects.insert(object.id().clone(), object);
        Ok(())
    }

    /// Remove an object; its cells are released on the next path query.
    pub fn remove_object(&mut self, id: &str) -> Option<Object> {
        let removed = self.objects.remove(id);
        if removed.is_some() {
            debug!(object = id, "object removed");
        }
        removed
    }

    /// Add a character.
    pub fn add_character(&mut self, character: Character) -> Result<(), WorldError> {
        if self.characters.contains_key(character.id()) {
            return Err(WorldError::DuplicateCharacter(character.id().clone()));
        }
        if !self.navigator.grid().contains(character.position()) {
            return Err(WorldError::OutOfBounds {
                id: character.id().to_string(),
                position: character.position(),
            });
        }
        debug!(character = %character.id(), position = %character.position(), "character added");
        self.characters.insert(character.id().clone(), character);
        Ok(())
    }

    /// Remove a character.
    ///
    /// Anyone it was asking gets their interrupted action back; anyone
    /// asking it will find it no longer listening.
    pub fn remove_character(&mut self, id: &str) -> Result<Character, WorldError> {
        let removed = self
            .characters
            .remove(id)
            .ok_or_else(|| WorldError::UnknownCharacter(CharacterId::new(id)))?;
        for other in self.characters.values_mut() {
            let asked_by_removed = matches!(
                other.action(),
                Some(ActiveAction::Answer(answer)) if answer.asker().as_str() == id
            );
            if asked_by_removed && let Some(ActiveAction::Answer(answer)) = other.take_action() {
                other.set_action(answer.into_previous());
            }
        }
        debug!(character = id, "character removed");
        Ok(removed)
    }

    /// Mark a rectangle as impassable terrain.
    pub fn make_impassable(&mut self, position: Position, size: Footprint) {
        self.navigator.block_terrain(position, size);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Look up a character.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Look up a character for mutation.
    pub fn character_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    /// All characters in id order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Look up an object.
    pub fn object(&self, id: &str) -> Option<&Object> {
        self.objects.get(id)
    }

    /// All objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Look up a registered object type.
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    /// The interaction registered for a type name (or [`CHARACTER_TYPE`]).
    pub fn interaction(&self, kind: &str) -> Option<&Interaction> {
        self.interactions.get(kind)
    }

    /// All registered interactions as `(type name, rule)` in name order.
    pub fn interactions(&self) -> impl Iterator<Item = (&str, &Interaction)> {
        self.interactions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Find a path from `origin` to the object or character `target`.
    ///
    /// The occlusion grid is re-synchronised with the current objects first.
    pub fn get_path(&mut self, origin: Position, target: &str) -> Result<Vec<Position>, PathError> {
        let destination = if let Some(object) = self.objects.get(target) {
            Destination {
                id: target,
                origin: object.position(),
                size: object.size(),
            }
        } else if let Some(character) = self.characters.get(target) {
            Destination {
                id: target,
                origin: character.position(),
                size: Footprint::UNIT,
            }
        } else {
            return Err(PathError::NoSuchTarget(target.to_owned()));
        };

        self.navigator.sync(
            self.objects
                .values()
                .filter(|o| o.occludes())
                .map(|o| (o.id(), o.position(), o.size())),
        );

        let objects = &self.objects;
        let interactions = &self.interactions;
        self.navigator.find_path(origin, &destination, |id| {
            objects
                .get(id)
                .and_then(|o| interactions.get(o.kind()))
                .is_some_and(Interaction::removable)
        })
    }

    // ------------------------------------------------------------------
    // Tick loop
    // ------------------------------------------------------------------

    /// Advance every character by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.ticks = self.ticks.saturating_add(1);
        let ids: Vec<CharacterId> = self.characters.keys().cloned().collect();
        for id in &ids {
            self.tick_character(id, dt);
        }
    }

    fn tick_character(&mut self, id: &CharacterId, dt: f64) {
        let Some(character) = self.characters.get_mut(id) else {
            return;
        };

        let finished: Option<ActionError> = match character.take_action() {
            None => None,
            Some(mut action) => {
                if !action.tick(self, id, dt) {
                    if let Some(character) = self.characters.get_mut(id) {
                        character.set_action(Some(action));
                    }
                    return;
                }
                let error = action.take_error();
                debug!(
                    character = %id,
                    action = action.kind().as_str(),
                    error = error.as_ref().map(tracing::field::display),
                    "action complete"
                );
                error
            }
        };

        let Some(character) = self.characters.get_mut(id) else {
            return;
        };
        character.set_last_error(finished.clone());
        let mut controller = character.take_controller();
        let next = controller.next_action(self, id, finished.as_ref());
        if let Some(character) = self.characters.get_mut(id) {
            character.restore_controller(controller);
        }

        let active = next.prepare(self, id);
        if let Some(character) = self.characters.get_mut(id) {
            character.set_action(Some(active));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionKind};
    use crate::controller::ScriptedController;

    fn rock_type() -> ObjectType {
        ObjectType::new(Footprint::UNIT, true)
    }

    #[test]
    fn setup_rejects_duplicates_and_unknown_types() {
        let mut world = World::new(5, 5);
        world.add_type("rock", rock_type()).unwrap();
        assert_eq!(
            world.add_type("rock", rock_type()),
            Err(WorldError::DuplicateType("rock".to_owned()))
        );
        assert_eq!(
            world.add_object(Object::new("a", "tree", Position::new(0, 0))),
            Err(WorldError::UnknownType("tree".to_owned()))
        );
        world
            .add_object(Object::new("a", "rock", Position::new(0, 0)))
            .unwrap();
        assert!(matches!(
            world.add_object(Object::new("a", "rock", Position::new(1, 1))),
            Err(WorldError::DuplicateObject(_))
        ));
        world
            .add_character(Character::new("red", Position::new(2, 2)))
            .unwrap();
        assert!(matches!(
            world.add_character(Character::new("red", Position::new(3, 3))),
            Err(WorldError::DuplicateCharacter(_))
        ));
    }

    #[test]
    fn overlapping_occluders_are_rejected() {
        let mut world = World::new(6, 6);
        world
            .add_type("house", ObjectType::new(Footprint::new(2, 2), true))
            .unwrap();
        world
            .add_type("grass", ObjectType::new(Footprint::UNIT, false))
            .unwrap();
        world
            .add_object(Object::new("a", "house", Position::new(1, 1)))
            .unwrap();
        let err = world
            .add_object(Object::new("b", "house", Position::new(2, 2)))
            .unwrap_err();
        assert!(matches!(err, WorldError::Overlap { cell, .. } if cell == Position::new(2, 2)));
        world
            .add_object(Object::new("c", "grass", Position::new(1, 1)))
            .unwrap();
        assert!(matches!(
            world.add_object(Object::new("d", "house", Position::new(5, 5))),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn removed_objects_stop_occluding() {
        let mut world = World::new(5, 3);
        world.add_type("rock", rock_type()).unwrap();
        world
            .add_object(Object::new("target", "rock", Position::new(4, 1)))
            .unwrap();
        for y in 0..3 {
            world
                .add_object(Object::new(format!("wall{y}"), "rock", Position::new(2, y)))
                .unwrap();
        }
        assert_eq!(
            world.get_path(Position::new(0, 1), "target"),
            Err(PathError::Unreachable("target".to_owned()))
        );
        world.remove_object("wall1");
        assert_eq!(world.get_path(Position::new(0, 1), "target").unwrap().len(), 3);
    }

    #[test]
    fn terrain_blocks_paths() {
        let mut world = World::new(5, 3);
        world.add_type("rock", rock_type()).unwrap();
        world
            .add_object(Object::new("target", "rock", Position::new(4, 1)))
            .unwrap();
        world.make_impassable(Position::new(2, 0), Footprint::new(1, 3));
        assert_eq!(
            world.get_path(Position::new(0, 1), "target"),
            Err(PathError::Unreachable("target".to_owned()))
        );
    }

    #[test]
    fn characters_can_be_path_targets() {
        let mut world = World::new(8, 8);
        world
            .add_character(Character::new("blue", Position::new(5, 0)))
            .unwrap();
        assert_eq!(world.get_path(Position::new(0, 0), "blue").unwrap().len(), 4);
        assert_eq!(
            world.get_path(Position::new(0, 0), "nobody"),
            Err(PathError::NoSuchTarget("nobody".to_owned()))
        );
    }

    #[test]
    fn tick_decides_then_runs_actions() {
        let mut world = World::new(8, 4);
        world.add_type("rock", rock_type()).unwrap();
        world
            .add_object(Object::new("rock", "rock", Position::new(4, 0)))
            .unwrap();
        world
            .add_character(
                Character::new("red", Position::new(0, 0))
                    .with_controller(ScriptedController::new([Action::walk("rock")])),
            )
            .unwrap();

        world.tick(0.1);
        let red = world.character("red").unwrap();
        assert_eq!(red.action().map(ActiveAction::kind), Some(ActionKind::Walk));
        assert_eq!(red.position(), Position::new(0, 0));

        for _ in 0..10 {
            world.tick(0.1);
        }
        let red = world.character("red").unwrap();
        assert_eq!(red.position(), Position::new(3, 0));
        assert_eq!(red.action().map(ActiveAction::kind), Some(ActionKind::Idle));
        assert!(red.last_error().is_none());
        assert_eq!(world.ticks(), 11);
    }

    #[test]
    fn failed_action_error_is_recorded() {
        let mut world = World::new(4, 4);
        world
            .add_character(
                Character::new("red", Position::new(0, 0))
                    .with_controller(ScriptedController::new([Action::walk("ghost")])),
            )
            .unwrap();
        world.tick(0.1);
        world.tick(0.1);
        assert_eq!(
            world
                .character("red")
                .unwrap()
                .last_error()
                .map(ToString::to_string),
            Some("No such object or character 'ghost'".to_owned())
        );
    }
}
