//! Using an inventory item on an adjacent object or character.

use tracing::debug;

use crate::error::ActionError;
use crate::ids::CharacterId;
use crate::interaction::{CHARACTER_TYPE, Interaction};
use crate::world::World;

/// Apply an interaction rule. Always completes on its first tick.
#[derive(Debug)]
pub struct Interact {
    item: String,
    target: String,
    rule: Option<Interaction>,
    error: Option<ActionError>,
}

impl Interact {
    /// Check that the item is held, the target exists, is adjacent, and has
    /// a rule to apply.
    pub fn prepare(world: &mut World, id: &CharacterId, item: String, target: String) -> Self {
        let checked = Self::validate(world, id, &item, &target);
        let (rule, error) = match checked {
            Ok(rule) => (Some(rule), None),
            Err(err) => {
                debug!(character = %id, %item, %target, error = %err, "interaction rejected");
                (None, Some(err))
            }
        };
        Self {
            item,
            target,
            rule,
            error,
        }
    }

    fn validate(
        world: &World,
        id: &CharacterId,
        item: &str,
        target: &str,
    ) -> Result<Interaction, ActionError> {
        let character = world
            .character(id.as_str())
            .ok_or_else(|| ActionError::NoSuchTarget(target.to_owned()))?;
        if !character.inventory().contains(item) {
            return Err(ActionError::MissingItem {
                target: target.to_owned(),
                item: item.to_owned(),
            });
        }
        let here = character.position();

        let (distance, rule) = if let Some(object) = world.object(target) {
            (object.distance_to(here), world.interaction(object.kind()))
        } else if let Some(other) = world.character(target) {
            (other.position().manhattan(here), world.interaction(CHARACTER_TYPE))
        } else {
            return Err(ActionError::NoSuchTarget(target.to_owned()));
        };

        if distance > 1 {
            return Err(ActionError::TooFar(target.to_owned()));
        }
        rule.cloned()
            .ok_or_else(|| ActionError::NotInteractable(target.to_owned()))
    }

    /// Run the rule and record its refusal, if any.
    pub fn tick(&mut self, world: &mut World, id: &CharacterId) -> bool {
        if let Some(rule) = self.rule.take() {
            match rule.interact(world, id.as_str(), &self.item, &self.target) {
                Ok(()) => {
                    debug!(character = %id, item = %self.item, target = %self.target, "interaction succeeded");
                }
                Err(reason) => {
                    debug!(character = %id, item = %self.item, target = %self.target, %reason, "interaction refused");
                    self.error = Some(ActionError::Interaction(reason));
                }
            }
        }
        true
    }

    pub(crate) const fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<ActionError> {
        self.error.take()
    }
}
