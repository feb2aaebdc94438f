//! Interaction rules attached to object types.
//!
//! An [`Interaction`] describes what happens when a character uses an item on
//! an object (or on another character, through the rule registered under
//! [`CHARACTER_TYPE`]). Every rule validates its preconditions first and
//! touches the world only on success, so a rejected attempt leaves no trace
//! apart from the returned message.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::world::World;

/// Type name under which the interaction for character targets is registered.
pub const CHARACTER_TYPE: &str = "character";

/// A shared "goal reached" flag, set by [`Interaction::Win`].
///
/// Clones observe the same flag, so the engine and AI controllers can watch
/// for the win without holding a reference into the world.
#[derive(Debug, Clone, Default)]
pub struct GoalFlag(Arc<AtomicBool>);

impl GoalFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the goal has been reached.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the goal as reached.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// The rule set of an object type.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// Using the key on an object of this type removes it.
    Open {
        /// Type of the objects that can be opened.
        type_id: String,
        /// Item that opens them.
        key_id: String,
    },
    /// Using the tool on the object moves it into the inventory.
    PickUp {
        /// Type of the objects that can be picked up.
        item_id: String,
        /// Item required to pick them up.
        tool_id: String,
    },
    /// Trading one item for another at a fixed place.
    Shop {
        /// Object the trade happens at.
        where_id: String,
        /// Item the shop takes.
        buy_item: String,
        /// Item the shop hands out.
        sell_item: String,
    },
    /// Handing an item to another character.
    Give {
        /// Items that may never be given away.
        disallowed_items: BTreeSet<String>,
    },
    /// Using the right item on a goal object wins the game.
    Win {
        /// Item that must be used.
        item_id: String,
        /// Type of the goal objects.
        goal_type: String,
        /// Flag raised on success.
        flag: GoalFlag,
    },
}

impl Interaction {
    /// An [`Interaction::Open`] rule.
    pub fn open(type_id: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self::Open {
            type_id: type_id.into(),
            key_id: key_id.into(),
        }
    }

    /// An [`Interaction::PickUp`] rule.
    pub fn pick_up(item_id: impl Into<String>, tool_id: impl Into<String>) -> Self {
        Self::PickUp {
            item_id: item_id.into(),
            tool_id: tool_id.into(),
        }
    }

    /// An [`Interaction::Shop`] rule.
    pub fn shop(
        where_id: impl Into<String>,
        buy_item: impl Into<String>,
        sell_item: impl Into<String>,
    ) -> Self {
        Self::Shop {
            where_id: where_id.into(),
            buy_item: buy_item.into(),
            sell_item: sell_item.into(),
        }
    }

    /// An [`Interaction::Give`] rule.
    pub fn give<I, S>(disallowed_items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Give {
            disallowed_items: disallowed_items.into_iter().map(Into::into).collect(),
        }
    }

    /// An [`Interaction::Win`] rule raising `flag`.
    pub fn win(item_id: impl Into<String>, goal_type: impl Into<String>, flag: GoalFlag) -> Self {
        Self::Win {
            item_id: item_id.into(),
            goal_type: goal_type.into(),
            flag,
        }
    }

    /// Whether objects with this rule may be cleared out of a path, so the
    /// navigator reports them as blockers instead of walls.
    pub const fn removable(&self) -> bool {
        !matches!(self, Self::Win { .. })
    }

    /// A one-line description of the rule, used as agent context.
    pub fn rule(&self) -> String {
        match self {
            Self::Open { type_id, key_id } => {
                format!("Objects of type '{type_id}' can be opened with a '{key_id}'")
            }
            Self::PickUp { item_id, tool_id } => {
                format!("Objects of type '{item_id}' can be picked up with '{tool_id}'")
            }
            Self::Shop {
                where_id,
                buy_item,
                sell_item,
            } => format!(
                "By interacting with a '{buy_item}' and a '{where_id}', you can get a '{sell_item}'"
            ),
            Self::Give { .. } => {
                "Items can be given to other characters by interacting with them".to_owned()
            }
            Self::Win {
                item_id, goal_type, ..
            } => format!("You can win by interacting with '{goal_type}' using '{item_id}'."),
        }
    }

    /// Apply the rule: `character` uses `item` on `target`.
    ///
    /// Returns the reason for refusal on failure; the world is unchanged in
    /// that case.
    pub fn interact(
        &self,
        world: &mut World,
        character: &str,
        item: &str,
        target: &str,
    ) -> Result<(), String> {
        let holds = |world: &World, who: &str, what: &str| {
            world
                .character(who)
                .is_some_and(|c| c.inventory().contains(what))
        };

        match self {
            Self::Open { key_id, .. } => {
                if item != key_id {
                    return Err(format!("'{target}' can only be opened with a '{key_id}'"));
                }
                if !holds(world, character, key_id) {
                    return Err(format!(
                        "Cannot open '{target}' because you do not have a '{key_id}'"
                    ));
                }
                world.remove_object(target);
                Ok(())
            }
            Self::PickUp { tool_id, .. } => {
                if item != tool_id {
                    return Err(format!(
                        "'{target}' can only be picked up with a '{tool_id}'"
                    ));
                }
                if !holds(world, character, tool_id) {
                    return Err(format!(
                        "Cannot pick up '{target}' because you do not have a '{tool_id}'"
                    ));
                }
                if holds(world, character, target) {
                    return Err(format!(
                        "Cannot pick up '{target}' because you already have it"
                    ));
                }
                world.remove_object(target);
                if let Some(c) = world.character_mut(character) {
                    c.inventory_mut().insert(target.to_owned());
                }
                Ok(())
            }
            Self::Shop {
                where_id,
                buy_item,
                sell_item,
            } => {
                if target != where_id {
                    return Err(format!("'{target}' is not '{where_id}'"));
                }
                if item != buy_item {
                    return Err(format!(
                        "'{where_id}' does not buy '{item}', it buys '{buy_item}'"
                    ));
                }
                if !holds(world, character, item) {
                    return Err(format!("Cannot sell '{item}' because you do not have it"));
                }
                if holds(world, character, sell_item) {
                    return Err(format!(
                        "Cannot buy '{sell_item}' because you already have it"
                    ));
                }
                if let Some(c) = world.character_mut(character) {
                    c.inventory_mut().remove(item);
                    c.inventory_mut().insert(sell_item.clone());
                }
                Ok(())
            }
            Self::Give { disallowed_items } => {
                if world.character(target).is_none() {
                    return Err(format!(
                        "Cannot give '{item}' to '{target}' because they are not a character"
                    ));
                }
                if !holds(world, character, item) {
                    return Err(format!(
                        "Cannot give '{item}' to '{target}' because you do not have it"
                    ));
                }
                if disallowed_items.contains(item) {
                    return Err(format!("Giving '{item}' to '{target}' is not allowed"));
                }
                if holds(world, target, item) {
                    return Err(format!("{target} already has '{item}'"));
                }
                if let Some(c) = world.character_mut(target) {
                    c.inventory_mut().insert(item.to_owned());
                }
                Ok(())
            }
            Self::Win {
                item_id,
                goal_type,
                flag,
            } => {
                if world.object(target).is_none_or(|o| o.kind() != goal_type) {
                    return Err(format!(
                        "Cannot win by interacting with '{target}' because it is not of type '{goal_type}'"
                    ));
                }
                if item != item_id {
                    return Err(format!(
                        "You cannot win by interacting with '{target}' using '{item}'"
                    ));
                }
                flag.set();
                Ok(())
            }
        }
    }
}
