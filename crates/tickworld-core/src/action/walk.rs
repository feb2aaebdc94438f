//! Path following with smooth sub-cell movement.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::ActionError;
use crate::geometry::{Direction, Point, Position};
use crate::ids::CharacterId;
use crate::world::World;

/// Walk next to an object or character.
#[derive(Debug)]
pub struct Walk {
    target: String,
    path: VecDeque<Position>,
    error: Option<ActionError>,
}

impl Walk {
    /// Plan the path from the character's current cell.
    ///
    /// A pathfinding failure leaves the path empty and is reported when the
    /// walk completes on its first tick.
    pub fn prepare(world: &mut World, id: &CharacterId, target: String) -> Self {
        let Some(origin) = world.character(id.as_str()).map(|c| c.position()) else {
            return Self {
                target,
                path: VecDeque::new(),
                error: None,
            };
        };
        match world.get_path(origin, &target) {
            Ok(path) => Self {
                target,
                path: path.into(),
                error: None,
            },
            Err(err) => {
                debug!(character = %id, %target, error = %err, "walk has no path");
                Self {
                    target,
                    path: VecDeque::new(),
                    error: Some(err.into()),
                }
            }
        }
    }

    /// The walk target id.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Cells still to be entered, nearest first.
    pub fn remaining(&self) -> impl ExactSizeIterator<Item = &Position> {
        self.path.iter()
    }

    /// Move the character along the path at the world's walk speed.
    ///
    /// Each cell is entered in turn; the integer position is updated when
    /// the animated position arrives on a cell. Completes once the path is
    /// exhausted, even on a tick that grants no movement. A non-positive
    /// `dt` makes no progress.
    pub fn tick(&mut self, world: &mut World, id: &CharacterId, dt: f64) -> bool {
        if self.error.is_some() || self.path.is_empty() {
            return true;
        }
        let mut budget = world.walk_speed() * dt;
        if budget <= 0.0 {
            return false;
        }
        let Some(character) = world.character_mut(id.as_str()) else {
            return true;
        };

        while budget > 0.0 {
            let Some(&next) = self.path.front() else {
                break;
            };
            let here = character.animated_position();
            let goal = next.to_point();
            let (dx, dy) = (goal.x - here.x, goal.y - here.y);
            let distance = Point::new(dx, dy).length();

            if let Some(facing) = Direction::from_vector(dx, dy) {
                character.set_facing(facing);
            }

            if distance <= budget {
                budget -= distance;
                character.set_position(next);
                self.path.pop_front();
            } else {
                let scale = budget / distance;
                character.set_animated_position(Point::new(
                    here.x + dx * scale,
                    here.y + dy * scale,
                ));
                budget = 0.0;
            }
        }

        self.path.is_empty()
    }

    pub(crate) const fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<ActionError> {
        self.error.take()
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.error.is_some()
    }
}
