//! The demo world: a goal behind a wall whose only gap is a locked door.
//!
//! ```text
//!   . . . . . . . . . . # . . . .
//!   . . R . . . . . . . # . . . .
//!   . . . . . . . . . . D . . . G
//!   . . . K . B . . . . # . . . .
//! ```
//!
//! `red` starts with a hand, `blue` knows where the key is. The key is
//! picked up by hand and opens the door; touching the goal by hand wins.

use tickworld_core::config::WorldConfig;
use tickworld_core::{
    Action, Character, Controller, Footprint, GoalFlag, Interaction, Object, ObjectType, Position,
    ScriptedController, World,
};

use crate::error::EngineError;

/// What the player character is asked to achieve.
pub const GOAL: &str = "Touch the goal that is behind the locked door.";

/// Column of the wall separating the goal from the start.
const WALL_X: i32 = 10;

/// Row of the door in the wall.
const DOOR_Y: i32 = 5;

const GOAL_AT: Position = Position::new(14, DOOR_Y);
const KEY_AT: Position = Position::new(3, 8);
const BLUE_AT: Position = Position::new(5, 8);
const RED_AT: Position = Position::new(2, 2);

/// Narrowest grid that holds the goal.
pub const MIN_WIDTH: u32 = 15;

/// Shortest grid that holds the key and leaves wall below the door.
pub const MIN_HEIGHT: u32 = 9;

/// Build the demo world with `red` driven by `controller`.
///
/// Fails with [`EngineError::GridTooSmall`] if the configured grid is
/// smaller than [`MIN_WIDTH`] by [`MIN_HEIGHT`].
pub fn demo_world(
    config: &WorldConfig,
    flag: &GoalFlag,
    controller: impl Into<Controller>,
) -> Result<World, EngineError> {
    if config.width < MIN_WIDTH || config.height < MIN_HEIGHT {
        return Err(EngineError::GridTooSmall {
            width: config.width,
            height: config.height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }
    let mut world = World::from_config(config);

    world.add_type(
        "key",
        ObjectType::new(Footprint::UNIT, true)
            .with_interaction(Interaction::pick_up("key", "hand")),
    )?;
    world.add_type(
        "door",
        ObjectType::new(Footprint::UNIT, true).with_interaction(Interaction::open("door", "key")),
    )?;
    world.add_type(
        "goal",
        ObjectType::new(Footprint::UNIT, true)
            .with_interaction(Interaction::win("hand", "goal", flag.clone())),
    )?;
    world.set_character_interaction(Interaction::give(["hand"]));

    let below_door = config.height.saturating_sub(6);
    world.make_impassable(Position::new(WALL_X, 0), Footprint::new(1, 5));
    world.make_impassable(
        Position::new(WALL_X, DOOR_Y.saturating_add(1)),
        Footprint::new(1, below_door),
    );

    world.add_object(Object::new("door", "door", Position::new(WALL_X, DOOR_Y)))?;
    world.add_object(Object::new("key", "key", KEY_AT))?;
    world.add_object(Object::new("goal", "goal", GOAL_AT))?;

    world.add_character(
        Character::new("blue", BLUE_AT).with_controller(
            ScriptedController::default()
                .with_answers(["The key is lying on the ground, just west of me."]),
        ),
    )?;
    world.add_character(
        Character::new("red", RED_AT)
            .with_items(["hand"])
            .with_controller(controller),
    )?;

    Ok(world)
}

/// A fixed solution used when no LLM backend is configured.
pub fn walkthrough() -> ScriptedController {
    ScriptedController::new([
        Action::ask("blue", "Where can I find a key?"),
        Action::walk("key"),
        Action::interact("hand", "key"),
        Action::walk("door"),
        Action::interact("key", "door"),
        Action::walk("goal"),
        Action::interact("hand", "goal"),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn goal_is_sealed_off_by_the_door() {
        let flag = GoalFlag::new();
        let mut world = demo_world(&WorldConfig::default(), &flag, walkthrough()).unwrap();
        let err = world.get_path(RED_AT, "goal").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot reach 'goal' because 'door' is blocking the path"
        );
        assert!(world.get_path(RED_AT, "key").is_ok());
    }

    #[test]
    fn minimum_grid_fits_the_layout() {
        let config = WorldConfig {
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
            ..WorldConfig::default()
        };
        let flag = GoalFlag::new();
        let mut world = demo_world(&config, &flag, walkthrough()).unwrap();
        assert!(world.get_path(RED_AT, "key").is_ok());
        assert!(world.get_path(RED_AT, "door").is_ok());
        assert_eq!(
            world.object("goal").unwrap().position(),
            Position::new(i32::try_from(MIN_WIDTH).unwrap() - 1, DOOR_Y)
        );
        assert_eq!(KEY_AT.y, i32::try_from(MIN_HEIGHT).unwrap() - 1);
    }

    #[test]
    fn small_grids_are_rejected() {
        for (width, height) in [(MIN_WIDTH - 1, MIN_HEIGHT), (MIN_WIDTH, MIN_HEIGHT - 1)] {
            let config = WorldConfig {
                width,
                height,
                ..WorldConfig::default()
            };
            let err = demo_world(&config, &GoalFlag::new(), walkthrough()).unwrap_err();
            assert!(matches!(err, EngineError::GridTooSmall { .. }));
            assert_eq!(
                err.to_string(),
                format!("the demo world needs at least 15 x 9 cells, got {width} x {height}")
            );
        }
    }
}
