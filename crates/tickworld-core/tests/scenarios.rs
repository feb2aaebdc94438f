//! End-to-end world scenarios driven by scripted and console controllers.

#![allow(clippy::unwrap_used)]

use tickworld_core::action::ActiveAction;
use tickworld_core::controller::{Console, HumanController, ScriptedController};
use tickworld_core::{
    Action, ActionKind, Character, CharacterId, Footprint, GoalFlag, Interaction, Object,
    ObjectType, PathError, Position, World, WorldError,
};

const DT: f64 = 0.1;

fn run(world: &mut World, ticks: usize) {
    for _ in 0..ticks {
        world.tick(DT);
    }
}

/// A goal behind a wall whose only gap is a door; the key lies in the open.
fn locked_room(flag: &GoalFlag) -> World {
    let mut world = World::new(12, 8);
    world
        .add_type(
            "key",
            ObjectType::new(Footprint::UNIT, true)
                .with_interaction(Interaction::pick_up("key", "hand")),
        )
        .unwrap();
    world
        .add_type(
            "door",
            ObjectType::new(Footprint::UNIT, true).with_interaction(Interaction::open("door", "key")),
        )
        .unwrap();
    world
        .add_type(
            "goal",
            ObjectType::new(Footprint::UNIT, true)
                .with_interaction(Interaction::win("hand", "goal", flag.clone())),
        )
        .unwrap();

    world.make_impassable(Position::new(6, 0), Footprint::new(1, 3));
    world.make_impassable(Position::new(6, 4), Footprint::new(1, 4));
    world
        .add_object(Object::new("door", "door", Position::new(6, 3)))
        .unwrap();
    world
        .add_object(Object::new("key", "key", Position::new(2, 6)))
        .unwrap();
    world
        .add_object(Object::new("goal", "goal", Position::new(10, 3)))
        .unwrap();
    world
}

#[test]
fn pick_up_open_and_win() {
    let flag = GoalFlag::new();
    let mut world = locked_room(&flag);
    world
        .add_character(
            Character::new("red", Position::new(1, 1))
                .with_items(["hand"])
                .with_controller(ScriptedController::new([
                    Action::walk("key"),
                    Action::interact("hand", "key"),
                    Action::walk("door"),
                    Action::interact("key", "door"),
                    Action::walk("goal"),
                    Action::interact("hand", "goal"),
                ])),
        )
        .unwrap();

    for _ in 0..200 {
        world.tick(DT);
        if flag.is_set() {
            break;
        }
    }

    assert!(flag.is_set());
    assert!(world.object("key").is_none());
    assert!(world.object("door").is_none());
    let red = world.character("red").unwrap();
    assert!(red.inventory().contains("key"));
    assert_eq!(red.position().manhattan(Position::new(10, 3)), 1);
}

#[test]
fn walking_to_the_goal_reports_the_door() {
    let flag = GoalFlag::new();
    let mut world = locked_room(&flag);
    let err = world.get_path(Position::new(1, 1), "goal").unwrap_err();
    assert_eq!(
        err,
        PathError::Blocked {
            target: "goal".to_owned(),
            blocker: "door".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Cannot reach 'goal' because 'door' is blocking the path"
    );
}

#[test]
fn win_object_is_a_wall_not_a_blocker() {
    let flag = GoalFlag::new();
    let mut world = World::new(5, 3);
    world
        .add_type(
            "goal",
            ObjectType::new(Footprint::new(1, 3), true)
                .with_interaction(Interaction::win("hand", "goal", flag)),
        )
        .unwrap();
    world
        .add_type("rock", ObjectType::new(Footprint::UNIT, true))
        .unwrap();
    world
        .add_object(Object::new("pillar", "goal", Position::new(2, 0)))
        .unwrap();
    world
        .add_object(Object::new("rock", "rock", Position::new(4, 1)))
        .unwrap();
    assert_eq!(
        world.get_path(Position::new(0, 1), "rock"),
        Err(PathError::Unreachable("rock".to_owned()))
    );
}

#[test]
fn shrubbery_for_money() {
    let mut world = World::new(10, 5);
    world
        .add_type(
            "shop",
            ObjectType::new(Footprint::new(2, 1), true)
                .with_interaction(Interaction::shop("store", "shrubbery", "money")),
        )
        .unwrap();
    world
        .add_object(Object::new("store", "shop", Position::new(6, 2)))
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 2))
                .with_items(["shrubbery"])
                .with_controller(ScriptedController::new([
                    Action::walk("store"),
                    Action::interact("shrubbery", "store"),
                ])),
        )
        .unwrap();

    run(&mut world, 40);

    let red = world.character("red").unwrap();
    assert!(red.inventory().contains("money"));
    assert!(!red.inventory().contains("shrubbery"));
    assert!(red.last_error().is_none());
    assert!(world.object("store").is_some());
}

#[test]
fn give_to_a_neighbour() {
    let mut world = World::new(6, 3);
    world.set_character_interaction(Interaction::give(["hand"]));
    world
        .add_character(Character::new("blue", Position::new(3, 1)))
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1))
                .with_items(["hand", "apple"])
                .with_controller(ScriptedController::new([
                    Action::walk("blue"),
                    Action::interact("apple", "blue"),
                    Action::interact("hand", "blue"),
                ])),
        )
        .unwrap();

    run(&mut world, 20);

    assert!(world.character("blue").unwrap().inventory().contains("apple"));
    assert!(!world.character("blue").unwrap().inventory().contains("hand"));
    assert_eq!(
        world
            .character("red")
            .unwrap()
            .last_error()
            .map(ToString::to_string),
        Some("Giving 'hand' to 'blue' is not allowed".to_owned())
    );
}

fn kind_of(world: &World, id: &str) -> Option<ActionKind> {
    world
        .character(id)
        .and_then(|c| c.action())
        .map(ActiveAction::kind)
}

#[test]
fn ask_waits_for_a_typed_answer() {
    let console = Console::new();
    let mut world = World::new(8, 3);
    world
        .add_character(
            Character::new("blue", Position::new(4, 1))
                .with_controller(HumanController::new(console.clone())),
        )
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1))
                .with_controller(ScriptedController::new([Action::ask("blue", "Hi?")])),
        )
        .unwrap();

    // Decide, then walk three cells and publish the question.
    run(&mut world, 6);
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Answer));
    assert_eq!(kind_of(&world, "red"), Some(ActionKind::Ask));
    assert!(console.display().contains("Hi?"));

    // Nothing happens while blue has not typed anything.
    run(&mut world, 10);
    assert_eq!(kind_of(&world, "red"), Some(ActionKind::Ask));
    assert!(world.character("red").unwrap().last_answer().is_none());

    console.feed("Hello there");
    console.submit();
    world.tick(DT);

    let red = world.character("red").unwrap();
    assert_eq!(red.last_answer(), Some("Hello there"));
    assert!(red.last_error().is_none());
    assert_eq!(kind_of(&world, "red"), Some(ActionKind::Idle));
    // Blue was waiting for a command before being asked and is again.
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Idle));
}

#[test]
fn busy_characters_cannot_be_asked() {
    let mut world = World::new(8, 3);
    world
        .add_character(Character::new("blue", Position::new(4, 1)))
        .unwrap();
    world
        .add_character(
            Character::new("green", Position::new(7, 1))
                .with_controller(ScriptedController::new([Action::ask("blue", "Which way?")])),
        )
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1))
                .with_controller(ScriptedController::new([Action::ask("blue", "Hi?")])),
        )
        .unwrap();

    // green decides first (id order) and installs its answer on blue.
    world.tick(DT);
    world.tick(DT);
    assert_eq!(
        world
            .character("red")
            .unwrap()
            .last_error()
            .map(ToString::to_string),
        Some("'blue' is busy answering another question".to_owned())
    );

    run(&mut world, 10);
    assert_eq!(
        world.character("green").unwrap().last_answer(),
        Some("I don't know.")
    );
}

#[test]
fn ask_rejects_bad_requests() {
    let mut world = World::new(8, 3);
    world
        .add_type("rock", ObjectType::new(Footprint::UNIT, true))
        .unwrap();
    world
        .add_object(Object::new("rock", "rock", Position::new(5, 0)))
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1)).with_controller(ScriptedController::new([
                Action::ask("rock", "Hi?"),
                Action::ask("red", "Hi?"),
                Action::ask("blue", "  "),
            ])),
        )
        .unwrap();

    let mut errors = Vec::new();
    for _ in 0..4 {
        world.tick(DT);
        if let Some(err) = world.character("red").unwrap().last_error() {
            errors.push(err.to_string());
        }
    }
    assert_eq!(
        errors,
        vec![
            "Cannot ask 'rock' because they are not a character".to_owned(),
            "Cannot ask yourself a question".to_owned(),
            "Cannot ask an empty question".to_owned(),
        ]
    );
}

#[test]
fn removing_the_asker_releases_the_partner() {
    let mut world = World::new(8, 3);
    world
        .add_character(
            Character::new("blue", Position::new(4, 1))
                .with_controller(ScriptedController::new([Action::walk("red")])),
        )
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1))
                .with_controller(ScriptedController::new([Action::ask("blue", "Hi?")])),
        )
        .unwrap();

    world.tick(DT);
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Answer));
    let red = world.remove_character("red").unwrap();
    assert_eq!(red.id().as_str(), "red");
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Walk));
    assert_eq!(
        world.remove_character("red").unwrap_err(),
        WorldError::UnknownCharacter(CharacterId::new("red"))
    );
}

fn walk_left(action: Option<&ActiveAction>) -> Option<Vec<Position>> {
    match action? {
        ActiveAction::Walk(walk) => Some(walk.remaining().copied().collect()),
        _ => None,
    }
}

#[test]
fn unreachable_partner_is_left_alone() {
    let mut world = World::new(10, 5);
    world.make_impassable(Position::new(6, 1), Footprint::new(3, 1));
    world.make_impassable(Position::new(6, 3), Footprint::new(3, 1));
    world.make_impassable(Position::new(6, 2), Footprint::UNIT);
    world.make_impassable(Position::new(8, 2), Footprint::UNIT);
    world
        .add_character(Character::new("blue", Position::new(7, 2)))
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 2))
                .with_controller(ScriptedController::new([Action::ask("blue", "Hi?")])),
        )
        .unwrap();

    world.tick(DT);
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Idle));
    world.tick(DT);

    let red = world.character("red").unwrap();
    assert_eq!(
        red.last_error().map(ToString::to_string),
        Some("'blue' is unreachable".to_owned())
    );
    assert!(red.last_answer().is_none());
    assert_eq!(red.position(), Position::new(0, 2));
    assert_eq!(kind_of(&world, "blue"), Some(ActionKind::Idle));
}

#[test]
fn late_answer_resumes_the_interrupted_walk() {
    let mut world = World::new(14, 3);
    world
        .add_type("rock", ObjectType::new(Footprint::UNIT, true))
        .unwrap();
    world
        .add_object(Object::new("rock", "rock", Position::new(13, 1)))
        .unwrap();
    world
        .add_character(
            Character::new("blue", Position::new(6, 1)).with_controller(
                ScriptedController::new([Action::walk("rock")]).with_answers(["East."]),
            ),
        )
        .unwrap();
    world
        .add_character(
            Character::new("red", Position::new(0, 1)).with_controller(ScriptedController::new([
                Action::suspend(),
                Action::suspend(),
                Action::ask("blue", "Where are you going?"),
            ])),
        )
        .unwrap();

    // blue is two cells into its walk when red's question interrupts it.
    run(&mut world, 3);
    let parked = match world.character("blue").unwrap().action() {
        Some(ActiveAction::Answer(answer)) => walk_left(answer.previous()).unwrap(),
        other => panic!("blue should be answering, found {other:?}"),
    };
    assert_eq!(
        parked,
        [
            Position::new(9, 1),
            Position::new(10, 1),
            Position::new(11, 1),
            Position::new(12, 1),
        ]
    );
    assert_eq!(
        world.character("blue").unwrap().position(),
        Position::new(8, 1)
    );

    for _ in 0..30 {
        world.tick(DT);
        if world.character("red").unwrap().last_answer().is_some() {
            break;
        }
    }
    assert_eq!(
        world.character("red").unwrap().last_answer(),
        Some("East.")
    );
    let blue = world.character("blue").unwrap();
    assert_eq!(walk_left(blue.action()), Some(parked));
    assert_eq!(blue.position(), Position::new(8, 1));

    run(&mut world, 10);
    assert_eq!(
        world.character("blue").unwrap().position(),
        Position::new(12, 1)
    );
}
