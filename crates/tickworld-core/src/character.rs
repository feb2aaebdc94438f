//! Agent state.

use std::collections::BTreeSet;

use crate::action::ActiveAction;
use crate::controller::Controller;
use crate::error::ActionError;
use crate::geometry::{Direction, Point, Position};
use crate::ids::CharacterId;

/// A character: position, inventory, the action it is performing and the
/// controller that decides its next one.
#[derive(Debug)]
pub struct Character {
    id: CharacterId,
    position: Position,
    animated: Point,
    facing: Direction,
    inventory: BTreeSet<String>,
    action: Option<ActiveAction>,
    controller: Controller,
    last_error: Option<ActionError>,
    last_answer: Option<String>,
}

impl Character {
    /// A character standing at `position` with an empty inventory and an
    /// idle scripted controller.
    pub fn new(id: impl Into<CharacterId>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            animated: position.to_point(),
            facing: Direction::default(),
            inventory: BTreeSet::new(),
            action: None,
            controller: Controller::default(),
            last_error: None,
            last_answer: None,
        }
    }

    /// Start with these items.
    #[must_use]
    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inventory.extend(items.into_iter().map(Into::into));
        self
    }

    /// Use this controller.
    #[must_use]
    pub fn with_controller(mut self, controller: impl Into<Controller>) -> Self {
        self.controller = controller.into();
        self
    }

    /// Unique id.
    pub const fn id(&self) -> &CharacterId {
        &self.id
    }

    /// Current grid cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Enter a cell; the animated position snaps onto it.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.animated = position.to_point();
    }

    /// Sub-cell position used for smooth movement.
    pub const fn animated_position(&self) -> Point {
        self.animated
    }

    /// Move the animated position without changing cells.
    pub const fn set_animated_position(&mut self, point: Point) {
        self.animated = point;
    }

    /// Snap the animated position back onto the current cell.
    pub fn settle(&mut self) {
        self.animated = self.position.to_point();
    }

    /// Facing direction.
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Turn to face `facing`.
    pub const fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    /// Items held.
    pub const fn inventory(&self) -> &BTreeSet<String> {
        &self.inventory
    }

    /// Mutable access to the items held.
    pub const fn inventory_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.inventory
    }

    /// The action in progress. `None` before the first decision and while
    /// the action is being ticked.
    pub const fn action(&self) -> Option<&ActiveAction> {
        self.action.as_ref()
    }

    /// Mutable access to the action in progress.
    pub const fn action_mut(&mut self) -> Option<&mut ActiveAction> {
        self.action.as_mut()
    }

    /// Remove the action in progress.
    pub fn take_action(&mut self) -> Option<ActiveAction> {
        self.action.take()
    }

    /// Replace the action in progress.
    pub fn set_action(&mut self, action: Option<ActiveAction>) {
        self.action = action;
    }

    /// The controller.
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Mutable access to the controller.
    pub const fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub(crate) fn take_controller(&mut self) -> Controller {
        std::mem::take(&mut self.controller)
    }

    pub(crate) fn restore_controller(&mut self, controller: Controller) {
        self.controller = controller;
    }

    /// Error reported by the most recently completed action.
    pub const fn last_error(&self) -> Option<&ActionError> {
        self.last_error.as_ref()
    }

    pub(crate) fn set_last_error(&mut self, error: Option<ActionError>) {
        self.last_error = error;
    }

    /// Answer received by the most recently completed question.
    pub fn last_answer(&self) -> Option<&str> {
        self.last_answer.as_deref()
    }

    /// Record the answer to a question this character asked.
    pub fn set_last_answer(&mut self, answer: String) {
        self.last_answer = Some(answer);
    }

    /// Take the recorded answer so it is reported only once.
    pub fn take_last_answer(&mut self) -> Option<String> {
        self.last_answer.take()
    }
}
