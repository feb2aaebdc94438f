//! Static placed entities and their types.

use crate::geometry::{Footprint, Position};
use crate::ids::ObjectId;
use crate::interaction::Interaction;

/// Shared properties of every object of one type.
#[derive(Debug, Clone)]
pub struct ObjectType {
    /// Footprint of objects of this type.
    pub size: Footprint,
    /// Whether objects of this type block movement unless overridden.
    pub occlude: bool,
    /// Rule applied when a character uses an item on such an object.
    pub interaction: Option<Interaction>,
}

impl ObjectType {
    /// A type without an interaction.
    pub const fn new(size: Footprint, occlude: bool) -> Self {
        Self {
            size,
            occlude,
            interaction: None,
        }
    }

    /// Attach an interaction rule.
    #[must_use]
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = Some(interaction);
        self
    }
}

/// A placed object.
///
/// The footprint and occlusion default come from the object's type when it
/// is added to the world; the interaction is looked up through the type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    id: ObjectId,
    kind: String,
    position: Position,
    size: Footprint,
    occlude: Option<bool>,
}

impl Object {
    /// An object of type `kind` with its top-left corner at `position`.
    pub fn new(id: impl Into<ObjectId>, kind: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position,
            size: Footprint::UNIT,
            occlude: None,
        }
    }

    /// Override the type's occlusion default for this object.
    #[must_use]
    pub const fn with_occlude(mut self, occlude: bool) -> Self {
        self.occlude = Some(occlude);
        self
    }

    /// Unique id.
    pub const fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Name of the object's type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Top-left cell.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Footprint in cells.
    pub const fn size(&self) -> Footprint {
        self.size
    }

    /// Whether the object blocks movement.
    pub fn occludes(&self) -> bool {
        self.occlude.unwrap_or(true)
    }

    /// Every cell covered by the object.
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        self.size.cells(self.position)
    }

    /// Manhattan distance from `cell` to the nearest covered cell.
    pub fn distance_to(&self, cell: Position) -> u32 {
        self.size.distance(self.position, cell)
    }

    /// Fill in what the type provides; called once on insertion.
    pub(crate) fn apply_type(&mut self, ty: &ObjectType) {
        self.size = ty.size;
        self.occlude = Some(self.occlude.unwrap_or(ty.occlude));
    }
}
