//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Drums and grids are entities: a drum keeps its identity while it moves in
/// and out of slots, and a grid slot keeps its label while drums come and go.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
