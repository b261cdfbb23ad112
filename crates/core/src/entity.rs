//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Drafts and attachments are entities: editing every field of a draft still
/// leaves the same draft.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
