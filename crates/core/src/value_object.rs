//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// A value object has no identity; two instances with the same attributes are
/// interchangeable. A login session or a validated amount is a value object,
/// an invoice draft is not.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
