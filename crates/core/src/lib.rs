//! `factordesk-core`: shared domain primitives.
//!
//! Pure types only: identifiers, the domain error model and the entity/value
//! markers used by the invoicing, auth and reports crates. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AttachmentId, DraftId};
pub use value_object::ValueObject;
