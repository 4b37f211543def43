//! Subscriptions domain: models, validation, and the action layer.
//!
//! Same confirm-then-apply pattern as notes, but the collection is small
//! enough that listing is not paginated.

mod model;
mod service;

pub use model::*;
pub use service::*;
