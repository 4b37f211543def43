//! Notes domain: models, normalized cache + reducer, and the action layer.

mod cache;
mod model;
mod service;

pub use cache::*;
pub use model::*;
pub use service::*;
