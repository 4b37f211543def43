//! Core domain layer for the Notewell client.
//!
//! Holds the normalized entity cache and its reducer, the cache action
//! services for notes and subscriptions, and the trait seams (document
//! store, network probe, notifier, image host) implemented by the
//! transport crate.

pub mod errors;
pub mod images;
pub mod network;
pub mod notes;
pub mod notify;
pub mod session;
pub mod store;
pub mod subscriptions;

pub use errors::{Result, StoreError};
