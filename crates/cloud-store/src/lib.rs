//! Remote access gateway for the Notewell client.
//!
//! Implements the core trait seams against the cloud: a Firestore-style
//! REST document store with an authenticated client and bounded retry,
//! an active reachability probe, an image host, and the upload
//! resilience controller for flaky connections.

mod auth;
mod client;
mod cloudinary;
mod probe;
mod retry;
mod upload;
mod wire;

pub use auth::*;
pub use client::*;
pub use cloudinary::*;
pub use probe::*;
pub use retry::*;
pub use upload::*;
pub use wire::*;
