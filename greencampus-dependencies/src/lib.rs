//! Shared third-party crates for the GreenCampus workspace.
//!
//! Member crates use these through this crate instead of pinning their own versions so
//! that every crate in the workspace links exactly one copy of each library.

pub use axum;
pub use base64;
pub use chrono;
pub use hex;
pub use moka;
pub use rand;
pub use reqwest;
pub use sha2;
pub use tower;
pub use uuid;
