//! Phishing host dataset
//!
//! This module provides the feed format, the copy-on-write snapshot store
//! and the refresh path that feeds it.

mod format;
mod loader;
mod store;

pub use format::*;
pub use loader::*;
pub use store::*;
