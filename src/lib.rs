//! viewercount - live viewer counter
//!
//! Counts distinct clients currently viewing a page from short-lived
//! heartbeats. Sessions live only in memory: a bounded, self-expiring
//! registry behind a small JSON API.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use error::{ViewerError, ViewerResult};
