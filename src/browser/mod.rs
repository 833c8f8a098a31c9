//! Live browser adapter
//!
//! Drives Chrome over the DevTools Protocol. The page is read by snapshotting
//! its DOM into a [`DomTree`](crate::dom::DomTree) and written by replaying the
//! tree's mutation journal in the tab.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
