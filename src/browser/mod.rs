//! Chrome/Chromium access through the DevTools protocol.
//!
//! The browser is only the host: pages are captured into a [`crate::page::Page`],
//! processed locally, and the resulting mutations are replayed into the tab.

pub mod config;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::{mutation_script, BrowserSession};
