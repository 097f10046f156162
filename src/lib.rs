//! Shelf - view-model core for a desktop game library.
//!
//! Polls the host process for managed and custom games, reconciles them into
//! categorized and paginated view state, and sequences the onboarding modals.
//! Rendering is left to the caller; see [`view::LibraryView`].

pub mod bridge;
pub mod config;
pub mod game;
pub mod library;
pub mod poller;
pub mod state;
pub mod task;
pub mod view;

pub use bridge::{Bridge, BridgeError, JsonDirBridge};
pub use view::{LibraryView, ViewModel, ViewOptions};
