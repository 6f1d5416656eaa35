//! Swipe-based photo triage.
//!
//! Cards come off a paginated media feed one at a time. Dragging a card
//! left stages it for deletion, dragging it right keeps it, and staged
//! items are deleted in one batch ("purge") with rollback on failure.
//!
//! - [`deck`]: gesture state machine, animations and derived visual signals
//! - [`state`]: feed, deletion queue, purge and the deck/feed session
//! - [`store`]: media store contract and the SQLite folder catalog

pub mod config;
pub mod deck;
pub mod error;
pub mod logging;
pub mod state;
pub mod store;
