//! Swipe deck module
//!
//! This module turns pointer input into keep/reject decisions:
//! - Cursor and drag state machine (engine.rs)
//! - Card animations stepped by the frame clock (animation.rs)
//! - Rotation, scale and label opacity derived from the drag (signals.rs)

pub mod animation;
pub mod engine;
pub mod signals;

pub use engine::{DeckEngine, DeckEvent, DeckPhase, Direction, GestureEvent};
pub use signals::Signals;
