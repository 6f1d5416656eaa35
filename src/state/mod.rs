/// State management module
/// 
/// This module handles all triage state, including:
/// - Shared data structures (data.rs)
/// - The deletion queue with LIFO undo (queue.rs)
/// - The paginated feed, purge and busy flags (feed.rs)
/// - Prefetch coalescing (gate.rs)
/// - Optimistic updates with rollback (optimistic.rs)
/// - Access to the media store (permission.rs)
/// - The deck/feed session glue (session.rs)

pub mod data;
pub mod feed;
pub mod gate;
pub mod optimistic;
pub mod permission;
pub mod queue;
pub mod session;
