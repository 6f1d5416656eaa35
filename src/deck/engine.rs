/// Swipe deck state machine
///
/// The engine owns the cursor into the feed and the drag position of the
/// current card. It never mutates the feed: callers pass the feed slice in
/// and receive `DeckEvent`s back.
///
/// Phases:
/// - Idle: no gesture, card at the origin
/// - Dragging: card follows the pointer
/// - Committing: card flies off screen; cannot be interrupted
/// - Resetting: card springs back to the origin after a cancelled drag

use cgmath::{Vector2, Zero};
use std::time::Duration;
use tracing::debug;

use super::animation::{Spring, Timing};
use super::signals::{self, Signals};
use crate::config::DeckConfig;
use crate::state::data::Item;

/// Which way a card left the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Reject: stage the item for deletion
    Left,
    /// Keep
    Right,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Pointer input in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Start(Vector2<f32>),
    Move(Vector2<f32>),
    Release(Vector2<f32>),
}

/// Outcome reported to the owner of the feed
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    /// A card was committed; `item` is the card that was current when the
    /// gesture (or programmatic commit) started
    Swiped { direction: Direction, item: Item },
    /// The cursor moved onto an item
    IndexChanged(usize),
}

/// Public view of the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckPhase {
    Idle,
    Dragging,
    Committing,
    Resetting,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Dragging {
        anchor: Vector2<f32>,
        item: Item,
    },
    Committing {
        direction: Direction,
        item: Item,
        motion: Timing,
    },
    Resetting {
        motion: Spring,
    },
}

#[derive(Debug, Clone)]
pub struct DeckEngine {
    config: DeckConfig,
    viewport_width: f32,
    cursor: usize,
    position: Vector2<f32>,
    phase: Phase,
    /// Feed generation the cursor refers to
    generation: Option<u64>,
}

impl DeckEngine {
    pub fn new(config: DeckConfig) -> Self {
        let viewport_width = config.viewport_width;
        Self {
            config,
            viewport_width,
            cursor: 0,
            position: Vector2::zero(),
            phase: Phase::Idle,
            generation: None,
        }
    }

    /// Update the viewport width that thresholds are derived from
    pub fn set_viewport_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.viewport_width = width;
        }
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    /// Horizontal offset a release must exceed to commit
    pub fn threshold(&self) -> f32 {
        self.viewport_width * self.config.threshold_ratio
    }

    /// Horizontal distance of the off-screen target
    pub fn eject_distance(&self) -> f32 {
        self.viewport_width * self.config.eject_ratio
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn phase(&self) -> DeckPhase {
        match self.phase {
            Phase::Idle => DeckPhase::Idle,
            Phase::Dragging { .. } => DeckPhase::Dragging,
            Phase::Committing { .. } => DeckPhase::Committing,
            Phase::Resetting { .. } => DeckPhase::Resetting,
        }
    }

    /// True while a commit or reset animation needs frames
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Committing { .. } | Phase::Resetting { .. })
    }

    pub fn current<'a>(&self, feed: &'a [Item]) -> Option<&'a Item> {
        feed.get(self.cursor)
    }

    pub fn next<'a>(&self, feed: &'a [Item]) -> Option<&'a Item> {
        feed.get(self.cursor + 1)
    }

    /// No current card: the terminal "nothing left" state
    pub fn is_exhausted(&self, feed: &[Item]) -> bool {
        self.cursor >= feed.len()
    }

    /// Derived visual signals for the current drag position
    pub fn signals(&self) -> Signals {
        let dx = self.position.x;
        let threshold = self.threshold();
        Signals {
            rotation_deg: signals::rotation_deg(dx, self.viewport_width, self.config.rotation_max_deg),
            next_card_scale: signals::next_card_scale(
                dx,
                self.viewport_width,
                self.config.next_card_rest_scale,
                self.config.next_card_focus_scale,
            ),
            left_opacity: signals::left_intent(dx, threshold),
            right_opacity: signals::right_intent(dx, threshold),
        }
    }

    /// Feed a pointer event through the state machine.
    ///
    /// Events that do not apply to the current phase are ignored.
    pub fn handle(&mut self, event: GestureEvent, feed: &[Item]) {
        match event {
            GestureEvent::Start(point) => {
                if !matches!(self.phase, Phase::Idle) {
                    return;
                }
                if let Some(item) = self.current(feed) {
                    self.phase = Phase::Dragging {
                        anchor: point,
                        item: item.clone(),
                    };
                    self.position = Vector2::zero();
                }
            }
            GestureEvent::Move(point) => {
                if let Phase::Dragging { anchor, .. } = &self.phase {
                    self.position = point - *anchor;
                }
            }
            GestureEvent::Release(point) => {
                // Stray releases must not cut a running commit or reset short
                if !matches!(self.phase, Phase::Dragging { .. }) {
                    return;
                }
                let Phase::Dragging { anchor, item } =
                    std::mem::replace(&mut self.phase, Phase::Idle)
                else {
                    return;
                };
                self.position = point - anchor;

                let dx = self.position.x;
                if dx.abs() > self.threshold() {
                    let direction = if dx > 0.0 { Direction::Right } else { Direction::Left };
                    self.start_commit(direction, item);
                } else if self.position != Vector2::zero() {
                    self.phase = Phase::Resetting {
                        motion: Spring::new(
                            self.position,
                            self.config.spring_stiffness,
                            self.config.spring_damping,
                        ),
                    };
                }
            }
        }
    }

    /// Commit without a gesture (keep/reject buttons). Skips the threshold.
    ///
    /// Returns false when there is no current card or an animation is
    /// already running.
    pub fn commit(&mut self, direction: Direction, feed: &[Item]) -> bool {
        let item = match &self.phase {
            Phase::Idle => match self.current(feed) {
                Some(item) => item.clone(),
                None => return false,
            },
            Phase::Dragging { item, .. } => item.clone(),
            Phase::Committing { .. } | Phase::Resetting { .. } => return false,
        };
        self.start_commit(direction, item);
        true
    }

    fn start_commit(&mut self, direction: Direction, item: Item) {
        let target = Vector2::new(direction.sign() * self.eject_distance(), 0.0);
        self.phase = Phase::Committing {
            direction,
            item,
            motion: Timing::new(self.position, target, self.config.commit_duration()),
        };
    }

    /// Step the running animation by `dt`
    pub fn advance(&mut self, dt: Duration, feed: &[Item]) -> Vec<DeckEvent> {
        let mut events = Vec::new();
        match &mut self.phase {
            Phase::Committing { motion, .. } => {
                let (position, done) = motion.step(dt);
                self.position = position;
                if done {
                    if let Phase::Committing { direction, item, .. } =
                        std::mem::replace(&mut self.phase, Phase::Idle)
                    {
                        debug!(id = %item.id, ?direction, cursor = self.cursor, "card committed");
                        events.push(DeckEvent::Swiped { direction, item });
                    }
                    self.cursor += 1;
                    // Snap without animating so the new card never shows at an offset
                    self.position = Vector2::zero();
                    if self.cursor < feed.len() {
                        events.push(DeckEvent::IndexChanged(self.cursor));
                    }
                }
            }
            Phase::Resetting { motion } => {
                let (position, done) = motion.step(dt);
                self.position = position;
                if done {
                    self.phase = Phase::Idle;
                    self.position = Vector2::zero();
                }
            }
            Phase::Idle | Phase::Dragging { .. } => {}
        }
        events
    }

    /// Force the cursor to 0 and the card to the origin, cutting any animation
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.position = Vector2::zero();
        self.phase = Phase::Idle;
    }

    /// Reconcile with the feed: a new generation resets the deck, and a
    /// feed that shrank under the cursor clamps it.
    ///
    /// Returns true if the deck was reset.
    pub fn sync(&mut self, generation: u64, feed_len: usize) -> bool {
        if self.generation != Some(generation) {
            self.generation = Some(generation);
            self.reset();
            return true;
        }
        if self.cursor > feed_len {
            self.cursor = feed_len.saturating_sub(1);
            if !self.is_animating() {
                self.position = Vector2::zero();
                self.phase = Phase::Idle;
            }
        }
        false
    }

    /// Move the cursor to `index` (at most the feed length).
    ///
    /// A running commit keeps its item and still advances when it lands.
    pub fn seek(&mut self, index: usize, feed_len: usize) {
        self.cursor = index.min(feed_len);
        if !self.is_animating() {
            self.position = Vector2::zero();
            self.phase = Phase::Idle;
        }
    }

    /// Walk the cursor back one card (undo), preempting any animation
    pub fn step_back(&mut self, feed: &[Item]) -> Option<DeckEvent> {
        self.cursor = self.cursor.saturating_sub(1);
        self.position = Vector2::zero();
        self.phase = Phase::Idle;
        (self.cursor < feed.len()).then_some(DeckEvent::IndexChanged(self.cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 400.0;

    fn feed() -> Vec<Item> {
        ["a", "b", "c"]
            .iter()
            .map(|id| Item::new(*id, format!("/photos/{id}.jpg")))
            .collect()
    }

    fn engine() -> DeckEngine {
        let mut engine = DeckEngine::new(DeckConfig::default());
        engine.set_viewport_width(WIDTH);
        engine
    }

    fn point(x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(x, y)
    }

    fn run_to_idle(engine: &mut DeckEngine, feed: &[Item]) -> Vec<DeckEvent> {
        let mut events = Vec::new();
        for _ in 0..1000 {
            if !engine.is_animating() {
                break;
            }
            events.extend(engine.advance(Duration::from_millis(16), feed));
        }
        events
    }

    fn drag(engine: &mut DeckEngine, feed: &[Item], dx: f32) {
        engine.handle(GestureEvent::Start(point(200.0, 300.0)), feed);
        engine.handle(GestureEvent::Move(point(200.0 + dx / 2.0, 305.0)), feed);
        engine.handle(GestureEvent::Release(point(200.0 + dx, 310.0)), feed);
    }

    #[test]
    fn test_release_past_threshold_commits_in_either_direction() {
        let feed = feed();
        for (dx, direction) in [(150.0, Direction::Right), (-150.0, Direction::Left)] {
            let mut engine = engine();
            drag(&mut engine, &feed, dx);
            assert_eq!(engine.phase(), DeckPhase::Committing);

            let events = run_to_idle(&mut engine, &feed);

            assert_eq!(engine.cursor(), 1);
            assert_eq!(engine.position(), Vector2::zero());
            assert_eq!(engine.phase(), DeckPhase::Idle);
            assert_eq!(
                events,
                vec![
                    DeckEvent::Swiped { direction, item: feed[0].clone() },
                    DeckEvent::IndexChanged(1),
                ]
            );
        }
    }

    #[test]
    fn test_release_at_threshold_cancels() {
        let feed = feed();
        let mut engine = engine();
        // Threshold is exactly 0.25 * 400
        drag(&mut engine, &feed, 100.0);
        assert_eq!(engine.phase(), DeckPhase::Resetting);

        let events = run_to_idle(&mut engine, &feed);

        assert!(events.is_empty());
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.position(), Vector2::zero());
        assert_eq!(engine.phase(), DeckPhase::Idle);
    }

    #[test]
    fn test_move_tracks_raw_delta() {
        let feed = feed();
        let mut engine = engine();
        engine.handle(GestureEvent::Start(point(10.0, 20.0)), &feed);
        engine.handle(GestureEvent::Move(point(-30.0, 45.0)), &feed);

        assert_eq!(engine.phase(), DeckPhase::Dragging);
        assert_eq!(engine.position(), point(-40.0, 25.0));
        let signals = engine.signals();
        assert!(signals.rotation_deg < 0.0);
        assert!((signals.left_opacity - 0.4).abs() < 1e-4);
        assert_eq!(signals.right_opacity, 0.0);
    }

    #[test]
    fn test_commit_is_not_interruptible() {
        let feed = feed();
        let mut engine = engine();
        drag(&mut engine, &feed, -300.0);
        engine.advance(Duration::from_millis(50), &feed);

        engine.handle(GestureEvent::Start(point(0.0, 0.0)), &feed);
        engine.handle(GestureEvent::Move(point(50.0, 0.0)), &feed);
        assert!(!engine.commit(Direction::Right, &feed));
        assert_eq!(engine.phase(), DeckPhase::Committing);

        let events = run_to_idle(&mut engine, &feed);
        assert_eq!(engine.cursor(), 1);
        assert!(matches!(
            events.first(),
            Some(DeckEvent::Swiped { direction: Direction::Left, .. })
        ));
    }

    #[test]
    fn test_click_during_commit_still_lands() {
        let feed = feed();
        let mut engine = engine();
        assert!(engine.commit(Direction::Left, &feed));
        engine.advance(Duration::from_millis(50), &feed);

        engine.handle(GestureEvent::Start(point(10.0, 10.0)), &feed);
        engine.handle(GestureEvent::Release(point(10.0, 10.0)), &feed);
        assert_eq!(engine.phase(), DeckPhase::Committing);

        let events = run_to_idle(&mut engine, &feed);
        assert_eq!(engine.cursor(), 1);
        assert_eq!(engine.position(), Vector2::zero());
        assert_eq!(
            events,
            vec![
                DeckEvent::Swiped { direction: Direction::Left, item: feed[0].clone() },
                DeckEvent::IndexChanged(1),
            ]
        );
    }

    #[test]
    fn test_click_during_reset_still_returns_to_origin() {
        let feed = feed();
        let mut engine = engine();
        drag(&mut engine, &feed, 60.0);
        assert_eq!(engine.phase(), DeckPhase::Resetting);
        engine.advance(Duration::from_millis(16), &feed);

        engine.handle(GestureEvent::Start(point(10.0, 10.0)), &feed);
        engine.handle(GestureEvent::Release(point(10.0, 10.0)), &feed);
        assert_eq!(engine.phase(), DeckPhase::Resetting);

        let events = run_to_idle(&mut engine, &feed);
        assert!(events.is_empty());
        assert_eq!(engine.phase(), DeckPhase::Idle);
        assert_eq!(engine.position(), Vector2::zero());
        assert_eq!(engine.cursor(), 0);
    }

    #[test]
    fn test_programmatic_commit_skips_threshold() {
        let feed = feed();
        let mut engine = engine();

        assert!(engine.commit(Direction::Left, &feed));
        assert_eq!(engine.phase(), DeckPhase::Committing);
        let events = run_to_idle(&mut engine, &feed);

        assert_eq!(engine.cursor(), 1);
        assert_eq!(
            events.first(),
            Some(&DeckEvent::Swiped { direction: Direction::Left, item: feed[0].clone() })
        );
    }

    #[test]
    fn test_swipe_reports_item_current_at_drag_start() {
        let mut feed = feed();
        let mut engine = engine();
        engine.handle(GestureEvent::Start(point(0.0, 0.0)), &feed);
        // Feed contents change mid-gesture
        feed.remove(0);
        engine.handle(GestureEvent::Release(point(250.0, 0.0)), &feed);

        let events = run_to_idle(&mut engine, &feed);
        assert!(matches!(
            events.first(),
            Some(DeckEvent::Swiped { item, .. }) if item.id == "a"
        ));
    }

    #[test]
    fn test_exhausted_deck() {
        let feed = feed();
        let mut engine = engine();
        for _ in 0..3 {
            assert!(engine.commit(Direction::Right, &feed));
            run_to_idle(&mut engine, &feed);
        }

        assert!(engine.is_exhausted(&feed));
        assert!(engine.current(&feed).is_none());
        assert!(engine.next(&feed).is_none());
        assert!(!engine.commit(Direction::Right, &feed));
        engine.handle(GestureEvent::Start(point(0.0, 0.0)), &feed);
        assert_eq!(engine.phase(), DeckPhase::Idle);
    }

    #[test]
    fn test_new_generation_resets_deck_mid_animation() {
        let feed = feed();
        let mut engine = engine();
        assert!(engine.sync(1, feed.len()));
        engine.commit(Direction::Right, &feed);
        run_to_idle(&mut engine, &feed);
        drag(&mut engine, &feed, 300.0);
        engine.advance(Duration::from_millis(40), &feed);
        assert_eq!(engine.phase(), DeckPhase::Committing);

        assert!(!engine.sync(1, feed.len()));
        assert!(engine.sync(2, feed.len()));

        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.position(), Vector2::zero());
        assert_eq!(engine.phase(), DeckPhase::Idle);
        assert!(engine.advance(Duration::from_secs(1), &feed).is_empty());
    }

    #[test]
    fn test_shrunk_feed_clamps_cursor() {
        let feed = feed();
        let mut engine = engine();
        engine.sync(1, feed.len());
        for _ in 0..3 {
            engine.commit(Direction::Left, &feed);
            run_to_idle(&mut engine, &feed);
        }
        assert_eq!(engine.cursor(), 3);

        // Cursor equal to the length is the exhausted state, not clamped
        engine.sync(1, 3);
        assert_eq!(engine.cursor(), 3);

        engine.sync(1, 1);
        assert_eq!(engine.cursor(), 0);

        engine.sync(1, 0);
        assert_eq!(engine.cursor(), 0);
    }

    #[test]
    fn test_seek_is_bounded_by_feed() {
        let feed = feed();
        let mut engine = engine();
        engine.seek(2, feed.len());
        assert_eq!(engine.current(&feed).map(|item| item.id.as_str()), Some("c"));
        engine.seek(10, feed.len());
        assert!(engine.is_exhausted(&feed));
        assert_eq!(engine.cursor(), 3);
    }

    #[test]
    fn test_step_back() {
        let feed = feed();
        let mut engine = engine();
        engine.commit(Direction::Left, &feed);
        run_to_idle(&mut engine, &feed);

        assert_eq!(engine.step_back(&feed), Some(DeckEvent::IndexChanged(0)));
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.step_back(&feed), Some(DeckEvent::IndexChanged(0)));
    }
}
