/// Deck and feed wiring
///
/// The session routes deck outcomes into the feed (rejects are staged for
/// deletion), keeps the deck in step with the feed's identity and length,
/// drives prefetching from the cursor position, and produces the per-frame
/// view the presentation layer renders.

use std::time::{Duration, Instant};

use cgmath::Vector2;

use super::data::{AssetPage, Item, ListRequest, PurgeOutcome};
use super::feed::AssetFeed;
use super::permission::PermissionStatus;
use crate::config::Settings;
use crate::deck::{DeckEngine, DeckEvent, DeckPhase, Direction, GestureEvent, Signals};
use crate::error::{StoreError, TriageError};
use crate::store::MediaStore;

/// Everything the presentation layer needs for one render
#[derive(Debug, Clone)]
pub struct DeckView<'a> {
    pub current: Option<&'a Item>,
    pub next: Option<&'a Item>,
    pub position: Vector2<f32>,
    pub signals: Signals,
    pub phase: DeckPhase,
    pub cursor: usize,
    pub total: usize,
    pub queue_count: usize,
    pub loading_initial: bool,
    pub loading_more: bool,
    pub purging: bool,
    pub error: Option<&'a TriageError>,
}

impl DeckView<'_> {
    /// Nothing left to show
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }
}

/// Work produced by one frame tick
#[derive(Debug, Default)]
pub struct Tick {
    pub events: Vec<DeckEvent>,
    /// Page request to run, if a coalesced prefetch fired
    pub load: Option<ListRequest>,
}

#[derive(Debug)]
pub struct Session {
    feed: AssetFeed,
    deck: DeckEngine,
    prefetch_margin: usize,
    /// Feed generation and number of staged items before the cursor when
    /// the running purge began
    purge_shift: Option<(u64, usize)>,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            feed: AssetFeed::new(settings.feed.clone()),
            deck: DeckEngine::new(settings.deck.clone()),
            prefetch_margin: settings.feed.prefetch_margin,
            purge_shift: None,
        }
    }

    pub fn feed(&self) -> &AssetFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut AssetFeed {
        &mut self.feed
    }

    pub fn deck(&self) -> &DeckEngine {
        &self.deck
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.deck.set_viewport_width(width);
    }

    /// Begin the initial load if access allows it
    pub fn start(&mut self, permission: PermissionStatus) -> Option<ListRequest> {
        if permission.can_load() {
            Some(self.feed.begin_refresh())
        } else {
            self.feed.deny_access(format!("media access is {permission:?}"));
            None
        }
    }

    pub fn begin_refresh(&mut self) -> ListRequest {
        self.feed.begin_refresh()
    }

    pub fn finish_refresh(&mut self, result: Result<AssetPage, StoreError>) {
        self.feed.finish_refresh(result);
        self.sync_deck();
    }

    pub fn finish_load_more(&mut self, result: Result<AssetPage, StoreError>) -> usize {
        self.feed.finish_load_more(result)
    }

    fn sync_deck(&mut self) {
        self.deck.sync(self.feed.generation(), self.feed.len());
    }

    /// Feed a pointer event to the deck
    pub fn gesture(&mut self, event: GestureEvent) {
        self.deck.handle(event, self.feed.items());
    }

    /// Keep or reject the current card without a gesture
    pub fn commit(&mut self, direction: Direction) -> bool {
        self.deck.commit(direction, self.feed.items())
    }

    /// Advance animations, route swipe outcomes and run the prefetch logic
    pub fn tick(&mut self, dt: Duration, now: Instant) -> Tick {
        let events = self.deck.advance(dt, self.feed.items());
        for event in &events {
            if let DeckEvent::Swiped { direction: Direction::Left, item } = event {
                self.feed.queue_mut().enqueue(item.id.clone());
            }
        }
        self.check_prefetch(now);
        Tick {
            events,
            load: self.feed.poll_load_more(now),
        }
    }

    /// Ask for the next page once the cursor nears the end of the feed
    pub fn check_prefetch(&mut self, now: Instant) -> bool {
        if self.feed.has_more() && self.deck.cursor() + self.prefetch_margin > self.feed.len() {
            self.feed.request_load_more(now)
        } else {
            false
        }
    }

    /// Unstage the last reject and bring the deck back one card
    pub fn undo(&mut self) -> Option<String> {
        // The staged ids already belong to the running purge's snapshot
        if self.feed.is_purging() {
            return None;
        }
        let id = self.feed.queue_mut().dequeue_last()?;
        self.deck.step_back(self.feed.items());
        Some(id)
    }

    /// Start a purge, keeping the current card in view while the staged
    /// items disappear from the feed
    pub fn begin_purge(&mut self) -> Option<Vec<String>> {
        let cursor = self.deck.cursor();
        let staged = self.feed.queue();
        let shift = self
            .feed
            .items()
            .iter()
            .take(cursor)
            .filter(|item| staged.has(&item.id))
            .count();

        let snapshot = self.feed.begin_purge()?;
        self.purge_shift = Some((self.feed.generation(), shift));
        self.deck.seek(cursor - shift, self.feed.len());
        self.sync_deck();
        Some(snapshot)
    }

    pub fn finish_purge(&mut self, result: Result<(), StoreError>) -> PurgeOutcome {
        let outcome = self.feed.finish_purge(result);
        let shift = match self.purge_shift.take() {
            Some((generation, shift)) if generation == self.feed.generation() => shift,
            _ => 0,
        };
        if !outcome.failed_ids.is_empty() && shift > 0 {
            // The feed was restored; put the removed items back under the cursor
            self.deck.seek(self.deck.cursor() + shift, self.feed.len());
        }
        self.sync_deck();
        outcome
    }

    /// True while something needs the frame clock
    pub fn needs_frames(&self) -> bool {
        self.deck.is_animating() || self.feed.has_pending_load()
    }

    pub fn view(&self) -> DeckView<'_> {
        let items = self.feed.items();
        DeckView {
            current: self.deck.current(items),
            next: self.deck.next(items),
            position: self.deck.position(),
            signals: self.deck.signals(),
            phase: self.deck.phase(),
            cursor: self.deck.cursor(),
            total: items.len(),
            queue_count: self.feed.queue().len(),
            loading_initial: self.feed.is_loading_initial(),
            loading_more: self.feed.is_loading_more(),
            purging: self.feed.is_purging(),
            error: self.feed.error(),
        }
    }

    pub async fn refresh(&mut self, store: &dyn MediaStore) {
        let request = self.begin_refresh();
        let result = store.list_assets(&request).await;
        self.finish_refresh(result);
    }

    pub async fn purge(&mut self, store: &dyn MediaStore) -> PurgeOutcome {
        let Some(snapshot) = self.begin_purge() else {
            return PurgeOutcome::default();
        };
        let result = store.delete_assets(&snapshot).await;
        self.finish_purge(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::feed::tests::{page, ScriptedStore};

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.deck.viewport_width = 400.0;
        settings.feed.prefetch_margin = 2;
        settings
    }

    fn settle(session: &mut Session) -> Vec<DeckEvent> {
        let mut events = Vec::new();
        let now = Instant::now();
        for _ in 0..1000 {
            if !session.deck().is_animating() {
                break;
            }
            events.extend(session.tick(Duration::from_millis(16), now).events);
        }
        events
    }

    fn swipe(session: &mut Session, direction: Direction) {
        assert!(session.commit(direction));
        settle(session);
    }

    fn current_id(session: &Session) -> Option<String> {
        session.view().current.map(|item| item.id.clone())
    }

    #[tokio::test]
    async fn test_reject_stages_and_keep_does_not() {
        let store = ScriptedStore::default().with_page(Ok(page(&["a", "b", "c"], None, false)));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;

        swipe(&mut session, Direction::Right);
        swipe(&mut session, Direction::Left);

        assert_eq!(session.feed().queue().ids(), vec!["b"]);
        assert_eq!(current_id(&session).as_deref(), Some("c"));
        assert_eq!(session.view().queue_count, 1);
    }

    #[tokio::test]
    async fn test_undo_brings_back_rejected_card() {
        let store = ScriptedStore::default().with_page(Ok(page(&["a", "b"], None, false)));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;

        swipe(&mut session, Direction::Left);
        assert_eq!(session.undo().as_deref(), Some("a"));

        assert_eq!(current_id(&session).as_deref(), Some("a"));
        assert!(session.feed().queue().is_empty());
        assert_eq!(session.undo(), None);
    }

    #[tokio::test]
    async fn test_undo_is_refused_while_purging() {
        let store = ScriptedStore::default().with_page(Ok(page(&["a", "b", "c"], None, false)));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        swipe(&mut session, Direction::Left);
        swipe(&mut session, Direction::Left);

        let snapshot = session.begin_purge();
        assert_eq!(snapshot, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(session.undo(), None);
        assert_eq!(session.feed().queue().ids(), vec!["a", "b"]);

        let outcome = session.finish_purge(Ok(()));
        assert_eq!(outcome.success_ids, vec!["a", "b"]);
        assert!(session.feed().queue().is_empty());
        assert_eq!(current_id(&session).as_deref(), Some("c"));
        // Nothing left to undo once the batch is gone
        assert_eq!(session.undo(), None);
    }

    #[tokio::test]
    async fn test_purge_success_keeps_current_card() {
        let store = ScriptedStore::default()
            .with_page(Ok(page(&["a", "b", "c", "d"], None, false)))
            .with_delete(Ok(()));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        swipe(&mut session, Direction::Left);
        swipe(&mut session, Direction::Left);
        assert_eq!(current_id(&session).as_deref(), Some("c"));

        let outcome = session.purge(&store).await;

        assert_eq!(outcome.success_ids, vec!["a", "b"]);
        assert_eq!(session.feed().len(), 2);
        assert_eq!(session.deck().cursor(), 0);
        assert_eq!(current_id(&session).as_deref(), Some("c"));
        assert!(session.feed().queue().is_empty());
    }

    #[tokio::test]
    async fn test_purge_of_finished_deck_stays_exhausted() {
        let store = ScriptedStore::default()
            .with_page(Ok(page(&["a", "b", "c"], None, false)))
            .with_delete(Ok(()));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        swipe(&mut session, Direction::Left);
        swipe(&mut session, Direction::Left);
        swipe(&mut session, Direction::Right);
        assert!(session.view().is_exhausted());

        session.purge(&store).await;

        assert_eq!(session.feed().len(), 1);
        assert_eq!(session.deck().cursor(), 1);
        assert!(session.view().is_exhausted());
    }

    #[tokio::test]
    async fn test_purge_failure_keeps_deck_in_place() {
        let store = ScriptedStore::default()
            .with_page(Ok(page(&["a", "b", "c"], None, false)))
            .with_delete(Err(StoreError::Io("busy".into())));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        swipe(&mut session, Direction::Left);
        swipe(&mut session, Direction::Left);

        let outcome = session.purge(&store).await;

        assert_eq!(outcome.failed_ids, vec!["a", "b"]);
        assert_eq!(session.feed().len(), 3);
        assert_eq!(current_id(&session).as_deref(), Some("c"));
        assert!(session.view().error.is_some());
    }

    #[tokio::test]
    async fn test_refresh_resets_deck() {
        let store = ScriptedStore::default()
            .with_page(Ok(page(&["a", "b", "c"], None, false)))
            .with_page(Ok(page(&["x", "y"], None, false)));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        swipe(&mut session, Direction::Right);
        session.gesture(GestureEvent::Start(Vector2::new(0.0, 0.0)));
        session.gesture(GestureEvent::Move(Vector2::new(40.0, 0.0)));

        session.refresh(&store).await;

        assert_eq!(session.deck().cursor(), 0);
        assert_eq!(session.deck().phase(), DeckPhase::Idle);
        assert_eq!(current_id(&session).as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_prefetch_near_end_of_feed() {
        let store = ScriptedStore::default().with_page(Ok(page(&["a", "b", "c", "d", "e"], Some("t1"), true)));
        let mut session = Session::new(&settings());
        session.refresh(&store).await;
        let start = Instant::now();

        // 0 + 2 > 5 is false: far from the end
        assert!(!session.check_prefetch(start));

        for _ in 0..4 {
            swipe(&mut session, Direction::Right);
        }
        assert!(session.feed().has_pending_load());
        assert!(session.needs_frames());

        let tick = session.tick(Duration::from_millis(16), start + Duration::from_millis(400));
        assert!(tick.load.is_some());
        assert!(session.feed().is_loading_more());

        session.finish_load_more(Ok(page(&["f"], None, false)));
        assert_eq!(session.view().total, 6);
        assert!(!session.needs_frames());
    }

    #[test]
    fn test_start_without_access() {
        let mut session = Session::new(&settings());

        assert!(session.start(PermissionStatus::Denied).is_none());

        let view = session.view();
        assert!(!view.loading_initial);
        assert!(view.is_exhausted());
        assert!(matches!(view.error, Some(TriageError::Permission(_))));
    }

    #[test]
    fn test_start_with_limited_access() {
        let mut session = Session::new(&settings());
        let request = session.start(PermissionStatus::Limited);
        assert_eq!(request.map(|r| r.page_size), Some(200));
    }
}
