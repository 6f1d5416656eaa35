/// Asset feed and deletion queue manager
///
/// Owns the ordered feed fetched from the media store, the seen-set used
/// to drop duplicates across pages, pagination state, the deletion queue
/// and the purge operation.
///
/// Every async operation is split in two synchronous halves: `begin_*`
/// validates, raises the busy flag and returns the store request, and
/// `finish_*` reconciles the store's answer and lowers the flag. The
/// `refresh`, `load_more` and `purge` helpers run both halves around the
/// store call.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::data::{AssetPage, Item, ListRequest, PageToken, PurgeOutcome};
use super::gate::LoadMoreGate;
use super::optimistic::Optimistic;
use super::queue::DeletionQueue;
use crate::config::FeedConfig;
use crate::error::{StoreError, TriageError};
use crate::store::MediaStore;

/// Overall feed activity, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    LoadingInitial,
    LoadingMore,
    Purging,
    Ready,
}

/// Purge waiting for the store's answer
#[derive(Debug)]
struct PendingPurge {
    snapshot: Vec<String>,
    update: Optimistic<Vec<Item>>,
    /// Feed generation the removal was applied to
    generation: u64,
}

#[derive(Debug)]
pub struct AssetFeed {
    config: FeedConfig,
    album: Option<String>,

    items: Vec<Item>,
    seen: HashSet<String>,
    end_token: Option<PageToken>,
    has_more: bool,
    /// Bumped on every successful refresh
    generation: u64,

    queue: DeletionQueue,

    loaded_once: bool,
    loading_initial: bool,
    /// Generation the in-flight page belongs to
    loading_more: Option<u64>,
    pending_purge: Option<PendingPurge>,
    gate: LoadMoreGate,

    error: Option<TriageError>,
}

impl AssetFeed {
    pub fn new(config: FeedConfig) -> Self {
        let gate = LoadMoreGate::new(config.load_more_cooldown());
        Self {
            config,
            album: None,
            items: Vec::new(),
            seen: HashSet::new(),
            end_token: None,
            has_more: true,
            generation: 0,
            queue: DeletionQueue::new(),
            loaded_once: false,
            loading_initial: true,
            loading_more: None,
            pending_purge: None,
            gate,
            error: None,
        }
    }

    /// Restrict listing to one album
    pub fn set_album(&mut self, album: Option<String>) {
        self.album = album;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Feed identity; changes whenever the list is replaced wholesale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn end_token(&self) -> Option<&PageToken> {
        self.end_token.as_ref()
    }

    pub fn queue(&self) -> &DeletionQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut DeletionQueue {
        &mut self.queue
    }

    pub fn is_loading_initial(&self) -> bool {
        self.loading_initial
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more.is_some()
    }

    pub fn is_purging(&self) -> bool {
        self.pending_purge.is_some()
    }

    pub fn status(&self) -> FeedStatus {
        if self.loading_initial {
            FeedStatus::LoadingInitial
        } else if self.is_loading_more() {
            FeedStatus::LoadingMore
        } else if self.is_purging() {
            FeedStatus::Purging
        } else {
            FeedStatus::Ready
        }
    }

    pub fn error(&self) -> Option<&TriageError> {
        self.error.as_ref()
    }

    pub fn reset_error(&mut self) {
        self.error = None;
    }

    fn list_request(&self, after: Option<PageToken>) -> ListRequest {
        ListRequest {
            page_size: self.config.page_size,
            after,
            kinds: self.config.kinds.clone(),
            sort: self.config.sort,
            album: self.album.clone(),
        }
    }

    // ========== Refresh ==========

    /// Start loading the first page
    pub fn begin_refresh(&mut self) -> ListRequest {
        if !self.loaded_once {
            self.loading_initial = true;
        }
        self.error = None;
        self.list_request(None)
    }

    /// Replace the feed with a freshly fetched first page
    pub fn finish_refresh(&mut self, result: Result<AssetPage, StoreError>) {
        self.loading_initial = false;
        match result {
            Ok(page) => {
                self.seen.clear();
                self.items.clear();
                for item in page.items {
                    if self.seen.insert(item.id.clone()) {
                        self.items.push(item);
                    }
                }
                self.end_token = page.end_token;
                self.has_more = page.has_more;
                self.generation += 1;
                self.loaded_once = true;
                info!(count = self.items.len(), has_more = self.has_more, "loaded");
            }
            Err(err) => {
                warn!(error = %err, "refresh failed");
                self.error = Some(TriageError::Fetch(err));
            }
        }
    }

    /// The store cannot be read; give up on the initial load
    pub fn deny_access(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%reason, "media store not readable");
        self.loading_initial = false;
        self.error = Some(TriageError::Permission(reason));
    }

    // ========== Pagination ==========

    fn can_load_more(&self) -> bool {
        self.loading_more.is_none() && self.has_more && self.end_token.is_some()
    }

    /// Start loading the next page, or None if a load is in flight
    /// or there is nothing left to fetch
    pub fn begin_load_more(&mut self) -> Option<ListRequest> {
        if !self.can_load_more() {
            return None;
        }
        self.loading_more = Some(self.generation);
        Some(self.list_request(self.end_token.clone()))
    }

    /// Append the next page, skipping ids already in the feed.
    /// Returns how many items were added.
    pub fn finish_load_more(&mut self, result: Result<AssetPage, StoreError>) -> usize {
        let Some(generation) = self.loading_more.take() else {
            return 0;
        };
        if generation != self.generation {
            debug!("dropping page fetched before the last refresh");
            return 0;
        }
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, "load more failed");
                self.error = Some(TriageError::Fetch(err));
                return 0;
            }
        };

        let before = self.items.len();
        for item in page.items {
            if self.seen.insert(item.id.clone()) {
                // A failed purge must not drop pages that arrived meanwhile
                if let Some(pending) = &mut self.pending_purge {
                    pending.update.previous_mut().push(item.clone());
                }
                self.items.push(item);
            }
        }
        self.end_token = page.end_token;
        self.has_more = page.has_more;

        let added = self.items.len() - before;
        info!(added, has_more = self.has_more, "load_more");
        added
    }

    /// Register a prefetch trigger; bursts within the cooldown collapse
    pub fn request_load_more(&mut self, now: Instant) -> bool {
        if !self.can_load_more() {
            return false;
        }
        self.gate.request(now)
    }

    /// Start the coalesced load once its cooldown has elapsed
    pub fn poll_load_more(&mut self, now: Instant) -> Option<ListRequest> {
        if self.gate.poll(now) {
            self.begin_load_more()
        } else {
            None
        }
    }

    pub fn has_pending_load(&self) -> bool {
        self.gate.is_pending()
    }

    /// Drop a coalesced request that has not fired yet (e.g. on teardown)
    pub fn cancel_pending_load(&mut self) -> bool {
        self.gate.cancel()
    }

    // ========== Purge ==========

    /// Snapshot the queue and optimistically drop those items from the feed.
    ///
    /// Returns the ids to delete, or None when the queue is empty or a
    /// purge is already in flight.
    pub fn begin_purge(&mut self) -> Option<Vec<String>> {
        if self.pending_purge.is_some() {
            debug!("purge already in flight");
            return None;
        }
        let snapshot = self.queue.ids();
        if snapshot.is_empty() {
            return None;
        }

        let doomed: HashSet<&str> = snapshot.iter().map(String::as_str).collect();
        let update = Optimistic::apply(&mut self.items, |items| {
            items
                .iter()
                .filter(|item| !doomed.contains(item.id.as_str()))
                .cloned()
                .collect()
        });

        self.pending_purge = Some(PendingPurge {
            snapshot: snapshot.clone(),
            update,
            generation: self.generation,
        });
        Some(snapshot)
    }

    /// Reconcile the batch delete with the optimistic feed
    pub fn finish_purge(&mut self, result: Result<(), StoreError>) -> PurgeOutcome {
        let Some(PendingPurge { snapshot, update, generation }) = self.pending_purge.take() else {
            return PurgeOutcome::default();
        };

        match result {
            Ok(()) => {
                update.commit();
                self.queue.remove_many(&snapshot);
                info!(count = snapshot.len(), "purge");
                PurgeOutcome {
                    success_ids: snapshot,
                    failed_ids: Vec::new(),
                }
            }
            Err(err) => {
                if generation == self.generation {
                    update.rollback(&mut self.items);
                } else {
                    // A refresh replaced the feed; there is nothing to restore
                    update.commit();
                }
                warn!(error = %err, count = snapshot.len(), "purge failed");
                self.error = Some(TriageError::Delete(err));
                PurgeOutcome {
                    success_ids: Vec::new(),
                    failed_ids: snapshot,
                }
            }
        }
    }

    // ========== Async helpers ==========

    pub async fn refresh(&mut self, store: &dyn MediaStore) {
        let request = self.begin_refresh();
        let result = store.list_assets(&request).await;
        self.finish_refresh(result);
    }

    pub async fn load_more(&mut self, store: &dyn MediaStore) -> usize {
        let Some(request) = self.begin_load_more() else {
            return 0;
        };
        let result = store.list_assets(&request).await;
        self.finish_load_more(result)
    }

    pub async fn purge(&mut self, store: &dyn MediaStore) -> PurgeOutcome {
        let Some(snapshot) = self.begin_purge() else {
            return PurgeOutcome::default();
        };
        let result = store.delete_assets(&snapshot).await;
        self.finish_purge(result)
    }
}
