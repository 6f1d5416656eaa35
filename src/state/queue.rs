/// Deletion queue
///
/// Staged item ids live in a single insertion-ordered set, so membership
/// and undo order can never disagree.

use indexmap::IndexSet;

/// Ordered set of item ids staged for deletion.
///
/// Membership is O(1); the last enqueued id is popped first on undo.
#[derive(Debug, Clone, Default)]
pub struct DeletionQueue {
    staged: IndexSet<String>,
    /// Bumped once per call that changed the queue
    revision: u64,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged ids
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Check whether an id is staged
    pub fn has(&self, id: &str) -> bool {
        self.staged.contains(id)
    }

    /// Staged ids in enqueue order (oldest first)
    pub fn ids(&self) -> Vec<String> {
        self.staged.iter().cloned().collect()
    }

    /// Change counter for observers; one bump per state notification
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stage an id. Returns false if it was already staged.
    pub fn enqueue(&mut self, id: impl Into<String>) -> bool {
        let added = self.staged.insert(id.into());
        if added {
            self.revision += 1;
        }
        added
    }

    /// Stage several ids with a single notification.
    /// Returns how many were newly added.
    pub fn enqueue_many<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for id in ids {
            if self.staged.insert(id.into()) {
                added += 1;
            }
        }
        if added > 0 {
            self.revision += 1;
        }
        added
    }

    /// Pop the most recently staged id (the undo primitive)
    pub fn dequeue_last(&mut self) -> Option<String> {
        let last = self.staged.pop()?;
        self.revision += 1;
        Some(last)
    }

    /// Remove an arbitrary id, keeping the order of the others
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.staged.shift_remove(id);
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Remove several ids with a single notification.
    /// Returns how many were staged.
    pub fn remove_many<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut removed = 0;
        for id in ids {
            if self.staged.shift_remove(id.as_str()) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.revision += 1;
        }
        removed
    }

    /// Drop every staged id
    pub fn clear(&mut self) {
        if !self.staged.is_empty() {
            self.staged.clear();
            self.revision += 1;
        }
    }
}
