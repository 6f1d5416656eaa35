/// Optimistic updates with rollback
///
/// Compute the next state, apply it right away, attempt the side effect,
/// and put the captured previous state back if the side effect fails.

/// A state change that has been applied but not yet confirmed.
#[derive(Debug)]
#[must_use = "an optimistic update must be committed or rolled back"]
pub struct Optimistic<T> {
    previous: T,
}

impl<T: Clone> Optimistic<T> {
    /// Replace `target` with `next(target)` and remember what it was
    pub fn apply(target: &mut T, next: impl FnOnce(&T) -> T) -> Self {
        let updated = next(target);
        let previous = std::mem::replace(target, updated);
        Self { previous }
    }
}

impl<T> Optimistic<T> {
    /// Amend the captured state with changes that must survive a rollback
    pub fn previous_mut(&mut self) -> &mut T {
        &mut self.previous
    }

    /// The side effect succeeded; keep the new state
    pub fn commit(self) {}

    /// The side effect failed; restore the captured state verbatim
    pub fn rollback(self, target: &mut T) {
        *target = self.previous;
    }

    /// Settle the update from the side effect's result
    pub fn settle<E>(self, target: &mut T, result: &Result<(), E>) {
        match result {
            Ok(()) => self.commit(),
            Err(_) => self.rollback(target),
        }
    }
}
