use std::collections::HashMap;
use tokio::sync::{Mutex, Notify};

struct QueueState<T> {
    next_expected: usize,
    slots: HashMap<usize, T>,
}

impl<T> QueueState<T> {
    fn new(next_expected: usize) -> Self {
        Self {
            next_expected,
            slots: HashMap::new(),
        }
    }
}

/// Async queue that only releases slotted values in ascending position order.
///
/// Resolutions for the ordered subset land here as they finish, in any order;
/// the single consumer pops them strictly by position.
pub struct ApplyQueue<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

impl<T> ApplyQueue<T> {
    pub fn new() -> Self {
        Self::with_start(0)
    }

    pub fn with_start(next_expected: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::new(next_expected)),
            notify: Notify::new(),
        }
    }

    pub async fn push(&self, position: usize, value: T) {
        let mut state = self.state.lock().await;
        state.slots.insert(position, value);
        drop(state);
        self.notify.notify_waiters();
    }

    pub async fn pop_next(&self) -> T {
        loop {
            if let Some(value) = self.try_pop_next().await {
                return value;
            }
            #[cfg(test)]
            {
                test_hooks::pause_in_gap().await;
            }
            let notified = self.notify.notified();
            if let Some(value) = self.try_pop_next().await {
                return value;
            }
            notified.await;
        }
    }

    pub async fn try_pop_next(&self) -> Option<T> {
        let mut state = self.state.lock().await;
        let expected = state.next_expected;
        let value = state.slots.remove(&expected);
        if value.is_some() {
            state.next_expected += 1;
        }
        value
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.slots.is_empty()
    }

    pub async fn next_expected(&self) -> usize {
        self.state.lock().await.next_expected
    }
}

impl<T> Default for ApplyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
