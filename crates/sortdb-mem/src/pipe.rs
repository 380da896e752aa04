//! Bounded blocking pipe with an explicit end-of-stream signal.
//!
//! One producer inserts, one consumer removes. `insert` blocks while the pipe
//! is full; `remove` blocks while it is empty. After `shut_down`, removers
//! drain whatever is still buffered and then observe `None`.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct State<T> {
    q: VecDeque<T>,
    shut_down: bool,
}

pub struct Pipe<T> {
    cap: usize,
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> Pipe<T> {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            state: Mutex::new(State {
                q: VecDeque::with_capacity(cap),
                shut_down: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    // A panicking peer must not wedge the other side; the queue itself is
    // always left consistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until there is room, then enqueue. After shutdown the item is
    /// handed back instead.
    pub fn insert(&self, item: T) -> Result<(), T> {
        let mut st = self.lock();
        while st.q.len() >= self.cap && !st.shut_down {
            st = self.not_full.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        if st.shut_down {
            return Err(item);
        }
        st.q.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until an item is available or the pipe is shut down and drained.
    pub fn remove(&self) -> Option<T> {
        let mut st = self.lock();
        loop {
            if let Some(item) = st.q.pop_front() {
                drop(st);
                self.not_full.notify_one();
                return Some(item);
            }
            if st.shut_down {
                return None;
            }
            st = self.not_empty.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark that no further inserts will happen and wake every waiter.
    pub fn shut_down(&self) {
        self.lock().shut_down = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    pub fn len(&self) -> usize {
        self.lock().q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().q.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Iterate over removed items until end-of-stream.
    pub fn drain(&self) -> Drain<'_, T> {
        Drain { pipe: self }
    }
}

pub struct Drain<'a, T> {
    pipe: &'a Pipe<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pipe.remove()
    }
}
