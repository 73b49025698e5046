use std::collections::{HashSet, VecDeque};
use std::sync::{Condvar, Mutex};

use crate::pool::ActorId;

struct Inner {
    /// FIFO deque of actors that are runnable.
    queue: VecDeque<ActorId>,
    /// Actors parked awaiting mail (or an external wake). An id here is
    /// never also in `queue` and never in flight on a worker.
    idle: HashSet<ActorId>,
    stopping: bool,
}

/// `WorkQueue` + `IdleSet`, guarded by one `work_lock`/`work_cond` pair:
/// every move of an actor id between runnable and parked happens under
/// the same lock, so a `send` racing a `recv_yield` can never produce a
/// lost wakeup.
pub(crate) struct Scheduler {
    inner: Mutex<Inner>,
    cond: Condvar,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                idle: HashSet::new(),
                stopping: false,
            }),
            cond: Condvar::new(),
        }
    }
}

impl Scheduler {
    /// Push `id` onto the tail of `WorkQueue` and wake one worker. Used by
    /// `hatch`, `backoff`, and by `send` when it moves a parked actor back
    /// to runnable.
    pub(crate) fn push_runnable(&self, id: ActorId) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.push_back(id);
        self.cond.notify_one();
    }

    /// Insert `id` into `IdleSet`. Called by the actor's own thread while
    /// it still holds the baton, immediately before it blocks on its
    /// per-actor rendezvous -- so by the time the worker observes the
    /// resume slice has ended, `id` is already parked and visible to any
    /// concurrent `send`.
    pub(crate) fn park(&self, id: ActorId) {
        let mut inner = self.inner.lock().unwrap();
        inner.idle.insert(id);
    }

    /// If `id` is parked, move it back to `WorkQueue` and wake one worker.
    /// Returns whether a wake happened. Called by `send` immediately after
    /// the message has been enqueued in the destination's mailbox, so the
    /// enqueue happens-before this probe and no wakeup can be lost.
    pub(crate) fn wake_if_idle(&self, id: ActorId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.idle.remove(&id) {
            inner.queue.push_back(id);
            self.cond.notify_one();
            true
        } else {
            false
        }
    }

    /// Block until an actor is runnable or the scheduler is stopping.
    /// Returns `None` only once the queue is drained and `stopping` is set.
    pub(crate) fn pop_blocking(&self) -> Option<ActorId> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(id) = inner.queue.pop_front() {
                return Some(id);
            }
            if inner.stopping {
                return None;
            }
            inner = self.cond.wait(inner).unwrap();
        }
    }

    /// Set `stopping` and wake every worker blocked in `pop_blocking`.
    pub(crate) fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.stopping = true;
        self.cond.notify_all();
    }

    /// Actors still parked when the pool stops. They leak: the pool makes
    /// no attempt to wake or drop their dedicated threads, since user code
    /// is expected to arrange for every actor to eventually be woken or to
    /// finish on its own.
    pub(crate) fn idle_ids(&self) -> Vec<ActorId> {
        self.inner.lock().unwrap().idle.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn park_then_wake_moves_to_runnable() {
        let sched = Scheduler::default();
        sched.park(1);
        assert!(sched.wake_if_idle(1));
        assert_eq!(sched.pop_blocking(), Some(1));
    }

    #[test]
    fn wake_of_non_idle_is_noop() {
        let sched = Scheduler::default();
        assert!(!sched.wake_if_idle(99));
    }

    #[test]
    fn stop_unblocks_pop() {
        let sched = Scheduler::default();
        sched.stop();
        assert_eq!(sched.pop_blocking(), None);
    }

    #[test]
    fn runnable_before_idle_preserves_fifo() {
        let sched = Scheduler::default();
        sched.push_runnable(1);
        sched.push_runnable(2);
        assert_eq!(sched.pop_blocking(), Some(1));
        assert_eq!(sched.pop_blocking(), Some(2));
    }
}
