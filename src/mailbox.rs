use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::RuntimeError;
use crate::message::Message;
use crate::pool::ActorId;
use crate::sched::Scheduler;

/// A FIFO queue of messages for one actor, internally synchronized.
///
/// A plain per-actor FIFO queue; no scheduling flag or system-message
/// side channel, since this runtime has no actor-restart protocol to
/// support.
#[derive(Default)]
struct Mailbox {
    queue: Mutex<VecDeque<Message>>,
}

impl Mailbox {
    fn push(&self, msg: Message) -> usize {
        let mut q = self.queue.lock().unwrap();
        q.push_back(msg);
        q.len()
    }

    fn try_pop(&self) -> Option<Message> {
        self.queue.lock().unwrap().pop_front()
    }

    /// `recv_yield`: atomically (with respect to concurrent `push`) check
    /// for an empty mailbox and, if empty, park `id` in the scheduler's
    /// `IdleSet` before releasing the mailbox lock. Holding the mailbox
    /// lock across both the check and the park registration is what closes
    /// the park/wake race: a concurrent `push` either lands before this
    /// check (so we observe non-empty and don't park) or is blocked on
    /// this same lock until after we've parked, so its subsequent
    /// `IdleSet` probe is guaranteed to find us.
    fn park_if_empty(&self, id: ActorId, sched: &Scheduler) -> bool {
        let q = self.queue.lock().unwrap();
        if q.is_empty() {
            sched.park(id);
            true
        } else {
            false
        }
    }
}

/// The index mapping `ActorId -> Mailbox`, guarded by its own lock.
///
/// Presence in the hub is the authoritative liveness signal: the
/// supervision loop in [`crate::Pool::run`] polls `len()` to decide when
/// every actor has terminated.
#[derive(Default)]
pub(crate) struct MailHub {
    index: Mutex<HashMap<ActorId, Arc<Mailbox>>>,
}

impl MailHub {
    pub(crate) fn register(&self, id: ActorId) -> Result<(), RuntimeError> {
        let mut index = self.index.lock().unwrap();
        if index.contains_key(&id) {
            return Err(RuntimeError::AlreadyRegistered(id));
        }
        index.insert(id, Arc::new(Mailbox::default()));
        Ok(())
    }

    /// Drops the mailbox and any messages still queued in it. Only the
    /// worker that observed the actor's termination may call this.
    /// `NotRegistered` signals the internal invariant breach of a double
    /// unregister (each id should be finalized by its worker exactly
    /// once); callers treat it as a fatal process error, per the error
    /// taxonomy.
    pub(crate) fn unregister(&self, id: ActorId) -> Result<(), RuntimeError> {
        match self.index.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::NotRegistered(id)),
        }
    }

    fn lookup(&self, id: ActorId) -> Option<Arc<Mailbox>> {
        self.index.lock().unwrap().get(&id).cloned()
    }

    /// Appends `msg` to `dst`'s mailbox. Returns the mailbox depth after
    /// enqueue if `dst` is live, or `None` if `dst` is absent -- dropping
    /// the message silently is not an error, it is a race the runtime
    /// tolerates (the destination may have just terminated).
    pub(crate) fn deliver(&self, dst: ActorId, msg: Message) -> Option<usize> {
        self.lookup(dst).map(|mbox| mbox.push(msg))
    }

    pub(crate) fn try_pop(&self, id: ActorId) -> Option<Message> {
        self.lookup(id).and_then(|mbox| mbox.try_pop())
    }

    /// See [`Mailbox::park_if_empty`]. `false` if `id` has no mailbox (the
    /// actor already terminated, which should not happen this soon after
    /// its resume slice ended) or if the mailbox was non-empty.
    pub(crate) fn park_if_empty(&self, id: ActorId, sched: &Scheduler) -> bool {
        match self.lookup(id) {
            Some(mbox) => mbox.park_if_empty(id, sched),
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.lock().unwrap().len()
    }
}
