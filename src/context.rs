use std::any::Any;
use std::sync::Arc;

use crate::baton::{Baton, Suspend};
use crate::message::Message;
use crate::pool::{ActorId, PoolInner};

/// The handle an actor body uses to act: its own id, the three suspension
/// primitives (`recv`, `park`, `backoff`), and `send`/`hatch`.
///
/// A `Context` is only ever valid on the actor's own dedicated thread; it
/// is created right before the body runs and never escapes it (the body
/// receives `&Context`, not an owned one, and the closures `hatch` accepts
/// must be `'static` precisely so a newly-hatched actor cannot reach back
/// into a `Context` it does not own).
pub struct Context {
    id: ActorId,
    pool: Arc<PoolInner>,
    baton: Arc<Baton>,
}

impl Context {
    pub(crate) fn new(id: ActorId, pool: Arc<PoolInner>, baton: Arc<Baton>) -> Self {
        Context { id, pool, baton }
    }

    /// This actor's id.
    pub fn myself(&self) -> ActorId {
        self.id
    }

    /// Isolated send: `msg` is consumed by value (`Send + 'static`), so the
    /// type system enforces the no-live-alias contract before the runtime
    /// is ever involved. Returns immediately; silently dropped if `dst`
    /// has already terminated.
    pub fn send<T: Any + Send>(&self, dst: ActorId, msg: T) {
        self.pool.send_user(self.id, dst, msg);
    }

    /// Spawn a child actor; its `parent_id` is this actor's id, so it will
    /// receive a `Died` notification when the child terminates.
    pub fn hatch<F>(&self, body: F) -> ActorId
    where
        F: FnOnce(&Context) + Send + 'static,
    {
        self.pool.hatch_internal(self.id, Box::new(body))
    }

    /// `recv_yield` + `recv_get`: block until a message is available, then
    /// return it. Tolerates spurious wakes by re-checking the mailbox in a
    /// loop rather than trusting a single wake to mean "a message is ready".
    ///
    /// This thread only ever inspects its own mailbox by value (`try_pop`);
    /// it never touches `IdleSet`/`WorkQueue` itself. Whether to actually
    /// park is decided by the worker after `suspend_and_await` returns
    /// control here, which is why a non-empty mailbox can still show up on
    /// the next loop iteration even though nothing here parked it.
    pub fn recv(&self) -> Message {
        loop {
            if let Some(msg) = self.pool.try_pop(self.id) {
                return msg;
            }
            self.baton.suspend_and_await(Suspend::RecvBlock);
        }
    }

    /// `jield`: park unconditionally. Only useful once some other mechanism
    /// (ordinarily a `send`) is guaranteed to move this actor back to
    /// `WorkQueue` later.
    pub fn park(&self) {
        self.baton.suspend_and_await(Suspend::Park);
    }

    /// Re-enqueue at the tail of `WorkQueue`, yielding the worker to
    /// another runnable actor. Used for voluntary fairness.
    pub fn backoff(&self) {
        self.baton.suspend_and_await(Suspend::Backoff);
    }
}
