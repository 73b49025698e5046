use std::sync::{Condvar, Mutex};

use crate::pool::ActorId;

/// Why an actor's resume slice ended.
///
/// This is the concrete realization of the `resume() -> next_actor_or_null,
/// is_finished` contract: the three non-`Finished` variants all correspond
/// to "returned value is null", and each names the scheduler-visible
/// transition the *worker* must still perform now that the resume slice has
/// observably ended (the actor thread itself makes no scheduler-visible
/// change before handing the baton back -- see `suspend_and_await`).
/// `Finished` corresponds to "returned value is non-null and `is_finished`".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Suspend {
    /// The actor's mailbox was empty on its last check. The worker must
    /// re-check under the mailbox lock: if still empty, park in `IdleSet`;
    /// otherwise re-enqueue as runnable.
    RecvBlock,
    /// Unconditional park (`jield`). The worker parks the actor in
    /// `IdleSet` outright.
    Park,
    /// Voluntary yield (`backoff`). The worker re-enqueues the actor at
    /// the tail of `WorkQueue`.
    Backoff,
    Finished,
}

struct State {
    running: bool,
    last_suspend: Option<Suspend>,
}

/// The per-actor rendezvous that stands in for a resumable continuation.
///
/// Each hatched actor owns one dedicated OS thread that runs its body
/// straight-line. A `Baton` is the only thing shared between that thread
/// and whichever worker currently holds the actor's id: the worker flips
/// `running` to `true` and waits for it to go back to `false`; the actor
/// thread waits for `running` to become `true`, runs until it calls
/// `recv`/`park`/`backoff` (or returns), flips `running` back to `false`
/// with the reason recorded, and blocks again. Exactly one side is ever
/// runnable at a time, so a single actor is never resumed on two workers
/// simultaneously and the worker never touches the actor's call stack.
pub(crate) struct Baton {
    pub(crate) id: ActorId,
    pub(crate) parent_id: ActorId,
    state: Mutex<State>,
    cond: Condvar,
}

impl Baton {
    pub(crate) fn new(id: ActorId, parent_id: ActorId) -> Self {
        Baton {
            id,
            parent_id,
            state: Mutex::new(State {
                running: false,
                last_suspend: None,
            }),
            cond: Condvar::new(),
        }
    }

    /// Worker side: hand the baton to the actor thread and block until it
    /// suspends or finishes. This is the one non-preemptible "resume slice"
    /// from the worker's point of view.
    pub(crate) fn resume(&self) -> Suspend {
        let mut state = self.state.lock().unwrap();
        debug_assert!(!state.running);
        state.running = true;
        state.last_suspend = None;
        self.cond.notify_all();
        while state.running {
            state = self.cond.wait(state).unwrap();
        }
        state.last_suspend.take().unwrap()
    }

    /// Actor-thread side: block until a worker grants the baton. Called
    /// once before the body starts, and once after each suspension.
    pub(crate) fn await_run(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.running {
            state = self.cond.wait(state).unwrap();
        }
    }

    /// Actor-thread side: hand the baton back with a reason and block until
    /// granted again. The caller must make **no** scheduler-visible change
    /// (no `IdleSet`/`WorkQueue` insertion) before calling this -- doing so
    /// would let a second worker observe the id as runnable and call
    /// `resume` while this resume slice (and the `while state.running` wait
    /// above) is still in progress. Scheduler-visible transitions are the
    /// resuming worker's job, performed only after `resume` returns below,
    /// by which point `running` is already `false` and this thread is
    /// safely blocked in `await_run`.
    pub(crate) fn suspend_and_await(&self, reason: Suspend) {
        {
            let mut state = self.state.lock().unwrap();
            state.running = false;
            state.last_suspend = Some(reason);
            self.cond.notify_all();
        }
        self.await_run();
    }

    /// Actor-thread side: the body returned. No further `await_run` -- the
    /// actor's dedicated thread exits right after this call.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.running = false;
        state.last_suspend = Some(Suspend::Finished);
        self.cond.notify_all();
    }
}
