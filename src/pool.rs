use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, debug_span, trace};

use crate::baton::{Baton, Suspend};
use crate::config::Config;
use crate::context::Context;
use crate::mailbox::MailHub;
use crate::message::Message;
use crate::sched::Scheduler;

/// A monotonically-increasing positive integer assigned at hatch time.
/// `0` is reserved (see [`crate::SYSTEM`]) and is never assigned to an
/// actor.
pub type ActorId = u64;

#[cfg(unix)]
type WakeFd = std::os::unix::io::RawFd;
#[cfg(not(unix))]
type WakeFd = i32;

pub(crate) struct PoolInner {
    sched: Scheduler,
    mailhub: MailHub,
    actors: Mutex<HashMap<ActorId, Arc<Baton>>>,
    next_id: AtomicU64,
    config: Config,
    event_queue_actor_id: Mutex<Option<ActorId>>,
    event_wake_fd: Mutex<Option<WakeFd>>,
}

impl PoolInner {
    fn worker_loop(self: &Arc<Self>, worker_idx: usize) {
        loop {
            let id = {
                let _wait = debug_span!("worker.wait", worker = worker_idx).entered();
                self.sched.pop_blocking()
            };
            let id = match id {
                Some(id) => id,
                None => break,
            };

            let baton = self.actors.lock().unwrap().get(&id).cloned();
            let baton = match baton {
                Some(b) => b,
                // The actor finished (or was never registered) between
                // being enqueued and being popped; nothing to resume.
                None => continue,
            };

            let suspend = {
                let _run = debug_span!("worker.run", worker = worker_idx, actor = id).entered();
                baton.resume()
            };

            // `resume()` has returned, so `running` is already false and
            // the actor thread (if not finished) is blocked in `await_run`.
            // Only now is it safe to make `id` visible to other workers
            // again -- doing it any earlier would let a second worker pop
            // `id` and call `resume` while this resume slice was still in
            // progress.
            match suspend {
                Suspend::RecvBlock => self.resolve_recv_block(id),
                Suspend::Park => self.sched.park(id),
                Suspend::Backoff => self.sched.push_runnable(id),
                Suspend::Finished => self.finalize(id, baton.parent_id),
            }
        }
    }

    /// The actor found its mailbox empty and handed back control without
    /// parking itself. Re-check under the mailbox's own lock: if a message
    /// arrived in the meantime, re-enqueue as runnable instead of parking,
    /// closing the same park/wake race `Mailbox::park_if_empty` was built
    /// for, just invoked here instead of on the actor's own thread.
    fn resolve_recv_block(&self, id: ActorId) {
        if !self.mailhub.park_if_empty(id, &self.sched) {
            self.sched.push_runnable(id);
        }
    }

    fn finalize(&self, id: ActorId, parent_id: ActorId) {
        self.mailhub
            .unregister(id)
            .expect("worker observed this actor's termination exactly once");
        self.actors.lock().unwrap().remove(&id);
        trace!(actor = id, "actor terminated");
        if parent_id != crate::SYSTEM {
            self.deliver_and_wake(parent_id, Message::died(id));
        }
    }

    pub(crate) fn hatch_internal(
        self: &Arc<Self>,
        parent_id: ActorId,
        body: Box<dyn FnOnce(&Context) + Send>,
    ) -> ActorId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.mailhub
            .register(id)
            .expect("the id counter assigns every id exactly once");

        let baton = Arc::new(Baton::new(id, parent_id));
        self.actors.lock().unwrap().insert(id, baton.clone());

        let pool = self.clone();
        let thread_baton = baton.clone();
        thread::spawn(move || {
            thread_baton.await_run();
            let cx = Context::new(id, pool, thread_baton.clone());
            body(&cx);
            thread_baton.finish();
        });

        self.sched.push_runnable(id);
        debug!(actor = id, parent = parent_id, "actor hatched");
        id
    }

    pub(crate) fn send_user<T: Any + Send>(&self, src: ActorId, dst: ActorId, msg: T) {
        self.deliver_and_wake(dst, Message::user(src, msg));
    }

    fn deliver_and_wake(&self, dst: ActorId, msg: Message) {
        if let Some(len) = self.mailhub.deliver(dst, msg) {
            trace!(actor = dst, mailbox_len = len, "mailbox depth");
            self.sched.wake_if_idle(dst);
            let is_event_actor = *self.event_queue_actor_id.lock().unwrap() == Some(dst);
            if is_event_actor {
                if let Some(fd) = *self.event_wake_fd.lock().unwrap() {
                    write_wake_byte(fd);
                }
            }
        }
    }

    pub(crate) fn try_pop(&self, id: ActorId) -> Option<Message> {
        self.mailhub.try_pop(id)
    }
}

#[cfg(unix)]
fn write_wake_byte(fd: WakeFd) {
    use std::io::Write;
    use std::os::unix::io::FromRawFd;

    // SAFETY: `fd` is a descriptor the caller handed us for this exact
    // purpose (see `Pool::set_event_wake_fd`); we do not own it, so we must
    // relinquish it again via `into_raw_fd` rather than letting `File`'s
    // `Drop` close it.
    let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
    // `write_all` retries internally on `ErrorKind::Interrupted` (EINTR);
    // any other failure is tolerated per the best-effort contract.
    let _ = file.write_all(b"x");
    std::mem::forget(file);
}

#[cfg(not(unix))]
fn write_wake_byte(_fd: WakeFd) {}

/// Owns the worker threads, the mailbox hub, and the scheduler state. Create
/// one `Pool` per application; it is destroyed when [`Pool::run`] returns.
pub struct Pool {
    inner: Arc<PoolInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Pool {
    /// Construct a pool with `n_workers` worker threads and the default
    /// configuration.
    pub fn new(n_workers: usize) -> Self {
        Self::with_config(n_workers, Config::default())
    }

    /// Construct a pool sized and paced entirely from `config` (worker
    /// count and supervision tick interval).
    pub fn from_config(config: Config) -> Self {
        let n_workers = config.workers;
        Self::with_config(n_workers, config)
    }

    /// Construct a pool with `n_workers` worker threads, using `config` for
    /// the supervision tick interval.
    pub fn with_config(n_workers: usize, config: Config) -> Self {
        let inner = Arc::new(PoolInner {
            sched: Scheduler::default(),
            mailhub: MailHub::default(),
            actors: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
            event_queue_actor_id: Mutex::new(None),
            event_wake_fd: Mutex::new(None),
        });

        let mut workers = Vec::with_capacity(n_workers);
        for idx in 0..n_workers {
            let worker_inner = inner.clone();
            workers.push(thread::spawn(move || worker_inner.worker_loop(idx)));
        }

        Pool {
            inner,
            workers: Mutex::new(workers),
        }
    }

    /// Register the reserved actor id and file descriptor that `send`
    /// writes a wake byte to on every delivered message: at-least-one
    /// byte per burst, not a message channel.
    #[cfg(unix)]
    pub fn set_event_wake(&self, actor_id: ActorId, fd: std::os::unix::io::RawFd) {
        *self.inner.event_queue_actor_id.lock().unwrap() = Some(actor_id);
        *self.inner.event_wake_fd.lock().unwrap() = Some(fd);
    }

    /// Spawn an actor from outside any actor; its `parent_id` is `0`, so no
    /// `Died` notification is ever sent for it.
    pub fn hatch<F>(&self, body: F) -> ActorId
    where
        F: FnOnce(&Context) + Send + 'static,
    {
        self.inner.hatch_internal(crate::SYSTEM, Box::new(body))
    }

    /// Supervise until the mailhub is empty, then join every worker thread.
    ///
    /// Polls `mailhub.len()` at `config.scheduler.tick_interval`. When it
    /// reaches zero, sets the scheduler's stop flag, wakes every worker,
    /// and joins them. Actors still parked in `IdleSet` at that point leak:
    /// arranging for every actor to eventually be woken or to finish on
    /// its own is the caller's responsibility.
    pub fn run(&self) {
        let tick = Duration::from_millis(self.inner.config.scheduler.tick_interval_ms);
        loop {
            thread::sleep(tick);
            let mailboxes = self.inner.mailhub.len();
            trace!(mailboxes, "stats.mailboxes");
            if mailboxes == 0 {
                break;
            }
        }

        self.inner.sched.stop();

        let leaked = self.inner.sched.idle_ids();
        if !leaked.is_empty() {
            debug!(?leaked, "actors still parked at shutdown; their threads leak");
        }

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for worker in workers {
            let _ = worker.join();
        }
    }
}

/// Create a pool with `n_workers` worker threads. Free-function spelling of
/// [`Pool::new`], matching the external interface surface.
pub fn new_pool(n_workers: usize) -> Pool {
    Pool::new(n_workers)
}
