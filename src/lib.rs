#![crate_name = "mailroom"]
#![deny(clippy::all)]
#![allow(clippy::new_ret_no_self)]

//! A lightweight, in-process actor runtime.
//!
//! A [`Pool`] owns a fixed number of worker threads. Actor bodies run as
//! ordinary, direct-style Rust code on their own green thread and suspend
//! only at [`Context::recv`], [`Context::park`] or [`Context::backoff`];
//! the worker threads hand each actor the baton for one resume slice at a
//! time, so only `n_workers` actors are ever actually running concurrently.
//!
//! ```no_run
//! use mailroom::Pool;
//!
//! let pool = Pool::new(4);
//! pool.hatch(|cx| {
//!     let msg = cx.recv();
//!     println!("actor {} got a message from {}", cx.myself(), msg.src());
//! });
//! pool.run();
//! ```

mod baton;
mod config;
mod context;
mod error;
mod mailbox;
mod message;
mod pool;
mod sched;

pub use config::{load_config, Config, SchedulerConfig};
pub use context::Context;
pub use error::RuntimeError;
pub use message::Message;
pub use pool::{new_pool, ActorId, Pool};

/// System source id. Reserved: no actor is ever hatched with this id, and
/// `Died` messages are stamped with it as their `src`.
pub const SYSTEM: ActorId = 0;
