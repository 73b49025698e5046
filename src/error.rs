use std::error::Error;
use std::fmt;

use crate::pool::ActorId;

/// Errors surfaced by the runtime. All are programming errors or
/// environmental failures; a dropped send to a dead actor is deliberately
/// *not* one of these (see [`crate::Pool::send`]).
pub enum RuntimeError {
    /// A mailbox for this id already exists. Raised by `register` when the
    /// id counter or caller violates the "hatch assigns each id once"
    /// invariant.
    AlreadyRegistered(ActorId),
    /// No mailbox exists for this id. Raised by `unregister` if the worker
    /// finalizing an actor finds no mailbox for it -- an internal invariant
    /// breach, since each id is finalized exactly once; never raised by
    /// `send`, which tolerates absence.
    NotRegistered(ActorId),
    /// A `send` or `hatch` payload was not isolated at the call site.
    ///
    /// In practice this is unreachable: `send`/`hatch` take their argument
    /// by move and require `Send + 'static`, so the compiler rejects
    /// aliased payloads before the runtime ever runs. The variant exists to
    /// document the isolation contract itself.
    IsolationViolation,
}

impl Error for RuntimeError {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::AlreadyRegistered(id) => {
                write!(f, "actor {} already has a mailbox registered", id)
            }
            RuntimeError::NotRegistered(id) => {
                write!(f, "actor {} has no mailbox registered", id)
            }
            RuntimeError::IsolationViolation => {
                f.write_str("message or actor body is not isolated at the call site")
            }
        }
    }
}

impl fmt::Debug for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
