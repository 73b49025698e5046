use std::any::Any;
use std::fmt;

use crate::pool::ActorId;

enum Payload {
    /// The runtime-synthesized notification sent to a parent when a child
    /// terminates.
    Died(ActorId),
    User(Box<dyn Any + Send>),
}

/// A message as delivered to a mailbox: the runtime-stamped sender plus a
/// type-erased, isolated payload.
///
/// A stamped sender plus a type-erased, isolated payload, collapsed into
/// one type since this runtime has a single mailbox per actor rather than
/// a typed channel per actor.
pub struct Message {
    src: ActorId,
    payload: Payload,
}

impl Message {
    pub(crate) fn user<T>(src: ActorId, msg: T) -> Self
    where
        T: Any + Send,
    {
        Message {
            src,
            payload: Payload::User(Box::new(msg)),
        }
    }

    pub(crate) fn died(child: ActorId) -> Self {
        Message {
            src: crate::SYSTEM,
            payload: Payload::Died(child),
        }
    }

    /// The id of the actor that sent this message (`0` for runtime-originated
    /// messages such as `Died`).
    pub fn src(&self) -> ActorId {
        self.src
    }

    /// `Some(id)` if this is the runtime's notification that actor `id`
    /// terminated.
    pub fn died(&self) -> Option<ActorId> {
        match self.payload {
            Payload::Died(id) => Some(id),
            Payload::User(_) => None,
        }
    }

    /// Attempt to recover the concrete payload type. Fails (returning the
    /// message unchanged) if the message is a `Died` notification or if `T`
    /// does not match the type that was sent.
    pub fn downcast<T: Any + Send>(self) -> Result<T, Message> {
        match self.payload {
            Payload::User(boxed) => match boxed.downcast::<T>() {
                Ok(val) => Ok(*val),
                Err(boxed) => Err(Message {
                    src: self.src,
                    payload: Payload::User(boxed),
                }),
            },
            Payload::Died(id) => Err(Message {
                src: self.src,
                payload: Payload::Died(id),
            }),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.payload {
            Payload::Died(id) => write!(f, "Message {{ src: {}, payload: Died({}) }}", self.src, id),
            Payload::User(_) => write!(f, "Message {{ src: {}, payload: <user> }}", self.src),
        }
    }
}
