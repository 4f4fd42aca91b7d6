//! A weaker single-slot transport, [`Handoff`], coordinated only by two counting permits.
//!
//! A [`Handoff`] starts with one "empty" permit and no "full" permits. Putting a value acquires an
//! empty permit and releases a full one; taking a value does the reverse. This alternates puts and
//! takes, but unlike a [`Mailbox`](crate::Mailbox) it does not record who wrote the value in the
//! slot. A thread which puts a value and then takes one may take back its own value, if the other
//! party has not taken it first. A `Handoff` is therefore only suitable for sessions in which one
//! side's takes can never race its own puts, such as a stream of values sent in one direction:
//! prefer a [`Mailbox`](crate::Mailbox) for anything conversational.

use colloquy::{
    backend::{self, Choice},
    Payload, PayloadSet, Session,
};
use std::{
    any::Any,
    fmt,
    sync::{Arc, Condvar, Mutex},
};
use tracing::{debug, trace};

use crate::Error;

struct Permits {
    count: Mutex<usize>,
    available: Condvar,
}

impl Permits {
    fn new(count: usize) -> Permits {
        Permits {
            count: Mutex::new(count),
            available: Condvar::new(),
        }
    }

    fn acquire(&self) -> Result<(), Error> {
        let mut count = self.count.lock().map_err(|_| Error::Poisoned)?;
        while *count == 0 {
            count = self.available.wait(count).map_err(|_| Error::Poisoned)?;
        }
        *count -= 1;
        Ok(())
    }

    fn release(&self) -> Result<(), Error> {
        *self.count.lock().map_err(|_| Error::Poisoned)? += 1;
        self.available.notify_one();
        Ok(())
    }
}

struct Shared {
    payloads: PayloadSet,
    slot: Mutex<Option<(usize, Payload, Box<dyn Any + Send>)>>,
    full: Permits,
    empty: Permits,
}

/// A single-slot transport shared by both sides of a session, without protection against a
/// thread taking back its own value. See the [module documentation](self).
///
/// # Examples
///
/// ```
/// use colloquy::{Protocol, PayloadSet};
/// use colloquy_mailbox::relaxed::Handoff;
///
/// # fn main() -> Result<(), colloquy_mailbox::Error> {
/// let handoff = Handoff::new(PayloadSet::of(&Protocol::send::<i64>(Protocol::Done)));
///
/// handoff.put(7_i64)?;
/// // Nothing stops the writer from taking back what it wrote.
/// assert_eq!(handoff.take::<i64>()?, 7);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Handoff {
    shared: Arc<Shared>,
}

impl fmt::Debug for Handoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handoff")
            .field("payloads", &self.shared.payloads)
            .finish()
    }
}

impl Handoff {
    /// Create an empty handoff carrying the types in `payloads`.
    pub fn new(payloads: PayloadSet) -> Handoff {
        Handoff {
            shared: Arc::new(Shared {
                payloads,
                slot: Mutex::new(None),
                full: Permits::new(0),
                empty: Permits::new(1),
            }),
        }
    }

    /// Create an empty handoff carrying every type in `session`, in either direction.
    pub fn for_session(session: &Session) -> Handoff {
        Handoff::new(session.payloads().clone())
    }

    /// The set of types this handoff carries.
    pub fn payloads(&self) -> &PayloadSet {
        &self.shared.payloads
    }

    fn tag_of(&self, payload: &Payload) -> Result<usize, Error> {
        self.shared
            .payloads
            .tag_of(payload)
            .ok_or(Error::Unlisted(*payload))
    }

    /// Put `value` in the slot, waiting until it has been emptied if it is not already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unlisted`] without waiting if `T` is not carried by this handoff, or
    /// [`Error::Poisoned`] if another thread panicked while holding it.
    pub fn put<T: Any + Send>(&self, value: T) -> Result<(), Error> {
        let payload = Payload::of::<T>();
        let tag = self.tag_of(&payload)?;
        self.shared.empty.acquire()?;
        *self.shared.slot.lock().map_err(|_| Error::Poisoned)? =
            Some((tag, payload, Box::new(value)));
        trace!(%payload, "put");
        self.shared.full.release()
    }

    /// Take a value of type `T` from the slot, waiting until it has been filled if it is not
    /// already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unlisted`] without waiting if `T` is not carried by this handoff,
    /// [`Error::Mismatch`] if the value in the slot is not a `T` (leaving it in place), or
    /// [`Error::Poisoned`] if another thread panicked while holding it.
    pub fn take<T: Any>(&self) -> Result<T, Error> {
        let expected = Payload::of::<T>();
        let tag = self.tag_of(&expected)?;
        self.shared.full.acquire()?;
        let mut slot = self.shared.slot.lock().map_err(|_| Error::Poisoned)?;
        match slot.take() {
            Some((found, _, value)) if found == tag => {
                drop(slot);
                trace!(payload = %expected, "take");
                self.shared.empty.release()?;
                Ok(*value
                    .downcast()
                    .expect("values are stored under the tag of their own type"))
            }
            other => {
                let found = other.as_ref().map(|(_, payload, _)| *payload);
                *slot = other;
                drop(slot);
                self.shared.full.release()?;
                let found = found.expect("a full permit is only released once the slot is filled");
                debug!(%expected, %found, "handoff holds a value of the wrong type");
                Err(Error::Mismatch { expected, found })
            }
        }
    }
}

impl backend::Transmitter for Handoff {
    type Error = Error;
}

impl backend::TransmitChoice for Handoff {
    fn send_choice(&mut self, choice: Choice) -> Result<(), Self::Error> {
        self.put(choice)
    }
}

impl<T: Any + Send> backend::Transmit<T> for Handoff {
    fn send(&mut self, message: T) -> Result<(), Self::Error> {
        self.put(message)
    }
}

impl backend::Receiver for Handoff {
    type Error = Error;
}

impl backend::ReceiveChoice for Handoff {
    fn recv_choice(&mut self) -> Result<Choice, Self::Error> {
        self.take()
    }
}

impl<T: Any> backend::Receive<T> for Handoff {
    fn recv(&mut self) -> Result<T, Self::Error> {
        self.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy::Protocol;
    use std::thread;

    fn handoff() -> Handoff {
        Handoff::new(PayloadSet::of(&Protocol::send::<i64>(
            Protocol::recv::<String>(Protocol::Done),
        )))
    }

    #[test]
    fn puts_and_takes_alternate() {
        let h = handoff();
        let other = h.clone();
        let reader = thread::spawn(move || {
            (0..10)
                .map(|_| other.take::<i64>())
                .collect::<Result<Vec<_>, _>>()
        });
        for n in 0..10_i64 {
            h.put(n).unwrap();
        }
        assert_eq!(reader.join().unwrap(), Ok((0..10).collect::<Vec<i64>>()));
    }

    #[test]
    fn mismatch_leaves_value_and_permit() {
        let h = handoff();
        h.put(3_i64).unwrap();
        assert_eq!(
            h.take::<String>(),
            Err(Error::Mismatch {
                expected: Payload::of::<String>(),
                found: Payload::of::<i64>(),
            })
        );
        assert_eq!(h.take::<i64>(), Ok(3));
    }

    #[test]
    fn unlisted_types_are_rejected() {
        let h = handoff();
        assert_eq!(h.put('x'), Err(Error::Unlisted(Payload::of::<char>())));
    }
}
