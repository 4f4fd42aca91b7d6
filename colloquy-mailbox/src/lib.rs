//! This crate provides a backend implementation for the [`colloquy`] crate using a single-slot
//! [`Mailbox`] shared by both sides of a session. The mailbox holds at most one value at a time,
//! tagged with its type and with the thread which wrote it, and a value is never delivered back to
//! the thread which wrote it. Select this backend to run the two roles of a session on two threads
//! of the same process with [`Session::connect`](colloquy::Session::connect).
//!
//! # Examples
//!
//! ```
//! use colloquy::{Protocol, Session};
//! use colloquy_mailbox::Mailbox;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(Protocol::send::<String>(Protocol::recv::<usize>(Protocol::Done)))?;
//! let mailbox = Mailbox::for_session(&session);
//!
//! let (client, server) = session.connect(
//!     mailbox,
//!     |c| -> Result<usize, colloquy::ChanError<Mailbox, Mailbox>> {
//!         let (len, c) = c.send("Hello!".to_string())?.recv::<usize>()?;
//!         c.close()?;
//!         Ok(len)
//!     },
//!     |c| -> Result<(), colloquy::ChanError<Mailbox, Mailbox>> {
//!         let (s, c) = c.recv::<String>()?;
//!         c.send(s.len())?.close()
//!     },
//! );
//!
//! server.join().unwrap()?;
//! assert_eq!(client.join().unwrap()?, 6);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
// Documentation configuration
#![forbid(broken_intra_doc_links)]

use colloquy::{
    backend::{self, Choice},
    Payload, PayloadSet, Session,
};
use std::{
    any::Any,
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::{self, ThreadId},
};
use thiserror::Error;
use tracing::{debug, trace};

pub mod relaxed;

/// Shorthand for a [`Chan`](colloquy::Chan) whose transmitter and receiver are both a [`Mailbox`].
pub type Chan = colloquy::Chan<Mailbox, Mailbox>;

/// An error thrown while putting a value into or taking a value from a [`Mailbox`] or a
/// [`Handoff`](relaxed::Handoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The type of the value is not carried by the session the mailbox was made for.
    #[error("`{0}` is not carried by this mailbox")]
    Unlisted(Payload),
    /// The value in the mailbox is not of the type the reader expected. This is always resultant
    /// from the other party failing to follow the dual of the reader's session. The value is left
    /// in the mailbox.
    #[error("expected a `{expected}` from the mailbox, but it holds a `{found}`")]
    Mismatch {
        /// The type the reader asked for.
        expected: Payload,
        /// The type of the value actually held.
        found: Payload,
    },
    /// Another thread panicked while holding the mailbox's lock.
    #[error("mailbox poisoned by a panic in another thread")]
    Poisoned,
}

/// A value in flight: its position in the mailbox's [`PayloadSet`], and the thread which wrote it.
struct Letter {
    tag: usize,
    payload: Payload,
    value: Box<dyn Any + Send>,
    writer: ThreadId,
}

#[derive(Default)]
struct Slot {
    letter: Option<Letter>,
    writers_waiting: usize,
    readers_waiting: usize,
}

struct Shared {
    payloads: PayloadSet,
    slot: Mutex<Slot>,
    // Signalled when the slot is filled.
    filled: Condvar,
    // Signalled when the slot is emptied.
    emptied: Condvar,
}

/// A single-slot mailbox holding whichever one value of a session is currently in flight.
///
/// Cloning a `Mailbox` produces another reference to the *same* slot, so that each side of a
/// session can hold its own. The mailbox is sized by a [`PayloadSet`]: only values of the types in
/// that set may be [`put`](Mailbox::put) in it.
///
/// - [`put`](Mailbox::put) blocks while the slot is full, then stores the value.
/// - [`take`](Mailbox::take) blocks while the slot is empty *or holds a value written by the
///   calling thread*, then removes and returns the value.
///
/// Because a thread never takes its own value, two threads alternating `put` and `take` through one
/// mailbox always exchange values, rather than one of them reading back what it just wrote.
/// Only two participants are supported.
///
/// # Examples
///
/// ```
/// use colloquy::{Protocol, PayloadSet};
/// use colloquy_mailbox::Mailbox;
/// use std::thread;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mailbox = Mailbox::new(PayloadSet::of(&Protocol::send::<i64>(Protocol::Done)));
/// let other = mailbox.clone();
///
/// mailbox.put(21_i64)?;
/// let doubled = thread::spawn(move || other.take::<i64>().map(|n| n * 2)).join().unwrap()?;
/// assert_eq!(doubled, 42);
/// assert!(!mailbox.is_occupied()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Mailbox {
    shared: Arc<Shared>,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("payloads", &self.shared.payloads)
            .finish()
    }
}

impl Mailbox {
    /// Create an empty mailbox carrying the types in `payloads`.
    pub fn new(payloads: PayloadSet) -> Mailbox {
        Mailbox {
            shared: Arc::new(Shared {
                payloads,
                slot: Mutex::new(Slot::default()),
                filled: Condvar::new(),
                emptied: Condvar::new(),
            }),
        }
    }

    /// Create an empty mailbox carrying every type in `session`, in either direction.
    pub fn for_session(session: &Session) -> Mailbox {
        Mailbox::new(session.payloads().clone())
    }

    /// The set of types this mailbox carries.
    pub fn payloads(&self) -> &PayloadSet {
        &self.shared.payloads
    }

    /// Is there a value in the mailbox waiting to be taken?
    ///
    /// # Errors
    ///
    /// Returns [`Error::Poisoned`] if another thread panicked while holding the mailbox.
    pub fn is_occupied(&self) -> Result<bool, Error> {
        Ok(self.lock()?.letter.is_some())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot>, Error> {
        self.shared.slot.lock().map_err(|_| Error::Poisoned)
    }

    fn tag_of(&self, payload: &Payload) -> Result<usize, Error> {
        self.shared
            .payloads
            .tag_of(payload)
            .ok_or(Error::Unlisted(*payload))
    }

    /// Put `value` in the mailbox, waiting until the mailbox is empty if it is not already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unlisted`] without waiting if `T` is not carried by this mailbox, or
    /// [`Error::Poisoned`] if another thread panicked while holding the mailbox.
    pub fn put<T: Any + Send>(&self, value: T) -> Result<(), Error> {
        let payload = Payload::of::<T>();
        let tag = self.tag_of(&payload)?;
        let mut slot = self.lock()?;
        while slot.letter.is_some() {
            slot.writers_waiting += 1;
            trace!(%payload, "waiting for mailbox to empty");
            slot = self
                .shared
                .emptied
                .wait(slot)
                .map_err(|_| Error::Poisoned)?;
            slot.writers_waiting -= 1;
        }
        slot.letter = Some(Letter {
            tag,
            payload,
            value: Box::new(value),
            writer: thread::current().id(),
        });
        trace!(%payload, "put");
        if slot.readers_waiting > 0 {
            self.shared.filled.notify_all();
        }
        Ok(())
    }

    /// Take a value of type `T` from the mailbox, waiting until the mailbox holds a value written
    /// by some other thread if it does not already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unlisted`] without waiting if `T` is not carried by this mailbox,
    /// [`Error::Mismatch`] if the value written by the other thread is not a `T` (leaving it in the
    /// mailbox), or [`Error::Poisoned`] if another thread panicked while holding the mailbox.
    pub fn take<T: Any>(&self) -> Result<T, Error> {
        let expected = Payload::of::<T>();
        let tag = self.tag_of(&expected)?;
        let me = thread::current().id();
        let mut slot = self.lock()?;
        let letter = loop {
            match slot.letter.take() {
                Some(letter) if letter.writer != me => break letter,
                other => slot.letter = other,
            }
            slot.readers_waiting += 1;
            trace!(payload = %expected, "waiting for mailbox to fill");
            slot = self
                .shared
                .filled
                .wait(slot)
                .map_err(|_| Error::Poisoned)?;
            slot.readers_waiting -= 1;
        };

        if letter.tag != tag {
            let found = letter.payload;
            slot.letter = Some(letter);
            debug!(%expected, %found, "mailbox holds a value of the wrong type");
            return Err(Error::Mismatch { expected, found });
        }
        trace!(payload = %expected, "take");
        if slot.writers_waiting > 0 {
            self.shared.emptied.notify_all();
        }
        drop(slot);
        Ok(*letter
            .value
            .downcast()
            .expect("values are stored under the tag of their own type"))
    }
}

impl backend::Transmitter for Mailbox {
    type Error = Error;
}

impl backend::TransmitChoice for Mailbox {
    fn send_choice(&mut self, choice: Choice) -> Result<(), Self::Error> {
        self.put(choice)
    }
}

impl<T: Any + Send> backend::Transmit<T> for Mailbox {
    fn send(&mut self, message: T) -> Result<(), Self::Error> {
        self.put(message)
    }
}

impl backend::Receiver for Mailbox {
    type Error = Error;
}

impl backend::ReceiveChoice for Mailbox {
    fn recv_choice(&mut self) -> Result<Choice, Self::Error> {
        self.take()
    }
}

impl<T: Any> backend::Receive<T> for Mailbox {
    fn recv(&mut self) -> Result<T, Self::Error> {
        self.take()
    }
}
