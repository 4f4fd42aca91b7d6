//! The interface implemented by all transport backends for a [`Chan`](crate::Chan).
//!
//! A [`Chan<Tx, Rx>`](crate::Chan) is parameterized by its transmitting connection `Tx` and its
//! receiving connection `Rx`. In order for `Tx` and `Rx` to serve as a backend for a
//! [`Chan`](crate::Chan), they must implement:
//!
//! - `Tx`: [`Transmitter`] + [`TransmitChoice`] (if the session chooses) + [`Transmit<T>`](Transmit)
//!   (for each `T` that is *sent* in a session on the channel)
//! - `Rx`: [`Receiver`] + [`ReceiveChoice`] (if the session offers) + [`Receive<T>`](Receive) (for
//!   each `T` that is *received* in a session on the channel)
//!
//! Backends are synchronous: a call to [`send`](Transmit::send) or [`recv`](Receive::recv) returns
//! once the value has been handed to, or taken from, the underlying transport, blocking the calling
//! thread for as long as the transport needs. The same value may serve as both `Tx` and `Rx` when a
//! transport is shared by both directions (as the `colloquy-mailbox` crate's `Mailbox` is).

mod choice;
pub use choice::*;

pub mod mpsc;

/// A backend transport used for transmitting (i.e. the `Tx` parameter of [`Chan`](crate::Chan))
/// must implement [`Transmitter`], which specifies what type of errors it might return. This is a
/// super-trait of [`Transmit`], which is what's actually needed to send particular values over a
/// [`Chan`](crate::Chan).
pub trait Transmitter {
    /// The type of possible errors when sending.
    type Error;
}

/// A backend transport used for transmitting must implement [`TransmitChoice`] to be used in a
/// session which [`Choose`](crate::Protocol::Choose)s, specifying how to transmit a [`Choice`].
pub trait TransmitChoice: Transmitter {
    /// Send a [`Choice`] to the other party.
    fn send_choice(&mut self, choice: Choice) -> Result<(), Self::Error>;
}

/// If a transport is [`Transmit<T>`](Transmit), we can use it to [`send`](Transmit::send) a message
/// of type `T`.
///
/// # Examples
///
/// For an example of implementing [`Transmit`], check out the source for the implementation of
/// [`Transmit`] for the `Mailbox` type in the `colloquy-mailbox` crate.
pub trait Transmit<T>: Transmitter {
    /// Send a `T` to the other party, blocking until the transport accepts it.
    fn send(&mut self, message: T) -> Result<(), Self::Error>;
}

/// A backend transport used for receiving (i.e. the `Rx` parameter of [`Chan`](crate::Chan)) must
/// implement [`Receiver`], which specifies what type of errors it might return. This is a
/// super-trait of [`Receive`], which is what's actually needed to receive particular values over a
/// [`Chan`](crate::Chan).
pub trait Receiver {
    /// The type of possible errors when receiving.
    type Error;
}

/// A backend transport used for receiving must implement [`ReceiveChoice`] to be used in a session
/// which [`Offer`](crate::Protocol::Offer)s, describing how to receive a [`Choice`].
pub trait ReceiveChoice: Receiver {
    /// Receive the [`Choice`] made by the other party.
    ///
    /// If the transport delivers something which is not a valid [`Choice`], a [`Receiver::Error`]
    /// must be returned.
    fn recv_choice(&mut self) -> Result<Choice, Self::Error>;
}

/// If a transport is [`Receive<T>`](Receive), we can use it to [`recv`](Receive::recv) a message
/// of type `T`.
///
/// # Examples
///
/// For an example of implementing [`Receive`], check out the source for the implementation of
/// [`Receive`] for the `Mailbox` type in the `colloquy-mailbox` crate.
pub trait Receive<T>: Receiver {
    /// Receive a `T` from the other party, blocking until one is available.
    fn recv(&mut self) -> Result<T, Self::Error>;
}
