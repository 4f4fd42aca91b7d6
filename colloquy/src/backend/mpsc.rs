//! A backend using [`std::sync::mpsc`] channels carrying boxed values `Box<dyn Any + Send>`, which
//! are downcast to their true type (inferred from the session) on the other end of the channel.
//!
//! Use this backend to connect roles running on threads of the same process, or to drive both
//! ends of a session from a single thread, since sending never blocks.
//!
//! # Examples
//!
//! ```
//! use colloquy::{backend::mpsc, Protocol, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(Protocol::send::<char>(Protocol::Done))?;
//! let (c1, c2): (mpsc::Chan, mpsc::Chan) = session.channel(mpsc::channel);
//!
//! c1.send('!')?.close()?;
//! let (c, c2) = c2.recv::<char>()?;
//! c2.close()?;
//! assert_eq!(c, '!');
//! # Ok(())
//! # }
//! ```

use std::{any::Any, sync::mpsc};

use thiserror::Error;

use super::{
    Choice, Receive, ReceiveChoice, Receiver as ReceiverTrait, Transmit, TransmitChoice,
    Transmitter,
};

/// Shorthand for a [`Chan`](crate::Chan) using a [`Sender`] and [`Receiver`].
pub type Chan = crate::Chan<Sender, Receiver>;

/// A sender for dynamically typed values. See [`std::sync::mpsc::Sender`].
#[derive(Debug, Clone)]
pub struct Sender(pub mpsc::Sender<Box<dyn Any + Send>>);

/// A receiver for dynamically typed values. See [`std::sync::mpsc::Receiver`].
#[derive(Debug)]
pub struct Receiver(pub mpsc::Receiver<Box<dyn Any + Send>>);

/// Create an unbounded channel for transporting dynamically typed values.
///
/// This is a wrapper around `std::sync::mpsc::channel::<Box<dyn Any + Send>>`.
pub fn channel() -> (Sender, Receiver) {
    let (tx, rx) = mpsc::channel();
    (Sender(tx), Receiver(rx))
}

/// An error thrown while sending on a dynamically typed channel: the receiving end has hung up.
/// The value which could not be sent is returned.
#[derive(Debug, Error)]
#[error("channel closed")]
pub struct SendError(pub Box<dyn Any + Send>);

/// An error thrown while receiving from a dynamically typed channel.
#[derive(Debug, Error)]
pub enum RecvError {
    /// All senders were dropped, implicitly closing the channel.
    #[error("channel closed")]
    Closed,
    /// A value received from the channel could not be cast into the correct expected type. This is
    /// always resultant from the other end of a channel failing to follow the session.
    #[error("received value was not of desired type")]
    DowncastFailed(Box<dyn Any + Send>),
}

impl Transmitter for Sender {
    type Error = SendError;
}

impl TransmitChoice for Sender {
    fn send_choice(&mut self, choice: Choice) -> Result<(), Self::Error> {
        self.send(choice)
    }
}

impl<T: Any + Send> Transmit<T> for Sender {
    fn send(&mut self, message: T) -> Result<(), Self::Error> {
        self.0
            .send(Box::new(message))
            .map_err(|mpsc::SendError(message)| SendError(message))
    }
}

impl ReceiverTrait for Receiver {
    type Error = RecvError;
}

impl ReceiveChoice for Receiver {
    fn recv_choice(&mut self) -> Result<Choice, Self::Error> {
        self.recv()
    }
}

impl<T: Any> Receive<T> for Receiver {
    fn recv(&mut self) -> Result<T, Self::Error> {
        match self.0.recv() {
            Ok(b) => match b.downcast() {
                Ok(t) => Ok(*t),
                Err(b) => Err(RecvError::DowncastFailed(b)),
            },
            Err(mpsc::RecvError) => Err(RecvError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_arrive_in_order() {
        let (mut tx, mut rx) = channel();
        tx.send(1_i64).unwrap();
        tx.send("two".to_string()).unwrap();
        tx.send_choice(Choice::Right).unwrap();
        assert_eq!(Receive::<i64>::recv(&mut rx).unwrap(), 1);
        assert_eq!(Receive::<String>::recv(&mut rx).unwrap(), "two");
        assert_eq!(rx.recv_choice().unwrap(), Choice::Right);
    }

    #[test]
    fn wrong_type_fails_to_downcast() {
        let (mut tx, mut rx) = channel();
        tx.send(1_i64).unwrap();
        assert!(matches!(
            Receive::<bool>::recv(&mut rx),
            Err(RecvError::DowncastFailed(_))
        ));
    }

    #[test]
    fn hung_up_ends_are_reported() {
        let (mut tx, rx) = channel();
        drop(rx);
        assert!(tx.send(()).is_err());

        let (tx, mut rx) = channel();
        drop(tx);
        assert!(matches!(
            Receive::<()>::recv(&mut rx),
            Err(RecvError::Closed)
        ));
    }
}
