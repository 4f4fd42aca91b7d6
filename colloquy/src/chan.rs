//! The [`Chan`] type is defined here. Typically, you don't need to import this module, and
//! should use the [`Chan`](super::Chan) re-export instead.
use std::{any::Any, sync::Arc};

use tracing::trace;

use crate::backend::*;
use crate::{Action, Environment, Error, Payload, Protocol, Violation};

/// The error type of every operation on a [`Chan<Tx, Rx>`](Chan).
pub type ChanError<Tx, Rx> = Error<<Tx as Transmitter>::Error, <Rx as Receiver>::Error>;

/// A bidirectional communications channel following a [`Session`](crate::Session) over the
/// connections `Tx` and `Rx`.
///
/// A `Chan` knows where it is in its protocol, and the stack of loops enclosing that position.
/// Every operation consumes the channel and, if it succeeds, returns a new channel positioned at
/// the next step of the protocol. Because a `Chan` is neither [`Clone`] nor [`Copy`], a channel
/// which has been used cannot be used again:
///
/// ```compile_fail
/// use colloquy::{backend::mpsc, Protocol, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(Protocol::send::<i64>(Protocol::send::<i64>(Protocol::Done)))?;
/// let (c1, c2) = session.channel(mpsc::channel);
/// let next = c1.send(1_i64)?;
/// let again = c1.send(2_i64)?; // error[E0382]: use of moved value: `c1`
/// # Ok(())
/// # }
/// ```
///
/// # Creating new `Chan`s: use [`Session`](crate::Session)
///
/// To create a pair of dual channels connected by in-process queues, use
/// [`Session::channel`](crate::Session::channel):
///
/// ```
/// use colloquy::{backend::mpsc, Protocol, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(Protocol::send::<String>(Protocol::Done))?;
/// let (c1, c2) = session.channel(mpsc::channel);
///
/// c1.send("Hello, world!".to_string())?.close()?;
/// let (s, c2) = c2.recv::<String>()?;
/// c2.close()?;
/// assert_eq!(s, "Hello, world!");
/// # Ok(())
/// # }
/// ```
///
/// If you already have a transmitter and receiver and want to wrap them in a `Chan`, use
/// [`Session::wrap`](crate::Session::wrap); to run both sides of a session on their own threads
/// over one shared transport, use [`Session::connect`](crate::Session::connect).
///
/// # Errors
///
/// Since the protocol is a runtime value, attempting an operation the protocol does not call for
/// next (or sending or receiving a message of the wrong type) is detected when it is attempted, and
/// reported as a [`Violation`] *before* anything touches the transport. The channel is consumed
/// either way: a role which violates its protocol cannot continue.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
#[must_use]
pub struct Chan<Tx, Rx> {
    #[derivative(Debug(format_with = "display"))]
    protocol: Arc<Protocol>,
    env: Environment,
    #[derivative(Debug = "ignore")]
    tx: Tx,
    #[derivative(Debug = "ignore")]
    rx: Rx,
}

fn display(protocol: &Arc<Protocol>, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", protocol)
}

impl<Tx, Rx> Chan<Tx, Rx> {
    /// Create a new channel at an arbitrary point in an arbitrary protocol. This doesn't guarantee
    /// the protocol is well-formed or the environment coherent with it. Use with care!
    pub(crate) fn from_raw_unchecked(
        protocol: Arc<Protocol>,
        env: Environment,
        tx: Tx,
        rx: Rx,
    ) -> Chan<Tx, Rx> {
        Chan {
            protocol,
            env,
            tx,
            rx,
        }
    }

    /// The kind of operation this channel must perform next.
    pub fn action(&self) -> Action {
        self.protocol.action()
    }

    /// The remainder of the protocol, from this channel's position onwards.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// The loops enclosing this channel's position in its protocol.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Unwrap a channel into its transmit and receive ends, exiting the regimen of session typing,
    /// potentially before the end of the session.
    ///
    /// # Errors
    ///
    /// If this function is used before the end of a session, it may result in errors when the other
    /// end of the channel attempts to continue the session.
    pub fn into_inner(self) -> (Tx, Rx) {
        (self.tx, self.rx)
    }

    fn violation(&self, attempted: Action) -> Violation {
        Violation::Action {
            expected: self.protocol.action(),
            attempted,
        }
    }
}

impl<Tx: Transmitter, Rx: Receiver> Chan<Tx, Rx> {
    /// Close a finished session, dropping the underlying connections.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session is not [`Done`](Protocol::Done).
    pub fn close(self) -> Result<(), ChanError<Tx, Rx>> {
        match *self.protocol {
            Protocol::Done => {
                trace!("close");
                Ok(())
            }
            _ => Err(self.violation(Action::Done).into()),
        }
    }

    /// Send something of type `T` on the channel, returning the channel.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session does not call for sending a `T` next, or the
    /// [`Transmitter::Error`] of the underlying `Tx` connection if there was an error while sending.
    ///
    /// # Examples
    ///
    /// ```
    /// use colloquy::{backend::mpsc, Protocol, Session};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::new(Protocol::send::<i64>(Protocol::Done))?;
    ///
    /// let (c1, c2) = session.channel(mpsc::channel);
    /// c1.send(2_i64)?.close()?;
    /// # drop(c2);
    ///
    /// // Sending the wrong type of message is a violation:
    /// let (c1, _) = session.channel(mpsc::channel);
    /// assert!(c1.send("not a number").unwrap_err().is_violation());
    /// # Ok(())
    /// # }
    /// ```
    pub fn send<T: Any>(mut self, message: T) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>>
    where
        Tx: Transmit<T>,
    {
        let (expected, next) = match &*self.protocol {
            Protocol::Send(expected, next) => (*expected, next.clone()),
            _ => return Err(self.violation(Action::Send).into()),
        };
        let attempted = Payload::of::<T>();
        if attempted != expected {
            return Err(Violation::Payload {
                action: Action::Send,
                expected,
                attempted,
            }
            .into());
        }
        self.tx.send(message).map_err(Error::Transmit)?;
        trace!(payload = %expected, depth = self.env.depth(), "send");
        self.protocol = next;
        Ok(self)
    }

    /// Receive something of type `T` on the channel, returning the pair of the received object and
    /// the channel.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session does not call for receiving a `T` next, or the
    /// [`Receiver::Error`] of the underlying `Rx` connection if there was an error while receiving.
    pub fn recv<T: Any>(mut self) -> Result<(T, Chan<Tx, Rx>), ChanError<Tx, Rx>>
    where
        Rx: Receive<T>,
    {
        let (expected, next) = match &*self.protocol {
            Protocol::Recv(expected, next) => (*expected, next.clone()),
            _ => return Err(self.violation(Action::Recv).into()),
        };
        let attempted = Payload::of::<T>();
        if attempted != expected {
            return Err(Violation::Payload {
                action: Action::Recv,
                expected,
                attempted,
            }
            .into());
        }
        let message = self.rx.recv().map_err(Error::Receive)?;
        trace!(payload = %expected, depth = self.env.depth(), "recv");
        self.protocol = next;
        Ok((message, self))
    }

    /// Enter a [`Loop`](Protocol::Loop), returning the channel positioned at the start of its body.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session is not at a loop.
    pub fn enter(mut self) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>> {
        let body = match &*self.protocol {
            Protocol::Loop(body) => body.clone(),
            _ => return Err(self.violation(Action::Loop).into()),
        };
        self.env = self.env.push(self.protocol.clone());
        self.protocol = body;
        trace!(depth = self.env.depth(), "enter");
        Ok(self)
    }

    /// Follow a [`Continue`](Protocol::Continue) back towards the loop it refers to.
    ///
    /// At `Continue(0)`, the channel leaves the innermost loop's body and is positioned at that
    /// loop again, ready to [`enter`](Chan::enter) it for another iteration. At `Continue(n)` for
    /// `n > 0`, the channel leaves the innermost loop and is positioned at `Continue(n - 1)`,
    /// which refers to the same loop from one level further out.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session is not at a `Continue`.
    ///
    /// # Examples
    ///
    /// ```
    /// use colloquy::{backend::mpsc, Action, Protocol, Session};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::new(Protocol::loop_(Protocol::loop_(Protocol::continue_(1))))?;
    /// let (c, _) = session.channel(mpsc::channel);
    ///
    /// let c = c.enter()?.enter()?;
    /// assert_eq!(c.environment().depth(), 2);
    ///
    /// let c = c.resume()?;
    /// assert_eq!(c.action(), Action::Continue);
    /// assert_eq!(c.environment().depth(), 1);
    ///
    /// let c = c.resume()?;
    /// assert_eq!(c.protocol(), session.protocol());
    /// assert_eq!(c.environment().depth(), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn resume(mut self) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>> {
        let index = match *self.protocol {
            Protocol::Continue(index) => index,
            _ => return Err(self.violation(Action::Continue).into()),
        };
        let (looped, outer) = self
            .env
            .pop()
            .expect("validated sessions have an enclosing loop for every `Continue`");
        self.protocol = match index {
            0 => looped,
            n => Arc::new(Protocol::Continue(n - 1)),
        };
        self.env = outer;
        trace!(index, depth = self.env.depth(), "resume");
        Ok(self)
    }

    /// Actively choose one branch of a [`Choose`](Protocol::Choose), alerting the other party to
    /// this choice by transmitting it, and return the channel positioned at that branch.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session is not at a choice, or the [`Transmitter::Error`] of
    /// the underlying `Tx` connection if there was an error while sending the choice.
    pub fn choose(mut self, choice: Choice) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>>
    where
        Tx: TransmitChoice,
    {
        let next = match (&*self.protocol, choice) {
            (Protocol::Choose(left, _), Choice::Left) => left.clone(),
            (Protocol::Choose(_, right), Choice::Right) => right.clone(),
            _ => return Err(self.violation(Action::Choose).into()),
        };
        self.tx.send_choice(choice).map_err(Error::Transmit)?;
        trace!(?choice, depth = self.env.depth(), "choose");
        self.protocol = next;
        Ok(self)
    }

    /// Shorthand for [`choose(Choice::Left)`](Chan::choose).
    pub fn choose_left(self) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>>
    where
        Tx: TransmitChoice,
    {
        self.choose(Choice::Left)
    }

    /// Shorthand for [`choose(Choice::Right)`](Chan::choose).
    pub fn choose_right(self) -> Result<Chan<Tx, Rx>, ChanError<Tx, Rx>>
    where
        Tx: TransmitChoice,
    {
        self.choose(Choice::Right)
    }

    /// Offer the choice of two protocols to the other party, and wait for them to indicate which
    /// one they chose.
    ///
    /// 💡 **Where possible, prefer the [`offer!`](crate::offer) macro**, which ensures that both
    /// branches are handled and is more succinct.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] if the session is not at an offer, or the [`Receiver::Error`] of the
    /// underlying `Rx` connection if there was an error while receiving the choice.
    ///
    /// # Examples
    ///
    /// ```
    /// use colloquy::{backend::{mpsc, Choice}, Protocol, Session};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let give_or_take = Session::new(Protocol::choose(
    ///     Protocol::send::<i64>(Protocol::Done),
    ///     Protocol::recv::<String>(Protocol::Done),
    /// ))?;
    /// let (c1, c2) = give_or_take.channel(mpsc::channel);
    ///
    /// c1.choose_left()?.send(42_i64)?.close()?;
    ///
    /// match c2.offer()?.case(Choice::Left) {
    ///     Ok(c2) => {
    ///         let (n, c2) = c2.recv::<i64>()?;
    ///         assert_eq!(n, 42);
    ///         c2.close()?;
    ///     }
    ///     Err(_) => unreachable!("the other party chose the left branch"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn offer(mut self) -> Result<Branches<Tx, Rx>, ChanError<Tx, Rx>>
    where
        Rx: ReceiveChoice,
    {
        let (left, right) = match &*self.protocol {
            Protocol::Offer(left, right) => (left.clone(), right.clone()),
            _ => return Err(self.violation(Action::Offer).into()),
        };
        let choice = self.rx.recv_choice().map_err(Error::Receive)?;
        trace!(?choice, depth = self.env.depth(), "offer");
        self.protocol = match choice {
            Choice::Left => left,
            Choice::Right => right,
        };
        Ok(Branches { choice, chan: self })
    }
}

/// The result of [`offer`](Chan::offer): the [`Choice`] the other party made, and the channel
/// positioned at the corresponding branch.
///
/// To take the branch, use [`Branches::case`] (the analogue to a `match` arm), or
/// [`into_inner`](Branches::into_inner) to take it apart.
///
/// 💡 When possible, prefer the [`offer!`](crate::offer) macro over using [`Branches`] directly.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
#[must_use]
pub struct Branches<Tx, Rx> {
    choice: Choice,
    chan: Chan<Tx, Rx>,
}

impl<Tx, Rx> Branches<Tx, Rx> {
    /// Check if the other party chose `branch`. If so, return the channel positioned at that
    /// branch; otherwise, return these same [`Branches`] unchanged.
    pub fn case(self, branch: Choice) -> Result<Chan<Tx, Rx>, Branches<Tx, Rx>> {
        if self.choice == branch {
            Ok(self.chan)
        } else {
            Err(self)
        }
    }

    /// The [`Choice`] which was made by the other party.
    pub fn choice(&self) -> Choice {
        self.choice
    }

    /// Take apart these [`Branches`] into the [`Choice`] made and the channel positioned at it.
    pub fn into_inner(self) -> (Choice, Chan<Tx, Rx>) {
        (self.choice, self.chan)
    }
}

/// Offer a choice between two branches to the other party, and run the code for whichever branch
/// they [`choose`](Chan::choose).
///
/// The channel's name is rebound to the channel positioned at the chosen branch within each arm.
/// Both arms must be given, `Left` first. Errors from [`offer`](Chan::offer) are propagated with
/// `?`, so the macro must be used inside a function returning a compatible `Result`.
///
/// # Examples
///
/// ```
/// use colloquy::{backend::mpsc, offer, Protocol, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(Protocol::offer(
///     Protocol::recv::<i64>(Protocol::Done),
///     Protocol::send::<String>(Protocol::Done),
/// ))?;
/// let (server, client) = session.channel(mpsc::channel);
///
/// let client = client.choose_right()?;
///
/// let branch = offer!(server => {
///     Left => {
///         let (n, server) = server.recv::<i64>()?;
///         server.close()?;
///         n.to_string()
///     },
///     Right => {
///         server.send("Hello!".to_string())?.close()?;
///         "greeting".to_string()
///     },
/// });
/// assert_eq!(branch, "greeting");
///
/// let (greeting, client) = client.recv::<String>()?;
/// client.close()?;
/// assert_eq!(greeting, "Hello!");
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! offer {
    ($chan:ident => { Left => $left:expr, Right => $right:expr $(,)? }) => {{
        match $crate::Chan::offer($chan)?.into_inner() {
            ($crate::backend::Choice::Left, $chan) => $left,
            ($crate::backend::Choice::Right, $chan) => $right,
        }
    }};
}
