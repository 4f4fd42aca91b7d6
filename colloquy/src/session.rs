use std::{convert::TryFrom, fmt, sync::Arc, thread};

use tracing::debug;

use crate::{Chan, Environment, IllFormed, PayloadSet, Protocol, ProtocolError};

/// A validated [`Protocol`], from which session-typed [`Chan`]s are created.
///
/// A protocol becomes a `Session` only if every [`Continue`](Protocol::Continue) in it refers to a
/// [`Loop`](Protocol::Loop) which encloses it. Ill-formed protocols are rejected when the session
/// is defined, rather than when a channel following them reaches the bad jump.
///
/// # Examples
///
/// ```
/// use colloquy::{backend::mpsc, Protocol, Session};
///
/// let (c1, c2) = Session::new(Protocol::send::<String>(Protocol::Done))
///     .unwrap()
///     .channel(mpsc::channel);
/// // do something with these channels...
/// # drop((c1, c2));
/// ```
///
/// # Counterexamples
///
/// The protocol `Loop<Continue<_1>>` is not a session, because `Continue<_1>` must occur within two
/// nested loops to be properly scoped:
///
/// ```
/// use colloquy::{Protocol, ProtocolError, Session};
///
/// let err = Session::new(Protocol::loop_(Protocol::continue_(1))).unwrap_err();
/// assert_eq!(err.errors(), &[ProtocolError::ContinueOutsideLoop { index: 1, depth: 1 }]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    protocol: Arc<Protocol>,
    payloads: Arc<PayloadSet>,
}

impl Session {
    /// Validate `protocol` as a session.
    ///
    /// # Errors
    ///
    /// If any [`Continue`](Protocol::Continue) in the protocol is not enclosed by enough loops, all
    /// such problems are reported together in an [`IllFormed`] error.
    pub fn new(protocol: Protocol) -> Result<Session, IllFormed> {
        let mut errors = Vec::new();
        check_scope(&protocol, 0, &mut errors);
        if !errors.is_empty() {
            let err = IllFormed {
                protocol: protocol.to_string(),
                errors,
            };
            debug!(%err, "rejected protocol");
            return Err(err);
        }
        let payloads = PayloadSet::of(&protocol);
        Ok(Session {
            protocol: Arc::new(protocol),
            payloads: Arc::new(payloads),
        })
    }

    /// The protocol followed by the session.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// The closed set of types carried by the session, in either direction.
    pub fn payloads(&self) -> &PayloadSet {
        &self.payloads
    }

    /// The dual to this session, i.e. the session for the other side of a channel following it.
    ///
    /// The dual carries exactly the same payloads.
    pub fn dual(&self) -> Session {
        Session {
            protocol: Arc::new(self.protocol.dual()),
            payloads: self.payloads.clone(),
        }
    }

    /// Given a transmitting and receiving end of an un-session-typed connection, wrap them in a new
    /// channel for this session, positioned at its start.
    ///
    /// It is expected that the other ends of these connections will be wrapped in a channel for the
    /// [`dual`](Session::dual) session.
    ///
    /// # Examples
    ///
    /// ```
    /// use colloquy::{backend::mpsc, Protocol, Session};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let (tx, rx) = mpsc::channel();
    /// let c = Session::new(Protocol::Done)?.wrap(tx, rx);
    /// c.close()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn wrap<Tx, Rx>(&self, tx: Tx, rx: Rx) -> Chan<Tx, Rx> {
        Chan::from_raw_unchecked(self.protocol.clone(), Environment::new(), tx, rx)
    }

    /// Given a closure which generates a uni-directional underlying transport channel, create a
    /// pair of dual [`Chan`]s which communicate over the transport channels resulting from two
    /// calls to this closure. The first channel follows this session, the second its dual.
    ///
    /// By internally wiring together the two directional channels, this function assures that
    /// communications over the channels actually follow the session specified.
    pub fn channel<Tx, Rx>(
        &self,
        mut make: impl FnMut() -> (Tx, Rx),
    ) -> (Chan<Tx, Rx>, Chan<Tx, Rx>) {
        let (tx0, rx0) = make();
        let (tx1, rx1) = make();
        (self.wrap(tx0, rx1), self.dual().wrap(tx1, rx0))
    }

    /// Run both sides of this session concurrently over a single shared `transport`, such as a
    /// mailbox, which serves as both the transmitter and the receiver of both sides.
    ///
    /// Each closure is run on its own newly spawned thread: `left` with a channel following this
    /// session, and `right` with a channel following its dual. Returns immediately with the
    /// threads' join handles, through which the caller can await either side's result.
    ///
    /// See the `colloquy-mailbox` crate, whose `Mailbox` is a transport built to be shared this
    /// way, for examples.
    ///
    /// # Panics
    ///
    /// Panics if the operating system fails to create a thread.
    pub fn connect<T, F, G, A, B>(
        &self,
        transport: T,
        left: F,
        right: G,
    ) -> (thread::JoinHandle<A>, thread::JoinHandle<B>)
    where
        T: Clone + Send + 'static,
        F: FnOnce(Chan<T, T>) -> A + Send + 'static,
        G: FnOnce(Chan<T, T>) -> B + Send + 'static,
        A: Send + 'static,
        B: Send + 'static,
    {
        debug!(session = %self, "connecting both sides");
        let chan = self.wrap(transport.clone(), transport.clone());
        let dual = self.dual().wrap(transport.clone(), transport);
        let left = thread::Builder::new()
            .name(format!("{} (left)", self))
            .spawn(move || left(chan))
            .expect("failed to spawn thread");
        let right = thread::Builder::new()
            .name(format!("{} (right)", self))
            .spawn(move || right(dual))
            .expect("failed to spawn thread");
        (left, right)
    }
}

impl TryFrom<Protocol> for Session {
    type Error = IllFormed;

    fn try_from(protocol: Protocol) -> Result<Self, Self::Error> {
        Session::new(protocol)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.protocol.fmt(f)
    }
}

/// Push every `Continue` not enclosed by enough loops onto `errors`, in order of appearance.
fn check_scope(protocol: &Protocol, depth: usize, errors: &mut Vec<ProtocolError>) {
    use Protocol::*;
    match protocol {
        Done => {}
        Recv(_, p) | Send(_, p) => check_scope(p, depth, errors),
        Loop(p) => check_scope(p, depth + 1, errors),
        Continue(index) => {
            if *index >= depth {
                errors.push(ProtocolError::ContinueOutsideLoop {
                    index: *index,
                    depth,
                })
            }
        }
        Choose(p, q) | Offer(p, q) => {
            check_scope(p, depth, errors);
            check_scope(q, depth, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_scoped_protocols_are_sessions() {
        let p = Protocol::loop_(Protocol::offer(
            Protocol::recv::<i64>(Protocol::continue_(0)),
            Protocol::loop_(Protocol::send::<bool>(Protocol::continue_(1))),
        ));
        let session = Session::new(p.clone()).unwrap();
        assert_eq!(session.protocol(), &p);
        assert_eq!(session.dual().protocol(), &p.dual());
        assert_eq!(session.dual().payloads(), session.payloads());
    }

    #[test]
    fn every_unscoped_continue_is_reported() {
        let p = Protocol::choose(
            Protocol::continue_(0),
            Protocol::loop_(Protocol::send::<i64>(Protocol::offer(
                Protocol::continue_(0),
                Protocol::continue_(2),
            ))),
        );
        let err = Session::new(p).unwrap_err();
        assert_eq!(
            err.errors(),
            &[
                ProtocolError::ContinueOutsideLoop { index: 0, depth: 0 },
                ProtocolError::ContinueOutsideLoop { index: 2, depth: 1 },
            ]
        );
        assert_eq!(
            err.to_string(),
            "ill-formed protocol `Choose<(Continue, Loop<Send<i64, Offer<(Continue, Continue<_2>)>>>)>`: \
             `Continue<_0>` must be nested within at least 1 loop(s), but is nested within 0; \
             `Continue<_2>` must be nested within at least 3 loop(s), but is nested within 1"
        );
    }

    #[test]
    fn unproductive_loops_are_accepted() {
        assert!(Session::new(Protocol::loop_(Protocol::continue_(0))).is_ok());
    }

    #[test]
    fn wrapped_channels_start_at_the_beginning() {
        let session = Session::new(Protocol::recv::<()>(Protocol::Done)).unwrap();
        let chan = session.wrap((), ());
        assert_eq!(chan.protocol(), session.protocol());
        assert!(chan.environment().is_empty());
    }
}
