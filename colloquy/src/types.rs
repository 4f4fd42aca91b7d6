//! The protocol description language: the vocabulary of session types and the duality between
//! them.
//!
//! A [`Protocol`] is a plain value describing, from one party's point of view, which operations a
//! channel may perform and in what order. Protocols are immutable once built: continuations are
//! shared behind [`Arc`]s so that a [`Chan`](crate::Chan) can point into the middle of a
//! description without copying it.
//!
//! Most programs build a protocol with the smart constructors on [`Protocol`], then validate it
//! once with [`Session::new`](crate::Session::new) before running it.

use std::{any::Any, fmt, sync::Arc};

use crate::Payload;

/// A session type.
///
/// | Variant             | Next operation on a [`Chan`](crate::Chan)            | Dual                     |
/// | :------------------ | :--------------------------------------------------- | :----------------------- |
/// | `Done`              | [`close`](crate::Chan::close)                        | `Done`                   |
/// | `Recv(T, P)`        | [`recv`](crate::Chan::recv), then `P`                | `Send(T, P::dual)`       |
/// | `Send(T, P)`        | [`send`](crate::Chan::send), then `P`                | `Recv(T, P::dual)`       |
/// | `Loop(P)`           | [`enter`](crate::Chan::enter), then `P`              | `Loop(P::dual)`          |
/// | `Continue(N)`       | [`resume`](crate::Chan::resume) the `N`th enclosing loop | `Continue(N)`        |
/// | `Choose(P, Q)`      | [`choose`](crate::Chan::choose) `P` or `Q`           | `Offer(P::dual, Q::dual)` |
/// | `Offer(P, Q)`       | [`offer`](crate::Chan::offer), then whichever the peer chose | `Choose(P::dual, Q::dual)` |
///
/// # Examples
///
/// ```
/// use colloquy::Protocol;
///
/// let doubler = Protocol::loop_(Protocol::send::<i64>(Protocol::recv::<i64>(Protocol::continue_(0))));
/// assert_eq!(doubler.to_string(), "Loop<Send<i64, Recv<i64, Continue>>>");
/// assert_eq!(doubler.dual().to_string(), "Loop<Recv<i64, Send<i64, Continue>>>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// A finished session. The only thing to do with a [`Chan`](crate::Chan) when it is `Done` is
    /// to [`close`](crate::Chan::close) it.
    Done,
    /// Receive a message of the given [`Payload`] type, then continue.
    Recv(Payload, Arc<Protocol>),
    /// Send a message of the given [`Payload`] type, then continue.
    Send(Payload, Arc<Protocol>),
    /// Label a loop point, which can be reiterated with [`Continue`](Protocol::Continue).
    Loop(Arc<Protocol>),
    /// Repeat a [`Loop`](Protocol::Loop). The index points to the loop to be repeated, counted from
    /// the innermost starting at `0`.
    Continue(usize),
    /// Actively choose between two protocols, informing the other party of the choice.
    Choose(Arc<Protocol>, Arc<Protocol>),
    /// Passively offer a choice between two protocols, and wait to learn which the other party
    /// chose.
    Offer(Arc<Protocol>, Arc<Protocol>),
}

impl Protocol {
    /// Send a `T`, then continue as `then`.
    pub fn send<T: Any>(then: Protocol) -> Protocol {
        Protocol::Send(Payload::of::<T>(), Arc::new(then))
    }

    /// Receive a `T`, then continue as `then`.
    pub fn recv<T: Any>(then: Protocol) -> Protocol {
        Protocol::Recv(Payload::of::<T>(), Arc::new(then))
    }

    /// A loop whose body is `body`.
    pub fn loop_(body: Protocol) -> Protocol {
        Protocol::Loop(Arc::new(body))
    }

    /// Jump back to the start of the `index`th enclosing loop (`0` is the innermost).
    pub fn continue_(index: usize) -> Protocol {
        Protocol::Continue(index)
    }

    /// Actively choose between `left` and `right`.
    pub fn choose(left: Protocol, right: Protocol) -> Protocol {
        Protocol::Choose(Arc::new(left), Arc::new(right))
    }

    /// Offer the other party a choice between `left` and `right`.
    pub fn offer(left: Protocol, right: Protocol) -> Protocol {
        Protocol::Offer(Arc::new(left), Arc::new(right))
    }

    /// The dual of this protocol, i.e. the protocol which must be followed by the party at the
    /// other end of a channel following this one.
    ///
    /// Taking the dual is an involution: `p.dual().dual() == p` for every protocol `p`.
    ///
    /// # Examples
    ///
    /// ```
    /// use colloquy::Protocol;
    ///
    /// let p = Protocol::choose(Protocol::send::<String>(Protocol::Done), Protocol::Done);
    /// assert_eq!(p.dual(), Protocol::offer(Protocol::recv::<String>(Protocol::Done), Protocol::Done));
    /// assert_eq!(p.dual().dual(), p);
    /// ```
    pub fn dual(&self) -> Protocol {
        use Protocol::*;
        match self {
            Done => Done,
            Recv(t, p) => Send(*t, Arc::new(p.dual())),
            Send(t, p) => Recv(*t, Arc::new(p.dual())),
            Loop(p) => Loop(Arc::new(p.dual())),
            Continue(n) => Continue(*n),
            Choose(p, q) => Offer(Arc::new(p.dual()), Arc::new(q.dual())),
            Offer(p, q) => Choose(Arc::new(p.dual()), Arc::new(q.dual())),
        }
    }

    /// The kind of operation this protocol calls for next.
    pub fn action(&self) -> Action {
        match self {
            Protocol::Done => Action::Done,
            Protocol::Recv(..) => Action::Recv,
            Protocol::Send(..) => Action::Send,
            Protocol::Loop(_) => Action::Loop,
            Protocol::Continue(_) => Action::Continue,
            Protocol::Choose(..) => Action::Choose,
            Protocol::Offer(..) => Action::Offer,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Protocol::*;
        match self {
            Done => write!(f, "Done"),
            Recv(t, p) => write!(f, "Recv<{}, {}>", t, p),
            Send(t, p) => write!(f, "Send<{}, {}>", t, p),
            Loop(p) => write!(f, "Loop<{}>", p),
            Continue(0) => write!(f, "Continue"),
            Continue(n) => write!(f, "Continue<_{}>", n),
            Choose(p, q) => write!(f, "Choose<({}, {})>", p, q),
            Offer(p, q) => write!(f, "Offer<({}, {})>", p, q),
        }
    }
}

/// The kind of operation a [`Protocol`] calls for next, without any of its continuations.
///
/// This is what a [`Chan`](crate::Chan) reports through [`Chan::action`](crate::Chan::action), and
/// what a [`Violation`](crate::Violation) reports when the wrong operation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// [`Protocol::Done`]
    Done,
    /// [`Protocol::Recv`]
    Recv,
    /// [`Protocol::Send`]
    Send,
    /// [`Protocol::Loop`]
    Loop,
    /// [`Protocol::Continue`]
    Continue,
    /// [`Protocol::Choose`]
    Choose,
    /// [`Protocol::Offer`]
    Offer,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::Done => "Done",
            Action::Recv => "Recv",
            Action::Send => "Send",
            Action::Loop => "Loop",
            Action::Continue => "Continue",
            Action::Choose => "Choose",
            Action::Offer => "Offer",
        };
        write!(f, "`{}`", name)
    }
}

// With the quickcheck feature enabled, arbitrary protocols are generated well-formed: every
// `Continue` refers to a loop which encloses it.
#[cfg(feature = "quickcheck")]
mod arbitrary {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    impl Arbitrary for Protocol {
        fn arbitrary(g: &mut Gen) -> Self {
            let fuel = g.size();
            generate(g, fuel, 0)
        }
    }

    fn generate(g: &mut Gen, fuel: usize, depth: usize) -> Protocol {
        let payloads = [
            Payload::of::<i64>(),
            Payload::of::<bool>(),
            Payload::of::<String>(),
            Payload::of::<char>(),
            Payload::of::<()>(),
        ];
        let payload = *g.choose(&payloads).expect("payload palette is non-empty");

        if fuel == 0 {
            return if depth > 0 && bool::arbitrary(g) {
                Protocol::Continue(usize::arbitrary(g) % depth)
            } else {
                Protocol::Done
            };
        }

        match u8::arbitrary(g) % 7 {
            0 => Protocol::Done,
            1 => Protocol::Send(payload, Arc::new(generate(g, fuel - 1, depth))),
            2 => Protocol::Recv(payload, Arc::new(generate(g, fuel - 1, depth))),
            3 => Protocol::Loop(Arc::new(generate(g, fuel - 1, depth + 1))),
            4 if depth > 0 => Protocol::Continue(usize::arbitrary(g) % depth),
            4 => Protocol::Done,
            5 => Protocol::Choose(
                Arc::new(generate(g, fuel / 2, depth)),
                Arc::new(generate(g, fuel / 2, depth)),
            ),
            _ => Protocol::Offer(
                Arc::new(generate(g, fuel / 2, depth)),
                Arc::new(generate(g, fuel / 2, depth)),
            ),
        }
    }
}
