use thiserror::Error;

use crate::{Action, Payload};

/// A reason a [`Protocol`](crate::Protocol) cannot be made into a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ProtocolError {
    /// A [`Continue`](crate::Protocol::Continue) refers to a loop which does not enclose it.
    #[error(
        "`Continue<_{index}>` must be nested within at least {} loop(s), but is nested within {depth}",
        .index + 1
    )]
    ContinueOutsideLoop {
        /// The index of the offending `Continue`.
        index: usize,
        /// The number of loops which actually enclose it.
        depth: usize,
    },
}

/// The error returned by [`Session::new`](crate::Session::new): every reason the protocol is
/// ill-formed, in the order they occur in the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ill-formed protocol `{protocol}`: {}", list(.errors))]
pub struct IllFormed {
    pub(crate) protocol: String,
    pub(crate) errors: Vec<ProtocolError>,
}

impl IllFormed {
    /// The individual errors found.
    pub fn errors(&self) -> &[ProtocolError] {
        &self.errors
    }
}

fn list(errors: &[ProtocolError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An attempt to use a [`Chan`](crate::Chan) in a way its protocol does not allow at this point.
///
/// A violation is always a defect in the code driving the channel, never a failure of the
/// transport: the channel is consumed, and the role should be abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Violation {
    /// The operation attempted is not the one the protocol calls for next.
    #[error("attempted a {attempted} operation, but the session's next action is {expected}")]
    Action {
        /// The action the protocol calls for.
        expected: Action,
        /// The action which was attempted.
        attempted: Action,
    },
    /// The operation was right, but the type of the message was not.
    #[error("attempted {action} of a `{attempted}`, but the session carries a `{expected}` here")]
    Payload {
        /// Either [`Action::Send`] or [`Action::Recv`].
        action: Action,
        /// The type the protocol calls for.
        expected: Payload,
        /// The type which was attempted.
        attempted: Payload,
    },
}

/// The error returned by an operation on a [`Chan`](crate::Chan) with transmitting half `Tx` and
/// receiving half `Rx`, whose errors are `TxErr` and `RxErr` respectively.
#[derive(Debug, Error)]
pub enum Error<TxErr, RxErr> {
    /// The channel was used contrary to its protocol.
    #[error(transparent)]
    Violation(#[from] Violation),
    /// The underlying transmitter failed.
    #[error("transmit failed: {0}")]
    Transmit(TxErr),
    /// The underlying receiver failed.
    #[error("receive failed: {0}")]
    Receive(RxErr),
}

impl<TxErr, RxErr> Error<TxErr, RxErr> {
    /// Is this a violation of the protocol, rather than a transport failure?
    pub fn is_violation(&self) -> bool {
        matches!(self, Error::Violation(_))
    }
}
