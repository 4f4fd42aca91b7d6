/*!
> **colloquy (noun):** A conversation, especially a formal one conducted according to agreed
> rules.
>
> **colloquy (crate):** Transport-polymorphic session-typed channels for synchronous Rust.

When two concurrent processes communicate, it's good to give their messages *types*, which
ensure every message is of an expected form.

- **Conventional types** merely describe **what is valid** to communicate.
- **Session types** describe **when it is valid** to communicate, and **in what manner**.

This crate provides a wrapper around almost any kind of blocking connection which checks that a
specified *session protocol* is followed by any code using it. A wrapped channel:

- is **consumed by every operation**, so a stale channel can never be used again: the Rust
  compiler rejects any attempt to reuse one;
- checks each operation against its protocol, and **reports violations as errors** without
  touching the transport or panicking;
- is **polymorphic over its transport**, which only needs to implement the traits in
  [`backend`]; and
- describes its protocol as an ordinary value, so protocols can be **built, printed, compared
  and dualized at runtime**.

Two backends are available out-of-the-box:

- The [`backend::mpsc`] module carries values between threads (or within one thread) over
  [`std::sync::mpsc`] queues.
- The `colloquy-mailbox` crate provides a single-slot mailbox, shared by both sides of a session,
  which holds whichever one value is currently in flight.

The `colloquy-stream` crate additionally connects a channel to any line-oriented reader and
writer, such as a terminal.

## Quick reference

The **[`prelude`]** module exports most of the relevant constructs for writing programs with
colloquy. Most programs using colloquy should `use colloquy::prelude::*;`.

- To describe a protocol, build a [`Protocol`] using its constructors, such as
  [`Protocol::send`] and [`Protocol::loop_`].
- To check that a protocol is well-formed, make it into a [`Session`] using [`Session::new`].
- To construct a [`Chan`], use the methods on [`Session`], such as [`Session::channel`],
  [`Session::wrap`] or [`Session::connect`], depending on whether you need to create both sides of a
  channel, just one side, or both sides running on their own threads.

Once you've got a channel, here's what you can do:

| Protocol (`P`) | Channel Operation(s)<br>(on a channel `c` at `P`) | Dual (`P.dual()`) |
| :------------- | :------------------------------------------------ | :---------------- |
| `Send(T, Q)` | Given some `t: T`, returns a new `c`:<br>[`let c = c.send(t)?;`](Chan::send) | `Recv(T, Q.dual())` |
| `Recv(T, Q)` | Returns some `t: T` and a new `c`:<br>[`let (t, c) = c.recv::<T>()?;`](Chan::recv) | `Send(T, Q.dual())` |
| `Choose(Q, R)` | Given a [`Choice`](backend::Choice), returns a new `c`:<br>[`let c = c.choose_left()?;`](Chan::choose_left) | `Offer(Q.dual(), R.dual())` |
| `Offer(Q, R)` | Given one branch for each option, `Left` first, evaluates the chosen branch with a new `c`:<br>[`offer!(c => { Left => ..., Right => ... })`](offer!) | `Choose(Q.dual(), R.dual())` |
| `Loop(Q)` | Returns a new `c` at the start of `Q`:<br>[`let c = c.enter()?;`](Chan::enter) | `Loop(Q.dual())` |
| `Continue(N)` | Returns a new `c` at the loop `N` levels out, or at `Continue(N - 1)`:<br>[`let c = c.resume()?;`](Chan::resume) | `Continue(N)` |
| `Done` | Closes the channel, dropping its transmit and receive ends:<br>[`c.close()?;`](Chan::close) | `Done` |
*/

#![allow(clippy::type_complexity)]
#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
// Documentation configuration
#![forbid(broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate derivative;

pub mod backend;
pub mod payload;
pub mod types;

mod chan;
mod env;
mod error;
mod session;

pub use chan::{Branches, Chan, ChanError};
pub use env::Environment;
pub use error::{Error, IllFormed, ProtocolError, Violation};
pub use payload::{Payload, PayloadSet, Tag};
pub use session::Session;
pub use types::{Action, Protocol};

/// The prelude module for quickly getting started with colloquy.
///
/// This module is designed to be imported as `use colloquy::prelude::*;`, which brings into scope
/// all the bits and pieces you need to start writing programs with colloquy.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::backend::{
        Choice, Receive, ReceiveChoice, Receiver, Transmit, TransmitChoice, Transmitter,
    };
    #[doc(no_inline)]
    pub use crate::{offer, Chan, ChanError, Protocol, Session};
}
