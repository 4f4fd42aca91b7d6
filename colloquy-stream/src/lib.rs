//! This crate provides a backend implementation for the [`colloquy`] crate which speaks plain text
//! over any [`Write`] and [`BufRead`], such as a terminal. Values are sent by writing their
//! [`Display`] representation, and received by parsing the next whitespace-delimited token of input
//! with [`FromStr`]. Select this backend to put a session in front of a human, or to drive one from
//! a script.
//!
//! The [`Writer`] is the transmitting half and the [`Reader`] the receiving half of a
//! [`Chan`](colloquy::Chan): create them with [`pair`] (or [`stdio`] for the console) and wrap
//! them with [`Session::wrap`](colloquy::Session::wrap).
//!
//! # Examples
//!
//! ```
//! use colloquy::{Protocol, Session};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(Protocol::send::<String>(Protocol::recv::<u32>(
//!     Protocol::send::<String>(Protocol::Done),
//! )))?;
//! let (tx, rx) = colloquy_stream::pair(Cursor::new("41\n"), Vec::new());
//!
//! let c = session.wrap(tx, rx).send("Pick a number: ".to_string())?;
//! let (n, c) = c.recv::<u32>()?;
//! let c = c.send(format!("{} plus one is {}\n", n, n + 1))?;
//! let (tx, _) = c.into_inner();
//!
//! assert_eq!(tx.into_inner(), b"Pick a number: 41 plus one is 42\n");
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
    Payload,
};
use std::{
    any::Any,
    collections::VecDeque,
    convert::TryFrom,
    fmt::Display,
    io::{self, BufRead, BufReader, Stdin, Stdout, Write},
    str::FromStr,
};
use thiserror::Error;
use tracing::trace;

/// Shorthand for a [`Chan`](colloquy::Chan) using a [`Writer`] and [`Reader`].
pub type Chan<W, R> = colloquy::Chan<Writer<W>, Reader<R>>;

/// Shorthand for a [`Chan`](colloquy::Chan) talking to the console.
pub type StdioChan = Chan<Stdout, BufReader<Stdin>>;

/// An error thrown while writing to a [`Writer`] or reading from a [`Reader`].
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying reader or writer failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The reader ran out of input before a whole token was read.
    #[error("unexpected end of input")]
    Eof,
    /// A token could not be parsed as the type the session expected.
    #[error("could not read `{token}` as a `{target}`")]
    Parse {
        /// The offending token.
        token: String,
        /// The type the session expected.
        target: Payload,
    },
    /// A token which should have been a choice was not `0` or `1`.
    #[error("expected a choice of `0` or `1`, but read `{0}`")]
    Choice(String),
}

/// Whether a [`Writer`] writes the [`Choice`]s made in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceTags {
    /// Write each choice as a `0` or `1` on its own line, and end every value with a newline, for
    /// a peer which needs to follow along and read each value back as its own token.
    Written,
    /// Keep choices silent and write values exactly as given, for a human peer who only needs to
    /// see the messages.
    Hidden,
}

impl Default for ChoiceTags {
    fn default() -> Self {
        ChoiceTags::Hidden
    }
}

/// The transmitting half of a text stream, writing values with their [`Display`] representation.
///
/// With [`ChoiceTags::Written`], each value is followed by a newline so that consecutive values
/// stay separate tokens for a [`Reader`] on the other side.
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
    tags: ChoiceTags,
}

impl<W: Write> Writer<W> {
    /// Wrap `inner`, treating choices according to `tags`.
    pub fn new(inner: W, tags: ChoiceTags) -> Writer<W> {
        Writer { inner, tags }
    }

    /// Whether this writer writes choices.
    pub fn choice_tags(&self) -> ChoiceTags {
        self.tags
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// The receiving half of a text stream, parsing values from whitespace-delimited tokens.
///
/// Input is read a line at a time. Tokens left over on a line are kept for subsequent receives,
/// and a receive waiting for a token reads as many lines as it takes to find one.
#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Reader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Reader<R> {
        Reader {
            inner,
            pending: VecDeque::new(),
        }
    }

    /// Read the next whitespace-delimited token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the input ends first, or [`Error::Io`] if reading fails.
    pub fn token(&mut self) -> Result<String, Error> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                trace!(%token, "read token");
                return Ok(token);
            }
            let mut line = String::new();
            if self.inner.read_line(&mut line)? == 0 {
                return Err(Error::Eof);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
    }

    /// Unwrap the underlying reader, discarding any tokens read from it but not yet received.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Wrap a reader and a writer as the two halves of a text stream, with choices
/// [hidden](ChoiceTags::Hidden).
pub fn pair<R: BufRead, W: Write>(reader: R, writer: W) -> (Writer<W>, Reader<R>) {
    (
        Writer::new(writer, ChoiceTags::default()),
        Reader::new(reader),
    )
}

/// The two halves of a text stream connected to the console.
pub fn stdio() -> (Writer<Stdout>, Reader<BufReader<Stdin>>) {
    pair(BufReader::new(io::stdin()), io::stdout())
}

impl<W: Write> backend::Transmitter for Writer<W> {
    type Error = Error;
}

impl<W: Write> backend::TransmitChoice for Writer<W> {
    fn send_choice(&mut self, choice: Choice) -> Result<(), Self::Error> {
        match self.tags {
            ChoiceTags::Written => {
                writeln!(self.inner, "{}", choice)?;
                self.inner.flush()?;
            }
            ChoiceTags::Hidden => trace!(?choice, "choice not written"),
        }
        Ok(())
    }
}

impl<W: Write, T: Display> backend::Transmit<T> for Writer<W> {
    fn send(&mut self, message: T) -> Result<(), Self::Error> {
        match self.tags {
            ChoiceTags::Written => writeln!(self.inner, "{}", message)?,
            ChoiceTags::Hidden => write!(self.inner, "{}", message)?,
        }
        self.inner.flush()?;
        Ok(())
    }
}

impl<R: BufRead> backend::Receiver for Reader<R> {
    type Error = Error;
}

impl<R: BufRead> backend::ReceiveChoice for Reader<R> {
    fn recv_choice(&mut self) -> Result<Choice, Self::Error> {
        let token = self.token()?;
        token
            .parse::<u8>()
            .ok()
            .and_then(|n| Choice::try_from(n).ok())
            .ok_or(Error::Choice(token))
    }
}

impl<R: BufRead, T: FromStr + Any> backend::Receive<T> for Reader<R> {
    fn recv(&mut self) -> Result<T, Self::Error> {
        let token = self.token()?;
        token.parse().map_err(|_| Error::Parse {
            token,
            target: Payload::of::<T>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy::backend::{Receive, ReceiveChoice, Transmit, TransmitChoice};
    use std::io::Cursor;

    #[test]
    fn tokens_span_lines() {
        let mut rx = Reader::new(Cursor::new("1 2\n\n  3\nfour\n"));
        let numbers: Vec<u8> = (0..3)
            .map(|_| Receive::<u8>::recv(&mut rx).unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(Receive::<String>::recv(&mut rx).unwrap(), "four");
        assert!(matches!(Receive::<String>::recv(&mut rx), Err(Error::Eof)));
    }

    #[test]
    fn unparseable_token_names_its_target() {
        let mut rx = Reader::new(Cursor::new("seven\n"));
        match Receive::<i64>::recv(&mut rx) {
            Err(err @ Error::Parse { .. }) => {
                assert_eq!(err.to_string(), "could not read `seven` as a `i64`")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn choices_are_written_only_when_asked() {
        let mut hidden = Writer::new(Vec::new(), ChoiceTags::Hidden);
        hidden.send_choice(Choice::Right).unwrap();
        hidden.send("after").unwrap();
        assert_eq!(hidden.into_inner(), b"after");

        let mut written = Writer::new(Vec::new(), ChoiceTags::Written);
        written.send_choice(Choice::Right).unwrap();
        written.send("after").unwrap();
        assert_eq!(written.into_inner(), b"1\nafter\n");
    }

    #[test]
    fn choices_are_read_as_tokens() {
        let mut rx = Reader::new(Cursor::new("0 1\n2\n"));
        assert_eq!(rx.recv_choice().unwrap(), Choice::Left);
        assert_eq!(rx.recv_choice().unwrap(), Choice::Right);
        assert!(matches!(rx.recv_choice(), Err(Error::Choice(t)) if t == "2"));
    }
}
