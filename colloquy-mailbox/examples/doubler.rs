//! Two threads share one mailbox: the asker sends numbers, and the doubler sends back each number
//! times two.
//!
//! Run with `RUST_LOG=trace` to watch every channel transition and mailbox wait.

use colloquy::prelude::*;
use colloquy_mailbox::Mailbox;
use colored::*;
use std::{
    error::Error,
    fmt::Display,
    sync::{Arc, Mutex},
};
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Options for the doubler demo.
#[derive(Debug, Clone, StructOpt)]
struct Options {
    /// Number of round trips to make
    #[structopt(short, long, default_value = "5")]
    rounds: i64,
}

/// A console shared by both roles, so that their lines of output never interleave.
#[derive(Debug, Clone, Default)]
struct Console {
    lock: Arc<Mutex<()>>,
}

impl Console {
    fn log(&self, role: &ColoredString, action: &str, value: Option<impl Display>) {
        // A poisoned console only means another role panicked mid-line; keep printing.
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match value {
            Some(value) => println!("{} {} {}", role, action, value),
            None => println!("{} {}", role, action),
        }
    }
}

/// The session from the asker's perspective.
fn session() -> Result<Session, colloquy::IllFormed> {
    Session::new(Protocol::loop_(Protocol::send::<i64>(Protocol::recv::<i64>(
        Protocol::continue_(0),
    ))))
}

/// The implementation of the asker.
fn asker(
    console: Console,
    rounds: i64,
    mut chan: colloquy_mailbox::Chan,
) -> Result<(), ChanError<Mailbox, Mailbox>> {
    let me = "T1".cyan();
    for n in 0..rounds {
        let c = chan.enter()?.send(n)?;
        console.log(&me, "sent", Some(n));
        let (doubled, c) = c.recv::<i64>()?;
        console.log(&me, "received", Some(doubled));
        chan = c.resume()?;
    }
    console.log(&me, "done", None::<i64>);
    Ok(())
}

/// The implementation of the doubler.
fn doubler(
    console: Console,
    rounds: i64,
    mut chan: colloquy_mailbox::Chan,
) -> Result<(), ChanError<Mailbox, Mailbox>> {
    let me = "T2".magenta();
    for _ in 0..rounds {
        let (n, c) = chan.enter()?.recv::<i64>()?;
        console.log(&me, "received", Some(n));
        let c = c.send(n * 2)?;
        console.log(&me, "sent", Some(n * 2));
        chan = c.resume()?;
    }
    console.log(&me, "done", None::<i64>);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Options { rounds } = Options::from_args();
    let session = session()?;
    let console = Console::default();

    let (t1, t2) = {
        let (c1, c2) = (console.clone(), console);
        session.connect(
            Mailbox::for_session(&session),
            move |chan| asker(c1, rounds, chan),
            move |chan| doubler(c2, rounds, chan),
        )
    };

    t1.join().map_err(|_| "asker panicked")??;
    t2.join().map_err(|_| "doubler panicked")??;
    Ok(())
}
