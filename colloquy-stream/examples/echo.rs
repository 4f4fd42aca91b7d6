//! Read numbers from the console and repeat each one back, until `-1` is entered.
//!
//! Run with `RUST_LOG=trace` to watch every channel transition.

use colloquy::prelude::*;
use colloquy_stream::StdioChan;
use colored::*;
use std::error::Error;
use tracing_subscriber::EnvFilter;

/// The session from the program's perspective: the console is on the other side.
fn session() -> Result<Session, colloquy::IllFormed> {
    Session::new(Protocol::loop_(Protocol::recv::<i64>(Protocol::choose(
        Protocol::send::<String>(Protocol::send::<i64>(Protocol::send::<String>(
            Protocol::continue_(0),
        ))),
        Protocol::send::<String>(Protocol::Done),
    ))))
}

/// The implementation of the echo loop.
fn echo(mut chan: StdioChan) -> Result<(), Box<dyn Error>> {
    loop {
        let (input, c) = chan.enter()?.recv::<i64>()?;
        if input == -1 {
            c.choose_right()?
                .send(format!("{}\n", "Goodbye!".bold()))?
                .close()?;
            return Ok(());
        }
        chan = c
            .choose_left()?
            .send("You said: ".green().to_string())?
            .send(input)?
            .send("\n".to_string())?
            .resume()?;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (tx, rx) = colloquy_stream::stdio();
    echo(session()?.wrap(tx, rx))
}
