//! A guessing game on the console: the program thinks of a number, and the player guesses until
//! they get it or give up.
//!
//! Run with `RUST_LOG=trace` to watch every channel transition.

use colloquy::prelude::*;
use colloquy_stream::StdioChan;
use colored::*;
use std::error::Error;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Options for the guessing game.
#[derive(Debug, Clone, StructOpt)]
struct Options {
    /// The largest number the program might think of
    #[structopt(short, long, default_value = "10")]
    max: u32,
    /// Seed for choosing the number, for a repeatable game
    #[structopt(short, long)]
    seed: Option<u64>,
}

/// The session from the program's perspective: the player is on the other side.
///
/// ```text
/// loop {
///     choose {
///         ask => { send prompt; recv guess; choose { wrong => { send prompt; recv answer; continue }, right => continue } },
///         exit => choose { lost => { send text; send number; send text }, won => send text },
///     }
/// }
/// ```
fn session() -> Result<Session, colloquy::IllFormed> {
    let ask = Protocol::send::<String>(Protocol::recv::<u32>(Protocol::choose(
        Protocol::send::<String>(Protocol::recv::<String>(Protocol::continue_(0))),
        Protocol::continue_(0),
    )));
    let lost = Protocol::send::<String>(Protocol::send::<u32>(Protocol::send::<String>(
        Protocol::Done,
    )));
    let won = Protocol::send::<String>(Protocol::Done);
    Session::new(Protocol::loop_(Protocol::choose(
        ask,
        Protocol::choose(lost, won),
    )))
}

/// The implementation of the game, returning whether the player won.
fn game(the_number: u32, mut chan: StdioChan) -> Result<bool, Box<dyn Error>> {
    let won = loop {
        let c = chan.enter()?.choose_left()?;
        let (guess, c) = c.send("Guess: ".to_string())?.recv::<u32>()?;
        if guess == the_number {
            chan = c.choose_right()?.resume()?;
            break true;
        }
        let (answer, c) = c
            .choose_left()?
            .send(format!("{} Keep playing? (y/n) ", "Incorrect.".red()))?
            .recv::<String>()?;
        chan = c.resume()?;
        if answer == "n" {
            break false;
        }
    };

    let c = chan.enter()?.choose_right()?;
    if won {
        c.choose_right()?
            .send(format!("{}\n", "You win!".green().bold()))?
            .close()?;
    } else {
        c.choose_left()?
            .send("You lose. I was thinking of ".to_string())?
            .send(the_number)?
            .send(".\n".to_string())?
            .close()?;
    }
    Ok(won)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Options { max, seed } = Options::from_args();
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let the_number = rng.u32(1..=max.max(1));

    let (tx, rx) = colloquy_stream::stdio();
    let won = game(the_number, session()?.wrap(tx, rx))?;
    tracing::debug!(won, "game over");
    Ok(())
}
