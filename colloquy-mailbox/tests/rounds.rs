use colloquy::{offer, ChanError, Protocol, Session};
use colloquy_mailbox::{Error, Mailbox};
use static_assertions::assert_impl_all;
use std::{
    sync::mpsc,
    thread,
    time::Duration,
};

assert_impl_all!(Mailbox: Clone, Send, Sync);
assert_impl_all!(colloquy_mailbox::Chan: Send);

type Result<T> = std::result::Result<T, ChanError<Mailbox, Mailbox>>;

fn doubler() -> Session {
    Session::new(Protocol::loop_(Protocol::send::<i64>(Protocol::recv::<i64>(
        Protocol::continue_(0),
    ))))
    .unwrap()
}

#[test]
fn rounds_are_delivered_in_order_and_never_to_the_producer() {
    const ROUNDS: i64 = 100;
    let mailbox = Mailbox::new(doubler().payloads().clone());
    let other = mailbox.clone();

    // Both threads put and take on the same mailbox; each must only ever see the other's values.
    let echo = thread::spawn(move || -> std::result::Result<Vec<i64>, Error> {
        let mut seen = Vec::new();
        for _ in 0..ROUNDS {
            let n = other.take::<i64>()?;
            seen.push(n);
            other.put(-n)?;
        }
        Ok(seen)
    });

    let mut replies = Vec::new();
    for n in 1..=ROUNDS {
        mailbox.put(n).unwrap();
        replies.push(mailbox.take::<i64>().unwrap());
    }

    assert_eq!(echo.join().unwrap().unwrap(), (1..=ROUNDS).collect::<Vec<_>>());
    assert_eq!(replies, (1..=ROUNDS).map(|n| -n).collect::<Vec<_>>());
}

#[test]
fn take_after_last_round_blocks_until_a_put() {
    let mailbox = Mailbox::new(doubler().payloads().clone());
    let reader = mailbox.clone();
    let (taken_tx, taken_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for _ in 0..3 {
            taken_tx.send(reader.take::<i64>()).unwrap();
        }
    });

    for n in 0..2_i64 {
        mailbox.put(n).unwrap();
        assert_eq!(taken_rx.recv().unwrap(), Ok(n));
    }
    assert!(taken_rx.recv_timeout(Duration::from_millis(50)).is_err());

    mailbox.put(2_i64).unwrap();
    assert_eq!(taken_rx.recv().unwrap(), Ok(2));
    handle.join().unwrap();
}

#[test]
fn doubler_end_to_end() {
    const ROUNDS: i64 = 5;
    let session = doubler();

    let (asker, doubler) = session.connect(
        Mailbox::for_session(&session),
        |mut c| -> Result<Vec<i64>> {
            let mut answers = Vec::new();
            for n in 0..ROUNDS {
                let (doubled, next) = c.enter()?.send(n)?.recv::<i64>()?;
                answers.push(doubled);
                c = next.resume()?;
            }
            Ok(answers)
        },
        |mut c| -> Result<()> {
            for _ in 0..ROUNDS {
                let (n, next) = c.enter()?.recv::<i64>()?;
                c = next.send(n * 2)?.resume()?;
            }
            Ok(())
        },
    );

    assert_eq!(asker.join().unwrap().unwrap(), vec![0, 2, 4, 6, 8]);
    doubler.join().unwrap().unwrap();
}

#[test]
fn choices_cross_the_mailbox() {
    // The left side keeps sending numbers until it chooses to stop; the right side sums them.
    let session = Session::new(Protocol::loop_(Protocol::choose(
        Protocol::send::<i64>(Protocol::continue_(0)),
        Protocol::recv::<i64>(Protocol::Done),
    )))
    .unwrap();

    let (left, right) = session.connect(
        Mailbox::for_session(&session),
        |mut c| -> Result<i64> {
            for n in 1..=4_i64 {
                c = c.enter()?.choose_left()?.send(n)?.resume()?;
            }
            let (sum, c) = c.enter()?.choose_right()?.recv::<i64>()?;
            c.close()?;
            Ok(sum)
        },
        |mut c| -> Result<()> {
            let mut sum = 0;
            loop {
                c = c.enter()?;
                c = offer!(c => {
                    Left => {
                        let (n, c) = c.recv::<i64>()?;
                        sum += n;
                        c.resume()?
                    },
                    Right => return c.send(sum)?.close(),
                });
            }
        },
    );

    right.join().unwrap().unwrap();
    assert_eq!(left.join().unwrap().unwrap(), 10);
}
