use std::thread;

use colloquy::{
    backend::{mpsc, Choice},
    offer, Action, Error, Payload, Protocol, Session, Violation,
};
use static_assertions::{assert_impl_all, assert_not_impl_any};

assert_not_impl_any!(mpsc::Chan: Clone, Copy);
assert_impl_all!(mpsc::Chan: Send);

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn doubler() -> Session {
    Session::new(Protocol::loop_(Protocol::send::<i64>(Protocol::recv::<i64>(
        Protocol::continue_(0),
    ))))
    .unwrap()
}

#[test]
fn doubler_across_threads() -> Result<()> {
    let (client, server) = doubler().channel(mpsc::channel);

    let server = thread::spawn(move || -> std::result::Result<(), mpsc::RecvError> {
        let mut server = server;
        loop {
            let (n, chan) = match server.enter().and_then(|c| c.recv::<i64>()) {
                Ok(received) => received,
                Err(Error::Receive(mpsc::RecvError::Closed)) => return Ok(()),
                Err(other) => panic!("server failed: {}", other),
            };
            server = chan.send(n * 2).unwrap().resume().unwrap();
        }
    });

    let mut client = client;
    let mut answers = Vec::new();
    for n in 0..5_i64 {
        let (doubled, chan) = client.enter()?.send(n)?.recv::<i64>()?;
        answers.push(doubled);
        client = chan.resume()?;
    }
    drop(client);

    assert_eq!(answers, vec![0, 2, 4, 6, 8]);
    server.join().unwrap()?;
    Ok(())
}

#[test]
fn nested_loops_resume_outwards() -> Result<()> {
    // Loop { Send i64; Loop { Choose(Recv bool; Continue, Continue<_1>) } }
    let session = Session::new(Protocol::loop_(Protocol::send::<i64>(Protocol::loop_(
        Protocol::choose(
            Protocol::recv::<bool>(Protocol::continue_(0)),
            Protocol::continue_(1),
        ),
    ))))?;
    let (c, d) = session.channel(mpsc::channel);

    let c = c.enter()?.send(1_i64)?.enter()?;
    assert_eq!(c.environment().depth(), 2);

    let (n, d) = d.enter()?.recv::<i64>()?;
    assert_eq!(n, 1);
    let d = d.enter()?;

    // Inner iteration: choose left, then go round the inner loop.
    let c = c.choose_left()?;
    let d = offer!(d => {
        Left => d.send(true)?.resume()?,
        Right => panic!("expected the left branch"),
    });
    let (b, c) = c.recv::<bool>()?;
    assert!(b);
    let c = c.resume()?;
    assert_eq!(c.action(), Action::Loop);
    assert_eq!(c.environment().depth(), 1);
    let c = c.enter()?;
    let d = d.enter()?;

    // Then choose right, jumping to the outer loop.
    let c = c.choose_right()?.resume()?;
    assert_eq!(c.action(), Action::Continue);
    assert_eq!(c.environment().depth(), 1);
    let c = c.resume()?;
    assert_eq!(c.protocol(), session.protocol());
    assert!(c.environment().is_empty());

    let d = match d.offer()?.case(Choice::Left) {
        Ok(_) => panic!("expected the right branch"),
        Err(branches) => branches.case(Choice::Right).unwrap(),
    };
    let d = d.resume()?.resume()?;
    assert_eq!(d.protocol(), session.dual().protocol());

    // A fresh outer iteration works from where the loop started.
    let _ = c.enter()?.send(2_i64)?;
    let (n, _) = d.enter()?.recv::<i64>()?;
    assert_eq!(n, 2);
    Ok(())
}

#[test]
fn continue_unwinds_one_loop_per_resume() -> Result<()> {
    // Loop { Send i64; Loop { Loop { Choose(Continue<_2>, Continue<_1>) } } }
    let middle = Protocol::loop_(Protocol::loop_(Protocol::choose(
        Protocol::continue_(2),
        Protocol::continue_(1),
    )));
    let session = Session::new(Protocol::loop_(Protocol::send::<i64>(middle.clone())))?;
    let (c, _peer) = session.channel(mpsc::channel);

    let c = c.enter()?.send(1_i64)?.enter()?.enter()?;
    assert_eq!(c.environment().depth(), 3);

    // `Continue<_1>` lands on the middle loop after two resumes.
    let c = c.choose_right()?.resume()?;
    assert_eq!(c.protocol(), &Protocol::Continue(0));
    assert_eq!(c.environment().depth(), 2);
    let c = c.resume()?;
    assert_eq!(c.protocol(), &middle);
    assert_eq!(c.environment().depth(), 1);

    // `Continue<_2>` takes three resumes to get back to the outermost loop.
    let c = c.enter()?.enter()?.choose_left()?;
    assert_eq!(c.environment().depth(), 3);
    let c = c.resume()?;
    assert_eq!(c.protocol(), &Protocol::Continue(1));
    assert_eq!(c.environment().depth(), 2);
    let c = c.resume()?;
    assert_eq!(c.protocol(), &Protocol::Continue(0));
    assert_eq!(c.environment().depth(), 1);
    let c = c.resume()?;
    assert_eq!(c.protocol(), session.protocol());
    assert!(c.environment().is_empty());

    let _ = c.enter()?.send(2_i64)?;
    Ok(())
}

#[test]
fn unchosen_branch_is_inaccessible() -> Result<()> {
    let session = Session::new(Protocol::choose(
        Protocol::send::<i64>(Protocol::Done),
        Protocol::recv::<String>(Protocol::Done),
    ))?;
    let (c, _d) = session.channel(mpsc::channel);

    let err = c.choose_left()?.recv::<String>().unwrap_err();
    match err {
        Error::Violation(v) => assert_eq!(
            v,
            Violation::Action {
                expected: Action::Send,
                attempted: Action::Recv
            }
        ),
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[test]
fn wrong_payload_is_a_violation() -> Result<()> {
    let session = Session::new(Protocol::send::<i64>(Protocol::Done))?;
    let (c, _d) = session.channel(mpsc::channel);

    let err = c.send(1_u8).unwrap_err();
    match err {
        Error::Violation(v) => {
            assert_eq!(
                v,
                Violation::Payload {
                    action: Action::Send,
                    expected: Payload::of::<i64>(),
                    attempted: Payload::of::<u8>(),
                }
            );
            assert_eq!(
                v.to_string(),
                "attempted `Send` of a `u8`, but the session carries a `i64` here"
            );
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[test]
fn closing_early_is_a_violation() -> Result<()> {
    let session = Session::new(Protocol::recv::<i64>(Protocol::Done))?;
    let (c, d) = session.channel(mpsc::channel);

    let d = d.send(7_i64)?;
    let err = c.close().unwrap_err();
    assert!(err.is_violation());
    assert_eq!(
        err.to_string(),
        "attempted a `Done` operation, but the session's next action is `Recv`"
    );
    d.close()?;
    Ok(())
}

#[test]
fn channel_can_be_unwrapped_midway() -> Result<()> {
    let session = Session::new(Protocol::send::<String>(Protocol::recv::<String>(
        Protocol::Done,
    )))?;
    let (c, d) = session.channel(mpsc::channel);

    let c = c.send("hello".to_string())?;
    assert_eq!(c.action(), Action::Recv);
    let (tx, rx) = c.into_inner();

    let (s, d) = d.recv::<String>()?;
    assert_eq!(s, "hello");
    d.send("goodbye".to_string())?.close()?;

    // The raw receiver still carries the rest of the conversation.
    let c = Session::new(Protocol::recv::<String>(Protocol::Done))?.wrap(tx, rx);
    let (s, c) = c.recv::<String>()?;
    c.close()?;
    assert_eq!(s, "goodbye");
    Ok(())
}

#[test]
fn hung_up_peer_is_a_transport_error() -> Result<()> {
    let (c, d) = doubler().channel(mpsc::channel);
    drop(d);
    match c.enter()?.send(1_i64) {
        Err(Error::Transmit(_)) => Ok(()),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("send to a dropped peer succeeded"),
    }
}
