use colloquy::{ChanError, Protocol, Session};
use colloquy_stream::{pair, ChoiceTags, Error, Reader, Writer};
use static_assertions::assert_impl_all;
use std::io::Cursor;

assert_impl_all!(colloquy_stream::StdioChan: Send);

type Chan = colloquy_stream::Chan<Vec<u8>, Cursor<&'static str>>;

/// Keep reading numbers and reporting their running total, until the total passes 10.
fn tally() -> Session {
    Session::new(Protocol::loop_(Protocol::send::<String>(Protocol::recv::<i64>(
        Protocol::choose(
            Protocol::send::<String>(Protocol::continue_(0)),
            Protocol::send::<String>(Protocol::Done),
        ),
    ))))
    .unwrap()
}

fn run_tally(mut chan: Chan) -> Result<Vec<u8>, ChanError<Writer<Vec<u8>>, Reader<Cursor<&'static str>>>> {
    let mut total = 0;
    loop {
        let (n, c) = chan.enter()?.send("> ".to_string())?.recv::<i64>()?;
        total += n;
        if total > 10 {
            let c = c.choose_right()?.send(format!("total {}, done\n", total))?;
            let (tx, _) = c.into_inner();
            return Ok(tx.into_inner());
        }
        chan = c.choose_left()?.send(format!("total {}\n", total))?.resume()?;
    }
}

#[test]
fn scripted_session_runs_to_completion() {
    let (tx, rx) = pair(Cursor::new("4\n5 6\n100\n"), Vec::new());
    let output = run_tally(tally().wrap(tx, rx)).unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "> total 4\n> total 9\n> total 15, done\n"
    );
}

#[test]
fn written_choice_tags_are_interleaved() {
    let (_, rx) = pair(Cursor::new("11\n"), Vec::new());
    let tx = Writer::new(Vec::new(), ChoiceTags::Written);
    let output = run_tally(tally().wrap(tx, rx)).unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "> \n1\ntotal 11, done\n\n"
    );
}

#[test]
fn running_out_of_input_is_a_transport_error() {
    let (tx, rx) = pair(Cursor::new("1 2\n"), Vec::new());
    match run_tally(tally().wrap(tx, rx)) {
        Err(colloquy::Error::Receive(Error::Eof)) => {}
        other => panic!("unexpected result: {:?}", other.map(String::from_utf8)),
    }
}

#[test]
fn garbage_input_is_a_parse_error() {
    let (tx, rx) = pair(Cursor::new("three\n"), Vec::new());
    match run_tally(tally().wrap(tx, rx)) {
        Err(colloquy::Error::Receive(Error::Parse { token, .. })) => assert_eq!(token, "three"),
        other => panic!("unexpected result: {:?}", other.map(String::from_utf8)),
    }
}

#[test]
fn the_other_side_can_follow_written_choices() {
    // The dual session reads the transcript written with choice tags.
    let (tx, rx) = pair(Cursor::new("> \n1\ntotal 11, done\n\n"), Vec::new());
    let c = tally().dual().wrap(tx, rx);
    let (prompt, c) = c.enter().unwrap().recv::<String>().unwrap();
    assert_eq!(prompt, ">");
    let c = c.send(11_i64).unwrap();
    let c = match c.offer().unwrap().case(colloquy::backend::Choice::Right) {
        Ok(c) => c,
        Err(_) => panic!("expected the right branch"),
    };
    let (word, c) = c.recv::<String>().unwrap();
    assert_eq!(word, "total");
    let (tx, _) = c.into_inner();
    assert_eq!(tx.into_inner(), b"11");
}

#[test]
fn written_values_stay_separate() {
    let session =
        Session::new(Protocol::send::<i64>(Protocol::send::<i64>(Protocol::Done))).unwrap();

    let (_, rx) = pair(Cursor::new(""), Vec::new());
    let tx = Writer::new(Vec::new(), ChoiceTags::Written);
    let c = session.wrap(tx, rx).send(1_i64).unwrap().send(2_i64).unwrap();
    let (tx, _) = c.into_inner();
    let transcript = String::from_utf8(tx.into_inner()).unwrap();
    assert_eq!(transcript, "1\n2\n");

    let (tx, rx) = pair(Cursor::new(transcript), Vec::new());
    let d = session.dual().wrap(tx, rx);
    let (first, d) = d.recv::<i64>().unwrap();
    let (second, d) = d.recv::<i64>().unwrap();
    d.close().unwrap();
    assert_eq!((first, second), (1, 2));
}
