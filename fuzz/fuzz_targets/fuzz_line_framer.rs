//! Fuzz target: `LineFramer::feed`
//!
//! Splits the input at a fuzzer-chosen point and feeds both halves.  The
//! framer must never panic, never hold more than `MAX_LINE` bytes, and
//! must produce the same lines as feeding the input in one go.
//!
//! cargo fuzz run fuzz_line_framer

#![no_main]

use libfuzzer_sys::fuzz_target;
use wizwatch::protocol::framer::{LineFramer, MAX_LINE};

fn lines(chunks: &[&[u8]]) -> (Vec<String>, usize) {
    let mut framer = LineFramer::new();
    let mut out = Vec::new();
    for chunk in chunks {
        framer.feed(chunk, |line| out.push(format!("{line:?}")));
        assert!(framer.pending() <= MAX_LINE);
    }
    (out, framer.pending())
}

fuzz_target!(|data: &[u8]| {
    let Some((&cut, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(cut).min(rest.len());
    let (a, b) = rest.split_at(at);

    assert_eq!(lines(&[a, b]), lines(&[rest]));
});
