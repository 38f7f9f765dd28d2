//! Fuzz target: `sanitize` + `decode`
//!
//! Treats the input as the inner text of a `GB(...)` line.  Sanitizing and
//! decoding must never panic, and a decoded message must carry a non-empty
//! type tag.
//!
//! cargo fuzz run fuzz_gb_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use wizwatch::protocol::message::decode;
use wizwatch::protocol::sanitize::sanitize;

fuzz_target!(|data: &[u8]| {
    let clean = sanitize(data);
    if let Ok(msg) = decode(&clean) {
        let _ = msg.type_tag();
    }
});
