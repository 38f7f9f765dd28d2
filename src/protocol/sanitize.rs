//! Rewrites the two JavaScript-isms Gadgetbridge embeds in `GB(...)`
//! payloads so the result is plain JSON text.
//!
//! 1. `atob("<base64>")` → a quoted JSON string.  The decoded bytes are
//!    read as Latin-1, re-encoded as UTF-8, `"`/`\` escaped and control
//!    bytes dropped.  Undecodable payloads become `"?"`.
//! 2. `\xHH` → the raw byte `0xHH`.  An escaped backslash (`\\`) is copied
//!    through untouched so `\\x41` stays literal text.
//!
//! Text containing neither construct is returned unchanged, which makes
//! `sanitize` idempotent on it.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use super::find_bytes;

const ATOB_OPEN: &[u8] = b"atob(\"";
const ATOB_CLOSE: &[u8] = b"\")";

/// Espruino's `atob` accepts unpadded input; so do we.
const ATOB: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Run both rewriting passes.
pub fn sanitize(input: &[u8]) -> Vec<u8> {
    decode_hex_escapes(&expand_atob(input))
}

/// Pass 1: splice every `atob("...")` wrapper out for a quoted string.
pub fn expand_atob(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = find_bytes(rest, ATOB_OPEN) {
        let payload_start = open + ATOB_OPEN.len();
        let Some(close) = find_bytes(&rest[payload_start..], ATOB_CLOSE) else {
            break;
        };
        out.extend_from_slice(&rest[..open]);
        push_quoted_latin1(&mut out, &rest[payload_start..payload_start + close]);
        rest = &rest[payload_start + close + ATOB_CLOSE.len()..];
    }
    out.extend_from_slice(rest);
    out
}

fn push_quoted_latin1(out: &mut Vec<u8>, b64: &[u8]) {
    out.push(b'"');
    match ATOB.decode(b64) {
        Ok(bytes) => {
            let mut utf8 = [0u8; 4];
            for b in bytes {
                match b {
                    b'"' => out.extend_from_slice(b"\\\""),
                    b'\\' => out.extend_from_slice(b"\\\\"),
                    0..=0x1F => {}
                    _ => out.extend_from_slice(char::from(b).encode_utf8(&mut utf8).as_bytes()),
                }
            }
        }
        Err(e) => {
            log::debug!("GB: atob payload rejected ({})", e);
            out.push(b'?');
        }
    }
    out.push(b'"');
}

/// Pass 2: replace `\xHH` escapes with the byte they encode.
///
/// The resulting buffer may no longer be valid UTF-8 (e.g. `\xE9`); such
/// payloads fail JSON decoding downstream and are dropped.
pub fn decode_hex_escapes(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' {
            match input.get(i + 1) {
                Some(b'\\') => {
                    out.extend_from_slice(b"\\\\");
                    i += 2;
                    continue;
                }
                Some(b'x') => {
                    if let (Some(hi), Some(lo)) = (
                        input.get(i + 2).and_then(|&c| hex_val(c)),
                        input.get(i + 3).and_then(|&c| hex_val(c)),
                    ) {
                        out.push((hi << 4) | lo);
                        i += 4;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
