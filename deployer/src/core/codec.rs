//! Base64 text codec behind `deployer encode` / `deployer decode`.
//!
//! Encoded files hold either raw base64 text or, in [`Wrapper::Legacy`] mode,
//! the printable byte-literal form `b'<base64>'` that older HomeSetup scripts
//! wrote. Decoding accepts both.

use std::fmt::Write as _;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Textual container written around encoded/decoded payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wrapper {
    /// Plain base64 text on encode, verbatim bytes on decode.
    #[default]
    Raw,
    /// Byte-literal notation (`b'...'`) on both encode and decode output.
    Legacy,
}

/// Encode `input` as base64 text in the requested wrapper.
pub fn encode_text(input: &[u8], wrapper: Wrapper) -> String {
    let encoded = STANDARD.encode(input);
    match wrapper {
        Wrapper::Raw => encoded,
        Wrapper::Legacy => byte_literal(encoded.as_bytes()),
    }
}

/// Decode base64 `text`, ignoring surrounding whitespace and a legacy `b'...'` wrapper.
///
/// Input is taken as bytes so that non-UTF-8 files surface as decode errors.
pub fn decode_text(text: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_wrapper(text.trim_ascii()))
}

/// Render decoded bytes for writing to the destination file.
pub fn render_decoded(bytes: &[u8], wrapper: Wrapper) -> Vec<u8> {
    match wrapper {
        Wrapper::Raw => bytes.to_vec(),
        Wrapper::Legacy => byte_literal(bytes).into_bytes(),
    }
}

// `'` and `"` are outside the base64 alphabet, so raw text never matches here.
fn strip_wrapper(text: &[u8]) -> &[u8] {
    let Some(rest) = text.strip_prefix(b"b") else {
        return text;
    };
    for quote in [b"'", b"\""] {
        if let Some(inner) = rest
            .strip_prefix(quote)
            .and_then(|inner| inner.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Printable byte-literal notation: `b'...'`, switching to double quotes when
/// the payload contains a single quote but no double quote.
fn byte_literal(bytes: &[u8]) -> String {
    let quote = if bytes.contains(&b'\'') && !bytes.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote as char);
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            _ if byte == quote => {
                out.push('\\');
                out.push(quote as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push(quote as char);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_encode_is_plain_base64() {
        assert_eq!(encode_text(b"hello", Wrapper::Raw), "aGVsbG8=");
    }

    #[test]
    fn legacy_encode_wraps_in_byte_literal() {
        assert_eq!(encode_text(b"hello", Wrapper::Legacy), "b'aGVsbG8='");
    }

    #[test]
    fn decode_accepts_raw_and_legacy_text() {
        assert_eq!(decode_text(b"aGVsbG8=\n").expect("raw"), b"hello");
        assert_eq!(decode_text(b"b'aGVsbG8='").expect("legacy"), b"hello");
        assert_eq!(decode_text(b"b\"aGVsbG8=\"").expect("double quoted"), b"hello");
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(decode_text(b"not base64!").is_err());
        assert!(decode_text(b"b'aGVsbG8'").is_err());
        assert!(decode_text(b"\xff\xfe garbage").is_err());
    }

    #[test]
    fn legacy_render_escapes_like_a_byte_literal() {
        let rendered = render_decoded(b"tab\there\nback\\slash\x00\xff", Wrapper::Legacy);
        assert_eq!(
            String::from_utf8(rendered).expect("utf8"),
            "b'tab\\there\\nback\\\\slash\\x00\\xff'"
        );
    }

    #[test]
    fn legacy_render_picks_quote_style() {
        let single = render_decoded(b"it's", Wrapper::Legacy);
        assert_eq!(single, b"b\"it's\"");
        let both = render_decoded(b"it's \"x\"", Wrapper::Legacy);
        assert_eq!(both, b"b'it\\'s \"x\"'");
    }

    #[test]
    fn raw_render_is_verbatim() {
        assert_eq!(render_decoded(b"\x00abc", Wrapper::Raw), b"\x00abc");
    }
}
