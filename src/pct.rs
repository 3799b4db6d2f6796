//! Percent-encoded text kept as received, decoded on demand.

use std::borrow::Cow;
use std::str::Utf8Error;

use percent_encoding::{percent_decode, AsciiSet, PercentDecode, NON_ALPHANUMERIC};

use crate::error::{target, Result};

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything outside `unreserved / sub-delims` is encoded.
pub(crate) const REG_NAME: &AsciiSet = &UNRESERVED
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

pub(crate) const SEGMENT: &AsciiSet = &REG_NAME.remove(b':').remove(b'@');

pub(crate) const QUERY: &AsciiSet = &SEGMENT.remove(b'/').remove(b'?');

/// Check that `src` only holds bytes accepted by `allowed` or `%` HEXDIG HEXDIG.
///
/// `offset` is where `src` starts in the input, for error reporting.
pub(crate) fn validate(src: &[u8], allowed: impl Fn(u8) -> bool, offset: usize) -> Result<()> {
    let mut i = 0;
    while i < src.len() {
        let c = src[i];
        if c == b'%' {
            let valid = src.get(i + 1).map_or(false, u8::is_ascii_hexdigit)
                && src.get(i + 2).map_or(false, u8::is_ascii_hexdigit);
            if !valid {
                return Err(target("invalid percent-encoding", offset + i));
            }
            i += 3;
        } else if allowed(c) {
            i += 1;
        } else {
            return Err(target("character not allowed here", offset + i));
        }
    }
    Ok(())
}

macro_rules! encoded_text {
    ($(#[$doc:meta])* $name:ident, $set:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// The text as received, percent-encoding intact.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Lazy view of the decoded bytes.
            pub fn decode(&self) -> PercentDecode<'_> {
                percent_decode(self.0.as_bytes())
            }

            pub fn decode_utf8(&self) -> core::result::Result<Cow<'_, str>, Utf8Error> {
                self.decode().decode_utf8()
            }

            pub fn decode_utf8_lossy(&self) -> Cow<'_, str> {
                self.decode().decode_utf8_lossy()
            }

            /// Percent-encode unencoded text.
            pub fn encode(text: &str) -> Self {
                $name(percent_encoding::utf8_percent_encode(text, $set).to_string())
            }

            pub(crate) fn from_validated(s: &str) -> Self {
                $name(s.to_owned())
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

encoded_text!(
    /// One path segment, `*pchar`.
    Segment,
    SEGMENT
);

encoded_text!(
    /// The query component, without the leading `?`.
    Query,
    QUERY
);
