//! Byte cursor and the RFC 9110/9112/3986 character classes.

use crate::error::{limit, Error, ErrorKind, Limit, Result};

/// A cursor over an input slice.
///
/// The scanner never fails. Matching methods return `None` for an empty match
/// and leave the cursor untouched, callers decide what that means for their
/// grammar.
#[derive(Debug, Clone)]
pub(crate) struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Scanner { buf, pos: 0 }
    }

    #[inline(always)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    #[inline(always)]
    pub fn advance(&mut self) {
        if self.pos < self.buf.len() {
            self.pos += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Consume `b` if it is the next byte.
    pub fn expect_byte(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `bytes` if the input continues with exactly them.
    pub fn expect_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.rest().starts_with(bytes) {
            self.pos += bytes.len();
            true
        } else {
            false
        }
    }

    pub fn match_while(&mut self, pred: impl Fn(u8) -> bool) -> Option<&'a [u8]> {
        let start = self.pos;
        let len = self.rest().iter().take_while(|c| pred(**c)).count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&self.buf[start..self.pos])
    }

    /// `1*tchar`
    pub fn match_token(&mut self) -> Option<&'a [u8]> {
        self.match_while(is_tchar)
    }

    /// `1*DIGIT`
    pub fn match_digits(&mut self) -> Option<&'a [u8]> {
        self.match_while(|c| c.is_ascii_digit())
    }

    /// `1*HEXDIG`
    pub fn match_hex(&mut self) -> Option<&'a [u8]> {
        self.match_while(|c| c.is_ascii_hexdigit())
    }

    /// Skip `OWS` (or `BWS`, which has the same syntax).
    pub fn skip_ows(&mut self) {
        self.match_while(is_ows);
    }
}

/// Find the CR of the next CRLF at or after `from`.
///
/// `Ok(None)` means the line is not complete yet. A LF that isn't preceded
/// by CR, or a CR followed by anything but LF, is rejected as `kind`. Lines
/// longer than `max_len` (excluding the CRLF) fail with a line length error.
pub(crate) fn find_line(
    buf: &[u8],
    from: usize,
    max_len: usize,
    kind: ErrorKind,
) -> Result<Option<usize>> {
    let src = &buf[from..];
    let window = &src[..src.len().min(max_len.saturating_add(2))];

    let Some(i) = window.iter().position(|c| *c == b'\r' || *c == b'\n') else {
        if src.len() > max_len {
            return Err(limit(Limit::LineLength, from + max_len));
        }
        return Ok(None);
    };

    if src[i] == b'\n' {
        return Err(Error::at(kind, "bare LF line terminator", from + i));
    }

    if i > max_len {
        return Err(limit(Limit::LineLength, from + max_len));
    }

    match src.get(i + 1) {
        Some(b'\n') => Ok(Some(from + i)),
        Some(_) => Err(Error::at(kind, "bare CR in line", from + i)),
        None => Ok(None),
    }
}

/// tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." /
///         "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
#[inline]
pub(crate) fn is_tchar(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

#[inline]
pub(crate) fn is_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'.' | b'_' | b'~')
}

#[inline]
pub(crate) fn is_sub_delim(c: u8) -> bool {
    matches!(
        c,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
    )
}

/// pchar without the pct-encoded alternative, which is checked as a triple.
#[inline]
pub(crate) fn is_pchar(c: u8) -> bool {
    is_unreserved(c) || is_sub_delim(c) || c == b':' || c == b'@'
}

#[inline]
pub(crate) fn is_query_char(c: u8) -> bool {
    is_pchar(c) || c == b'/' || c == b'?'
}

/// Characters of a reg-name (and of userinfo, which also allows `:`).
#[inline]
pub(crate) fn is_reg_name_char(c: u8) -> bool {
    is_unreserved(c) || is_sub_delim(c)
}

#[inline]
pub(crate) fn is_userinfo_char(c: u8) -> bool {
    is_reg_name_char(c) || c == b':'
}

#[inline]
pub(crate) fn is_scheme_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.')
}

/// field-vchar = VCHAR / obs-text
#[inline]
pub(crate) fn is_field_vchar(c: u8) -> bool {
    matches!(c, 0x21..=0x7e | 0x80..=0xff)
}

#[inline]
pub(crate) fn is_ows(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// qdtext = HTAB / SP / %x21 / %x23-5B / %x5D-7E / obs-text
#[inline]
pub(crate) fn is_qdtext(c: u8) -> bool {
    matches!(c, b'\t' | b' ' | 0x21 | 0x23..=0x5b | 0x5d..=0x7e | 0x80..=0xff)
}
