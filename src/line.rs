//! Request-line and status-line.

use core::fmt;

use crate::error::{start_line, Result};
use crate::scan::{is_field_vchar, is_ows, Scanner};
use crate::target::{parse_target, RequestTarget};

/// `HTTP-version = "HTTP/" DIGIT "." DIGIT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    /// Create a version. Both parts must be a single decimal digit.
    pub fn new(major: u8, minor: u8) -> Option<Self> {
        (major <= 9 && minor <= 9).then_some(HttpVersion { major, minor })
    }

    /// Whether messages with this version may use transfer-codings and
    /// persistent connections by default, i.e. 1.1 or later.
    pub fn is_at_least_11(&self) -> bool {
        *self >= Self::HTTP_11
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

#[derive(Debug)]
pub(crate) struct RequestLine {
    pub method: String,
    pub target: RequestTarget,
    pub version: HttpVersion,
}

#[derive(Debug)]
pub(crate) struct StatusLine {
    pub version: HttpVersion,
    pub status: u16,
    pub reason: String,
}

/// Parse a request-line, without its CRLF. `offset` is where the line starts.
pub(crate) fn parse_request_line(
    line: &[u8],
    allow_userinfo: bool,
    offset: usize,
) -> Result<RequestLine> {
    let mut s = Scanner::new(line);

    let method = s
        .match_token()
        .ok_or_else(|| start_line("invalid method token", offset))?;
    let method = ascii(method);

    expect_sp(&mut s, "expected single SP after method", offset)?;

    let target_start = s.pos();
    let rest = s.rest();
    let target_len = rest
        .iter()
        .position(|c| *c == b' ')
        .ok_or_else(|| start_line("missing HTTP-version", offset + line.len()))?;

    let target = parse_target(
        &rest[..target_len],
        Some(&method),
        allow_userinfo,
        offset + target_start,
    )?;

    let mut s = Scanner::new(&rest[target_len + 1..]);
    let version_start = offset + target_start + target_len + 1;
    let version = parse_version(&mut s, version_start)?;

    if !s.is_empty() {
        return Err(start_line(
            "unexpected bytes after HTTP-version",
            version_start + s.pos(),
        ));
    }

    Ok(RequestLine {
        method,
        target,
        version,
    })
}

/// Parse a status-line, without its CRLF. `offset` is where the line starts.
pub(crate) fn parse_status_line(line: &[u8], offset: usize) -> Result<StatusLine> {
    let mut s = Scanner::new(line);

    let version = parse_version(&mut s, offset)?;

    expect_sp(&mut s, "expected single SP after HTTP-version", offset)?;

    let code_start = s.pos();
    let code = s.match_digits().unwrap_or_default();
    if code.len() != 3 {
        return Err(start_line(
            "status code must be three digits",
            offset + code_start,
        ));
    }
    let status = code
        .iter()
        .fold(0_u16, |acc, c| acc * 10 + (c - b'0') as u16);
    if !(100..=599).contains(&status) {
        return Err(start_line("status code out of range", offset + code_start));
    }

    if !s.expect_byte(b' ') {
        return Err(start_line("expected SP after status code", offset + s.pos()));
    }

    let reason_start = s.pos();
    let reason = s.rest();
    if let Some(i) = reason.iter().position(|c| !is_field_vchar(*c) && !is_ows(*c)) {
        return Err(start_line(
            "invalid byte in reason phrase",
            offset + reason_start + i,
        ));
    }
    let reason = String::from_utf8(reason.to_vec())
        .map_err(|_| start_line("reason phrase is not UTF-8", offset + reason_start))?;

    Ok(StatusLine {
        version,
        status,
        reason,
    })
}

fn parse_version(s: &mut Scanner<'_>, offset: usize) -> Result<HttpVersion> {
    let start = s.pos();
    let err = || start_line("invalid HTTP-version", offset + start);

    if !s.expect_bytes(b"HTTP/") {
        return Err(err());
    }

    let digit = |s: &mut Scanner<'_>| -> Result<u8> {
        let d = s.peek().filter(u8::is_ascii_digit).ok_or_else(err)?;
        s.advance();
        Ok(d - b'0')
    };

    let major = digit(s)?;
    if !s.expect_byte(b'.') {
        return Err(err());
    }
    let minor = digit(s)?;

    Ok(HttpVersion { major, minor })
}

fn expect_sp(s: &mut Scanner<'_>, reason: &'static str, offset: usize) -> Result<()> {
    // One SP, and not followed by more whitespace.
    if !s.expect_byte(b' ') || s.peek().map_or(false, is_ows) {
        return Err(start_line(reason, offset + s.pos()));
    }
    Ok(())
}

/// Tokens are ASCII.
fn ascii(src: &[u8]) -> String {
    String::from_utf8_lossy(src).into_owned()
}
