//! The authority component: `[ userinfo "@" ] host [ ":" port ]`.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::Utf8Error;

use percent_encoding::{percent_decode, PercentDecode};

use crate::error::{target, Result};
use crate::pct::{self, REG_NAME};
use crate::scan::{is_reg_name_char, is_sub_delim, is_unreserved, is_userinfo_char};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authority {
    userinfo: Option<String>,
    host: Host,
    port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// The text between the brackets, e.g. `v1.fe80::a+en1`.
    IpvFuture(String),
    RegName(RegName),
}

/// A registered name, as received.
///
/// Comparison and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct RegName(String);

impl Authority {
    pub fn new(host: Host, port: Option<u16>) -> Self {
        Authority {
            userinfo: None,
            host,
            port,
        }
    }

    /// Parse an authority. Userinfo is accepted here, request parsing applies
    /// [`Config::allow_userinfo`](crate::Config) on top.
    pub fn parse(s: &str) -> Result<Self> {
        parse_authority(s.as_bytes(), 0)
    }

    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// The port, `None` if it was absent or empty.
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl Host {
    pub fn parse(s: &str) -> Result<Self> {
        parse_host(s.as_bytes(), 0)
    }

    /// Registered name host. The text is percent-encoded where needed.
    pub fn reg_name(name: &str) -> Self {
        Host::RegName(RegName::encode(name))
    }

    pub fn is_ip(&self) -> bool {
        matches!(self, Host::Ipv4(_) | Host::Ipv6(_))
    }
}

impl RegName {
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

    pub fn encode(text: &str) -> Self {
        RegName(percent_encoding::utf8_percent_encode(text, REG_NAME).to_string())
    }
}

impl PartialEq for RegName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for RegName {}

impl Hash for RegName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.0.bytes() {
            state.write_u8(c.to_ascii_lowercase());
        }
    }
}

pub(crate) fn parse_authority(src: &[u8], offset: usize) -> Result<Authority> {
    parse_authority_parts(src, offset).map(|(a, _)| a)
}

/// Parse an authority, also telling whether a `:` port separator was present.
pub(crate) fn parse_authority_parts(src: &[u8], offset: usize) -> Result<(Authority, bool)> {
    let (userinfo, host_start) = match src.iter().position(|c| *c == b'@') {
        Some(at) => {
            pct::validate(&src[..at], is_userinfo_char, offset)?;
            (Some(to_string(&src[..at])), at + 1)
        }
        None => (None, 0),
    };

    let rest = &src[host_start..];
    let rest_offset = offset + host_start;

    // An IP-literal ends at the closing bracket, anything else at the port colon.
    let host_end = if rest.first() == Some(&b'[') {
        let close = rest
            .iter()
            .position(|c| *c == b']')
            .ok_or_else(|| target("unterminated IP literal", rest_offset))?;
        close + 1
    } else {
        rest.iter().position(|c| *c == b':').unwrap_or(rest.len())
    };

    let host = parse_host(&rest[..host_end], rest_offset)?;

    let (port, has_colon) = match &rest[host_end..] {
        [] => (None, false),
        [b':', digits @ ..] => (parse_port(digits, rest_offset + host_end + 1)?, true),
        _ => return Err(target("expected ':' before port", rest_offset + host_end)),
    };

    let authority = Authority {
        userinfo,
        host,
        port,
    };

    Ok((authority, has_colon))
}

/// port = *DIGIT. Empty is valid and yields `None`.
pub(crate) fn parse_port(digits: &[u8], offset: usize) -> Result<Option<u16>> {
    if digits.is_empty() {
        return Ok(None);
    }
    if let Some(i) = digits.iter().position(|c| !c.is_ascii_digit()) {
        return Err(target("port is not a number", offset + i));
    }
    let n = digits
        .iter()
        .try_fold(0_u16, |acc, c| acc.checked_mul(10)?.checked_add((c - b'0') as u16))
        .ok_or_else(|| target("port out of range", offset))?;
    Ok(Some(n))
}

pub(crate) fn parse_host(src: &[u8], offset: usize) -> Result<Host> {
    if let Some(inner) = src.strip_prefix(b"[") {
        let inner = inner
            .strip_suffix(b"]")
            .ok_or_else(|| target("unterminated IP literal", offset))?;

        if matches!(inner.first(), Some(b'v' | b'V')) {
            return parse_ipv_future(inner, offset + 1).map(Host::IpvFuture);
        }

        return parse_ipv6(inner)
            .map(Host::Ipv6)
            .ok_or_else(|| target("invalid IPv6 address", offset + 1));
    }

    if looks_like_ipv4(src) {
        // Dotted digits that are not a valid IPv4address are refused rather
        // than read as a reg-name, "010.0.0.1" means different things to
        // different resolvers.
        return parse_ipv4(src)
            .map(Host::Ipv4)
            .ok_or_else(|| target("invalid IPv4 address", offset));
    }

    pct::validate(src, is_reg_name_char, offset)?;
    Ok(Host::RegName(RegName(to_string(src))))
}

fn looks_like_ipv4(src: &[u8]) -> bool {
    !src.is_empty()
        && src.iter().all(|c| c.is_ascii_digit() || *c == b'.')
        && src.iter().filter(|c| **c == b'.').count() == 3
}

/// IPv4address = dec-octet "." dec-octet "." dec-octet "." dec-octet
pub(crate) fn parse_ipv4(src: &[u8]) -> Option<Ipv4Addr> {
    let mut octets = [0_u8; 4];
    let mut parts = src.split(|c| *c == b'.');

    for octet in &mut octets {
        *octet = parse_dec_octet(parts.next()?)?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

fn parse_dec_octet(src: &[u8]) -> Option<u8> {
    let valid_len = matches!(src.len(), 1..=3);
    let leading_zero = src.len() > 1 && src[0] == b'0';
    if !valid_len || leading_zero || !src.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let n = src.iter().fold(0_u16, |acc, c| acc * 10 + (c - b'0') as u16);
    u8::try_from(n).ok()
}

/// IPv6address in any of the nine ABNF alternatives.
pub(crate) fn parse_ipv6(src: &[u8]) -> Option<Ipv6Addr> {
    let mut groups = [0_u16; 8];

    let Some(dc) = src.windows(2).position(|w| w == b"::") else {
        // No elision: exactly eight groups, the last two may be an IPv4address.
        return (parse_groups(src, true, &mut groups)? == 8).then(|| Ipv6Addr::from(groups));
    };

    let head = &src[..dc];
    let tail = &src[dc + 2..];

    if tail.windows(2).any(|w| w == b"::") {
        return None;
    }

    let n = parse_groups(head, false, &mut groups)?;

    let mut tail_groups = [0_u16; 8];
    let m = parse_groups(tail, true, &mut tail_groups)?;

    // "::" stands for at least one group of zeros.
    if n + m > 7 {
        return None;
    }

    groups[8 - m..].copy_from_slice(&tail_groups[..m]);

    Some(Ipv6Addr::from(groups))
}

/// Parse `h16 *( ":" h16 )`, optionally ending in an IPv4address, into `out`.
fn parse_groups(src: &[u8], allow_ipv4: bool, out: &mut [u16; 8]) -> Option<usize> {
    if src.is_empty() {
        return Some(0);
    }

    let mut n = 0;
    let mut pieces = src.split(|c| *c == b':').peekable();

    while let Some(piece) = pieces.next() {
        let is_last = pieces.peek().is_none();

        if is_last && allow_ipv4 && piece.contains(&b'.') {
            let o = parse_ipv4(piece)?.octets();
            if n + 2 > 8 {
                return None;
            }
            out[n] = u16::from_be_bytes([o[0], o[1]]);
            out[n + 1] = u16::from_be_bytes([o[2], o[3]]);
            n += 2;
            continue;
        }

        if n == 8 || piece.is_empty() || piece.len() > 4 {
            return None;
        }

        out[n] = piece.iter().try_fold(0_u16, |acc, c| {
            let d = (*c as char).to_digit(16)?;
            Some(acc << 4 | d as u16)
        })?;
        n += 1;
    }

    Some(n)
}

/// IPvFuture = "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )
fn parse_ipv_future(src: &[u8], offset: usize) -> Result<String> {
    let err = || target("invalid IPvFuture literal", offset);

    let dot = src.iter().position(|c| *c == b'.').ok_or_else(err)?;
    let version = &src[1..dot];
    let rest = &src[dot + 1..];

    if version.is_empty() || !version.iter().all(u8::is_ascii_hexdigit) {
        return Err(err());
    }

    let rest_ok = |c: &u8| is_unreserved(*c) || is_sub_delim(*c) || *c == b':';
    if rest.is_empty() || !rest.iter().all(rest_ok) {
        return Err(err());
    }

    Ok(to_string(src))
}

/// Input validated against an ASCII char class.
fn to_string(src: &[u8]) -> String {
    String::from_utf8_lossy(src).into_owned()
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(u) = &self.userinfo {
            write!(f, "{}@", u)?;
        }
        write!(f, "{}", self.host)?;
        if let Some(p) = self.port {
            write!(f, ":{}", p)?;
        }
        Ok(())
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ipv4(v) => write!(f, "{}", v),
            Host::Ipv6(v) => write!(f, "[{}]", v),
            Host::IpvFuture(v) => write!(f, "[{}]", v),
            Host::RegName(v) => write!(f, "{}", v.0),
        }
    }
}

impl fmt::Display for RegName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
