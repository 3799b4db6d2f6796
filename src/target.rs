//! The request-target and its four forms.

use std::borrow::Cow;
use std::fmt;

use crate::authority::{parse_authority_parts, Authority, Host};
use crate::error::{target, Error, ErrorKind, Result};
use crate::pct::{self, Query, Segment};
use crate::scan::{is_pchar, is_query_char, is_scheme_char, Scanner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// `absolute-path [ "?" query ]`, e.g. `/where?q=now`.
    Origin { path: Path, query: Option<Query> },
    /// `absolute-URI`, used towards proxies.
    Absolute {
        scheme: String,
        /// `None` for the hier-part alternatives without `//`.
        authority: Option<Authority>,
        path: Path,
        query: Option<Query>,
    },
    /// `uri-host ":" port`, only for CONNECT.
    Authority(Authority),
    /// `*`, only for server-wide OPTIONS.
    Asterisk,
}

/// A sequence of path segments.
///
/// A rooted path starts with `/`. `/` itself is a rooted path with one empty
/// segment, and the empty path has no segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    rooted: bool,
    segments: Vec<Segment>,
}

impl RequestTarget {
    /// Parse a request-target, trying the forms in the order `*`, origin,
    /// absolute and finally authority.
    pub fn parse(s: &str) -> Result<Self> {
        parse_target(s.as_bytes(), None, true, 0)
    }

    /// Parse a request-target for the given method.
    ///
    /// For `CONNECT` the authority-form is tried first: `example.com:443` is
    /// also a valid absolute-URI with the scheme `example.com`.
    pub fn parse_for_method(method: &str, s: &str) -> Result<Self> {
        parse_target(s.as_bytes(), Some(method), true, 0)
    }

    /// Origin-form target from already encoded parts.
    pub fn origin(path: Path, query: Option<Query>) -> Self {
        RequestTarget::Origin { path, query }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            RequestTarget::Origin { path, .. } | RequestTarget::Absolute { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn query(&self) -> Option<&Query> {
        match self {
            RequestTarget::Origin { query, .. } | RequestTarget::Absolute { query, .. } => {
                query.as_ref()
            }
            _ => None,
        }
    }

    pub fn authority(&self) -> Option<&Authority> {
        match self {
            RequestTarget::Absolute { authority, .. } => authority.as_ref(),
            RequestTarget::Authority(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_asterisk(&self) -> bool {
        matches!(self, RequestTarget::Asterisk)
    }

    /// Check the pairing of target form and method.
    ///
    /// The asterisk-form is only valid with OPTIONS, and CONNECT takes the
    /// authority-form and nothing else.
    pub fn check_method(&self, method: &str) -> Result<()> {
        let is_connect = method == "CONNECT";
        let reason = match self {
            RequestTarget::Asterisk if method != "OPTIONS" => {
                "asterisk-form is only allowed with OPTIONS"
            }
            RequestTarget::Authority(_) if !is_connect => {
                "authority-form is only allowed with CONNECT"
            }
            RequestTarget::Authority(_) => return Ok(()),
            _ if is_connect => "CONNECT requires the authority-form",
            _ => return Ok(()),
        };
        Err(Error::new(ErrorKind::InvalidRequestTarget, reason))
    }
}

impl Path {
    /// The path `/`.
    pub fn root() -> Self {
        Path {
            rooted: true,
            segments: vec![Segment::from_validated("")],
        }
    }

    /// A rooted path from unencoded segments, percent-encoding as needed.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<_> = segments
            .into_iter()
            .map(|s| Segment::encode(s.as_ref()))
            .collect();

        if segments.is_empty() {
            return Path::root();
        }

        Path {
            rooted: true,
            segments,
        }
    }

    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Decoded segments, each decoded separately so an encoded `%2F` stays
    /// inside its segment.
    pub fn decoded_segments(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.segments.iter().map(|s| s.decode_utf8_lossy())
    }

    /// The whole path decoded, e.g. `/a b/c` for `/a%20b/c`.
    ///
    /// Lossy: `/a%2Fb` and `/a/b` both decode to `/a/b`.
    pub fn to_decoded_string(&self) -> String {
        let mut s = String::new();
        for (i, seg) in self.decoded_segments().enumerate() {
            if self.rooted || i > 0 {
                s.push('/');
            }
            s.push_str(&seg);
        }
        s
    }
}

pub(crate) fn parse_target(
    src: &[u8],
    method: Option<&str>,
    allow_userinfo: bool,
    offset: usize,
) -> Result<RequestTarget> {
    let Some(first) = src.first() else {
        return Err(target("empty request-target", offset));
    };

    if method == Some("CONNECT") {
        return parse_authority_form(src, allow_userinfo, offset);
    }

    match *first {
        b'*' if src.len() == 1 => Ok(RequestTarget::Asterisk),
        b'*' => Err(target("asterisk-form must be a single '*'", offset + 1)),
        b'/' => parse_origin_form(src, offset),
        _ => match scheme_len(src) {
            Some(n) => parse_absolute_form(src, n, allow_userinfo, offset),
            None => parse_authority_form(src, allow_userinfo, offset),
        },
    }
}

/// Length of `scheme` if the input starts with `scheme ":"`.
fn scheme_len(src: &[u8]) -> Option<usize> {
    let mut s = Scanner::new(src);
    if !s.peek()?.is_ascii_alphabetic() {
        return None;
    }
    let n = s.match_while(is_scheme_char)?.len();
    s.expect_byte(b':').then_some(n)
}

fn parse_origin_form(src: &[u8], offset: usize) -> Result<RequestTarget> {
    let (path, query) = split_query(src, offset)?;
    let path = parse_path(path, offset)?;
    Ok(RequestTarget::Origin { path, query })
}

fn parse_absolute_form(
    src: &[u8],
    scheme_len: usize,
    allow_userinfo: bool,
    offset: usize,
) -> Result<RequestTarget> {
    let scheme = ascii(&src[..scheme_len]).into_owned();
    let hier_start = scheme_len + 1;
    let (hier, query) = split_query(&src[hier_start..], offset + hier_start)?;
    let hier_offset = offset + hier_start;

    let is_http = scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https");

    let (authority, path) = if let Some(rest) = hier.strip_prefix(b"//") {
        let auth_end = rest.iter().position(|c| *c == b'/').unwrap_or(rest.len());
        let auth_offset = hier_offset + 2;
        let (authority, _) = parse_authority_parts(&rest[..auth_end], auth_offset)?;

        check_userinfo(&authority, allow_userinfo, auth_offset)?;
        if is_http && is_empty_host(authority.host()) {
            return Err(target("http URI with empty host", auth_offset));
        }

        let path = parse_path(&rest[auth_end..], auth_offset + auth_end)?;
        (Some(authority), path)
    } else {
        if is_http {
            return Err(target("http URI without authority", hier_offset));
        }
        (None, parse_path(hier, hier_offset)?)
    };

    Ok(RequestTarget::Absolute {
        scheme,
        authority,
        path,
        query,
    })
}

fn parse_authority_form(src: &[u8], allow_userinfo: bool, offset: usize) -> Result<RequestTarget> {
    let (authority, has_colon) = parse_authority_parts(src, offset)?;

    check_userinfo(&authority, allow_userinfo, offset)?;

    if is_empty_host(authority.host()) {
        return Err(target("empty host", offset));
    }
    if !has_colon {
        return Err(target("authority-form requires a port", offset + src.len()));
    }

    Ok(RequestTarget::Authority(authority))
}

fn check_userinfo(authority: &Authority, allow: bool, offset: usize) -> Result<()> {
    if !allow && authority.userinfo().is_some() {
        return Err(target("userinfo is not allowed", offset));
    }
    Ok(())
}

fn is_empty_host(host: &Host) -> bool {
    matches!(host, Host::RegName(r) if r.as_str().is_empty())
}

/// Split off and validate the query, if any.
fn split_query(src: &[u8], offset: usize) -> Result<(&[u8], Option<Query>)> {
    let Some(q) = src.iter().position(|c| *c == b'?') else {
        return Ok((src, None));
    };
    let query = &src[q + 1..];
    pct::validate(query, is_query_char, offset + q + 1)?;
    Ok((&src[..q], Some(Query::from_validated(&ascii(query)))))
}

/// path-abempty, path-absolute, path-rootless or path-empty, depending on the
/// first byte.
fn parse_path(src: &[u8], offset: usize) -> Result<Path> {
    if src.is_empty() {
        return Ok(Path::default());
    }

    let rooted = src[0] == b'/';
    let body = if rooted { &src[1..] } else { src };

    let mut pos = offset + rooted as usize;
    let mut segments = Vec::new();

    for seg in body.split(|c| *c == b'/') {
        pct::validate(seg, is_pchar, pos)?;
        segments.push(Segment::from_validated(&ascii(seg)));
        pos += seg.len() + 1;
    }

    Ok(Path { rooted, segments })
}

/// Validated input is ASCII.
fn ascii(src: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(src)
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Origin { path, query } => {
                write!(f, "{}", path)?;
                write_query(f, query.as_ref())
            }
            RequestTarget::Absolute {
                scheme,
                authority,
                path,
                query,
            } => {
                write!(f, "{}:", scheme)?;
                if let Some(a) = authority {
                    write!(f, "//{}", a)?;
                }
                write!(f, "{}", path)?;
                write_query(f, query.as_ref())
            }
            RequestTarget::Authority(a) => {
                if let Some(u) = a.userinfo() {
                    write!(f, "{}@", u)?;
                }
                // The colon is mandatory in this form, even with an empty port.
                write!(f, "{}:", a.host())?;
                if let Some(p) = a.port() {
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
            RequestTarget::Asterisk => write!(f, "*"),
        }
    }
}

fn write_query(f: &mut fmt::Formatter<'_>, query: Option<&Query>) -> fmt::Result {
    match query {
        Some(q) => write!(f, "?{}", q),
        None => Ok(()),
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if self.rooted || i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn decoded(p: &Path) -> Vec<String> {
        p.decoded_segments().map(|s| s.into_owned()).collect()
    }

    #[test]
    fn origin_form() -> Result<()> {
        let t = RequestTarget::parse("/a%20b?x=1")?;
        let RequestTarget::Origin { path, query } = &t else {
            panic!("not origin-form: {:?}", t);
        };
        assert_eq!(decoded(path), ["a b"]);
        assert_eq!(query.as_ref().map(|q| q.as_str()), Some("x=1"));
        assert_eq!(t.to_string(), "/a%20b?x=1");
        Ok(())
    }

    #[test]
    fn origin_form_empty_segments() -> Result<()> {
        let t = RequestTarget::parse("/a//b/")?;
        assert_eq!(decoded(t.path().unwrap()), ["a", "", "b", ""]);
        assert_eq!(t.to_string(), "/a//b/");

        let t = RequestTarget::parse("/")?;
        assert_eq!(t.path(), Some(&Path::root()));
        assert_eq!(t.to_string(), "/");
        Ok(())
    }

    #[test]
    fn query_may_hold_slash_and_question() -> Result<()> {
        let t = RequestTarget::parse("/p?a=/b?c")?;
        assert_eq!(t.query().unwrap().as_str(), "a=/b?c");
        Ok(())
    }

    #[test]
    fn origin_form_failures() {
        for (s, at) in [("/a%2x", 2), ("/a b", 2), ("/a#frag", 2), ("/?q=#", 4), ("/%", 1)] {
            let e = RequestTarget::parse(s).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget, "{}", s);
            assert_eq!(e.offset(), Some(at), "{}", s);
        }
    }

    #[test]
    fn asterisk_form() -> Result<()> {
        assert_eq!(RequestTarget::parse("*")?, RequestTarget::Asterisk);
        let e = RequestTarget::parse("*x").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget);
        Ok(())
    }

    #[test]
    fn absolute_form() -> Result<()> {
        let t = RequestTarget::parse("http://www.example.org:8001/pub/WWW/TheProject.html?x")?;
        let RequestTarget::Absolute {
            scheme,
            authority,
            path,
            query,
        } = &t
        else {
            panic!("not absolute-form: {:?}", t);
        };
        assert_eq!(scheme, "http");
        let a = authority.as_ref().unwrap();
        assert_eq!(a.host(), &Host::reg_name("www.example.org"));
        assert_eq!(a.port(), Some(8001));
        assert_eq!(decoded(path), ["pub", "WWW", "TheProject.html"]);
        assert_eq!(query.as_ref().unwrap().as_str(), "x");
        assert_eq!(
            t.to_string(),
            "http://www.example.org:8001/pub/WWW/TheProject.html?x"
        );
        Ok(())
    }

    #[test]
    fn absolute_form_hier_part_variants() -> Result<()> {
        // path-abempty that is empty
        let t = RequestTarget::parse("http://[::1]")?;
        assert_eq!(
            t.authority().unwrap().host(),
            &Host::Ipv6(Ipv6Addr::LOCALHOST)
        );
        assert!(t.path().unwrap().is_empty());
        assert_eq!(t.to_string(), "http://[::1]");

        // path-rootless
        let t = RequestTarget::parse("urn:isbn:0451450523")?;
        assert_eq!(t.authority(), None);
        assert_eq!(decoded(t.path().unwrap()), ["isbn:0451450523"]);
        assert!(!t.path().unwrap().is_rooted());
        assert_eq!(t.to_string(), "urn:isbn:0451450523");

        // path-absolute
        let t = RequestTarget::parse("file:/etc/hosts")?;
        assert_eq!(decoded(t.path().unwrap()), ["etc", "hosts"]);
        assert_eq!(t.to_string(), "file:/etc/hosts");

        // path-empty
        let t = RequestTarget::parse("about:")?;
        assert!(t.path().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn absolute_form_failures() {
        let cases = [
            "http://[::1/",
            "http:///nohost",
            "http:/no/authority",
            "http://user@host/",
            "http://host:99999/",
            "http://010.1.1.1/",
        ];
        for s in cases {
            let e = RequestTarget::parse_for_method("GET", s);
            // userinfo is accepted by the plain grammar, refused by policy.
            if s.contains('@') {
                assert!(e.is_ok());
                let e = parse_target(s.as_bytes(), Some("GET"), false, 0).unwrap_err();
                assert_eq!(e.reason(), "userinfo is not allowed");
                continue;
            }
            let e = e.unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget, "{}", s);
        }
    }

    #[test]
    fn authority_form_for_connect() -> Result<()> {
        let t = RequestTarget::parse_for_method("CONNECT", "example.com:443")?;
        assert_eq!(
            t,
            RequestTarget::Authority(Authority::new(Host::reg_name("example.com"), Some(443)))
        );
        assert_eq!(t.to_string(), "example.com:443");

        let t = RequestTarget::parse_for_method("CONNECT", "192.0.2.1:80")?;
        assert_eq!(
            t.authority().unwrap().host(),
            &Host::Ipv4(Ipv4Addr::new(192, 0, 2, 1))
        );

        // Empty port survives rendering.
        let t = RequestTarget::parse_for_method("CONNECT", "example.com:")?;
        assert_eq!(t.authority().unwrap().port(), None);
        assert_eq!(t.to_string(), "example.com:");
        Ok(())
    }

    #[test]
    fn authority_form_failures() {
        for s in ["example.com", ":443", "[::1:443", "a/b:1"] {
            let e = RequestTarget::parse_for_method("CONNECT", s).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget, "{}", s);
        }
    }

    #[test]
    fn without_method_scheme_wins() -> Result<()> {
        // Syntactically a scheme "example.com" with path "443".
        let t = RequestTarget::parse("example.com:443")?;
        assert!(matches!(t, RequestTarget::Absolute { .. }));
        // Not a valid scheme, so authority-form.
        let t = RequestTarget::parse("1.2.3.4:80")?;
        assert!(matches!(t, RequestTarget::Authority(_)));
        Ok(())
    }

    #[test]
    fn check_method_pairs() -> Result<()> {
        RequestTarget::Asterisk.check_method("OPTIONS")?;
        RequestTarget::parse("/")?.check_method("GET")?;
        RequestTarget::parse_for_method("CONNECT", "h:1")?.check_method("CONNECT")?;

        let e = RequestTarget::Asterisk.check_method("GET").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget);
        let e = RequestTarget::parse("/")?.check_method("CONNECT").unwrap_err();
        assert_eq!(e.reason(), "CONNECT requires the authority-form");
        let e = RequestTarget::parse("1.2.3.4:80")?
            .check_method("GET")
            .unwrap_err();
        assert_eq!(e.reason(), "authority-form is only allowed with CONNECT");
        Ok(())
    }

    #[test]
    fn path_from_segments_encodes() {
        let p = Path::from_segments(["a b", "c/d"]);
        assert_eq!(p.to_string(), "/a%20b/c%2Fd");
        assert_eq!(decoded(&p), ["a b", "c/d"]);
        assert_eq!(p.to_decoded_string(), "/a b/c/d");
        assert_eq!(Path::from_segments(Vec::<String>::new()), Path::root());
    }
}
