//! Resumable message parsing.

use core::marker::PhantomData;
use core::mem;

use crate::body::{Body, ChunkedBody, Framing};
use crate::chunk::{Dechunker, Retained};
use crate::config::Config;
use crate::error::{limit, Error, ErrorKind, Limit, Result};
use crate::header::{parse_fields, HeaderField};
use crate::line::{parse_request_line, parse_status_line, RequestLine, StatusLine};
use crate::message::{Message, Request, Response};
use crate::scan::find_line;

/// Result of feeding input to a [`Parser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<M> {
    /// A whole message was read from the first `consumed` bytes of the input.
    /// Any bytes after that belong to the next message.
    Complete { message: M, consumed: usize },
    /// The input ends before the message does.
    Partial,
}

impl<M> Status<M> {
    pub fn is_complete(&self) -> bool {
        matches!(self, Status::Complete { .. })
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Request {}
    impl Sealed for super::Response {}
    impl Sealed for super::Message {}
}

/// The kinds of message a [`Parser`] can produce.
///
/// Implemented for [`Request`], [`Response`] and [`Message`], which accepts
/// either and tells them apart by the `HTTP/` prefix of a status-line.
pub trait MessageKind: sealed::Sealed + Sized {
    #[doc(hidden)]
    const REQUEST: bool;
    #[doc(hidden)]
    const RESPONSE: bool;
    #[doc(hidden)]
    fn from_message(m: Message) -> Option<Self>;
}

impl MessageKind for Request {
    const REQUEST: bool = true;
    const RESPONSE: bool = false;
    fn from_message(m: Message) -> Option<Self> {
        match m {
            Message::Request(r) => Some(r),
            Message::Response(_) => None,
        }
    }
}

impl MessageKind for Response {
    const REQUEST: bool = false;
    const RESPONSE: bool = true;
    fn from_message(m: Message) -> Option<Self> {
        match m {
            Message::Response(r) => Some(r),
            Message::Request(_) => None,
        }
    }
}

impl MessageKind for Message {
    const REQUEST: bool = true;
    const RESPONSE: bool = true;
    fn from_message(m: Message) -> Option<Self> {
        Some(m)
    }
}

/// Incremental parser for one message at a time.
///
/// Feed it the input received so far. When it answers [`Status::Partial`],
/// append more bytes and call [`Parser::parse`] again with the whole
/// buffer; what was already read is not scanned again. After
/// [`Status::Complete`] the parser starts over and expects the next message
/// at the start of the buffer it is given, i.e. `&buf[consumed..]`.
///
/// A failure is final, the parser keeps returning the same error.
///
/// ```
/// use httpmsg::{RequestParser, Status};
///
/// let input = b"GET /a%20b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n";
/// let mut parser = RequestParser::default();
///
/// assert_eq!(parser.parse(&input[..20])?, Status::Partial);
///
/// let Status::Complete { message, consumed } = parser.parse(input)? else {
///     panic!("incomplete");
/// };
/// assert_eq!(consumed, input.len());
/// assert_eq!(message.method(), "GET");
/// assert_eq!(message.target().query().unwrap().as_str(), "x=1");
/// # Ok::<_, httpmsg::Error>(())
/// ```
#[derive(Debug)]
pub struct Parser<M> {
    config: Config,
    request_method: Option<String>,
    pos: usize,
    state: State,
    _kind: PhantomData<fn() -> M>,
}

pub type RequestParser = Parser<Request>;
pub type ResponseParser = Parser<Response>;

#[derive(Debug, Default)]
enum State {
    #[default]
    StartLine,
    Fields(Head),
    Body(Head, BodyState),
    Failed(Error),
}

#[derive(Debug)]
struct Head {
    line: Line,
    fields: Vec<HeaderField>,
}

#[derive(Debug)]
enum Line {
    Request(RequestLine),
    Status(StatusLine),
}

#[derive(Debug)]
enum BodyState {
    Absent,
    Fixed {
        data: Vec<u8>,
        left: usize,
    },
    Chunked {
        dechunker: Dechunker,
        body: ChunkedBody,
        retained: Retained,
    },
    UntilClose(Vec<u8>),
}

impl<M: MessageKind> Default for Parser<M> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<M: MessageKind> Parser<M> {
    pub fn new(config: Config) -> Self {
        Parser {
            config,
            request_method: None,
            pos: 0,
            state: State::StartLine,
            _kind: PhantomData,
        }
    }

    /// The method of the request the next response answers.
    ///
    /// Responses to HEAD, and successful responses to CONNECT, have no body
    /// whatever their header fields say. Applies to the next message only.
    pub fn with_request_method(mut self, method: &str) -> Self {
        self.set_request_method(Some(method));
        self
    }

    pub fn set_request_method(&mut self, method: Option<&str>) {
        self.request_method = method.map(str::to_owned);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Continue parsing with `buf`, the input so far.
    pub fn parse(&mut self, buf: &[u8]) -> Result<Status<M>> {
        if let State::Failed(e) = &self.state {
            return Err(e.clone());
        }

        if buf.len() < self.pos {
            return self.fail(Error::new(
                ErrorKind::IncompleteMessage,
                "input is shorter than on the previous call",
            ));
        }

        match self.advance(buf) {
            Ok(Some(message)) => {
                let consumed = self.pos;
                let message = self.complete(message)?;
                Ok(Status::Complete { message, consumed })
            }
            Ok(None) => Ok(Status::Partial),
            Err(e) => self.fail(e),
        }
    }

    /// Signal that the input ended with `buf`.
    ///
    /// A response without `Content-Length` or chunked framing is delimited by
    /// the end of input, this is where it completes. For anything else short
    /// of a full message this fails with [`ErrorKind::IncompleteMessage`].
    pub fn finish(&mut self, buf: &[u8]) -> Result<(M, usize)> {
        if let Status::Complete { message, consumed } = self.parse(buf)? {
            return Ok((message, consumed));
        }

        match mem::take(&mut self.state) {
            State::Body(head, BodyState::UntilClose(data)) => {
                let consumed = self.pos;
                trace!("Close-delimited body ended: {} bytes", data.len());
                let message = self.complete(head.into_message(Body::UntilClose(data)))?;
                Ok((message, consumed))
            }
            _ => self.fail(Error::at(
                ErrorKind::IncompleteMessage,
                "input ended mid-message",
                buf.len(),
            )),
        }
    }

    fn complete(&mut self, message: Message) -> Result<M> {
        self.pos = 0;
        self.state = State::StartLine;
        self.request_method = None;

        M::from_message(message)
            .ok_or_else(|| Error::new(ErrorKind::MalformedStartLine, "unexpected message type"))
    }

    fn fail<T>(&mut self, e: Error) -> Result<T> {
        debug!("Parse failed: {}", e);
        self.state = State::Failed(e.clone());
        Err(e)
    }

    fn advance(&mut self, buf: &[u8]) -> Result<Option<Message>> {
        loop {
            match mem::take(&mut self.state) {
                State::StartLine => {
                    let Some(line) = self.read_start_line(buf)? else {
                        return Ok(None);
                    };
                    self.state = State::Fields(Head {
                        line,
                        fields: Vec::new(),
                    });
                }

                State::Fields(mut head) => {
                    if !self.read_fields(buf, &mut head.fields)? {
                        self.state = State::Fields(head);
                        return Ok(None);
                    }
                    let body = self.body_state(&head)?;
                    self.state = State::Body(head, body);
                }

                State::Body(head, mut body) => {
                    if !self.read_body(buf, &mut body)? {
                        self.state = State::Body(head, body);
                        return Ok(None);
                    }
                    return Ok(Some(head.into_message(body.into_body())));
                }

                State::Failed(e) => {
                    self.state = State::Failed(e.clone());
                    return Err(e);
                }
            }
        }
    }

    fn read_start_line(&mut self, buf: &[u8]) -> Result<Option<Line>> {
        let limits = &self.config.limits;

        let Some(cr) = find_line(buf, self.pos, limits.max_line_len, ErrorKind::MalformedStartLine)?
        else {
            check_head_size(buf.len(), limits.max_head_bytes)?;
            return Ok(None);
        };

        let line = &buf[self.pos..cr];
        let is_status = line.starts_with(b"HTTP/");

        let parsed = if M::RESPONSE && (is_status || !M::REQUEST) {
            let s = parse_status_line(line, self.pos)?;
            trace!("Status-line: {} {} {:?}", s.version, s.status, s.reason);
            Line::Status(s)
        } else {
            let r = parse_request_line(line, self.config.allow_userinfo, self.pos)?;
            trace!("Request-line: {} {} {}", r.method, r.target, r.version);
            if self.config.check_target_form {
                let target_at = self.pos + r.method.len() + 1;
                r.target
                    .check_method(&r.method)
                    .map_err(|e| e.offset_by(target_at))?;
            }
            Line::Request(r)
        };

        self.pos = cr + 2;

        Ok(Some(parsed))
    }

    fn read_fields(&mut self, buf: &[u8], fields: &mut Vec<HeaderField>) -> Result<bool> {
        let limits = &self.config.limits;

        let done = parse_fields(
            buf,
            &mut self.pos,
            fields,
            limits.max_line_len,
            limits.max_headers,
        )?;

        check_head_size(if done { self.pos } else { buf.len() }, limits.max_head_bytes)?;

        if done {
            trace!("Header section: {} fields", fields.len());
        }

        Ok(done)
    }

    fn body_state(&self, head: &Head) -> Result<BodyState> {
        let max_body = self.config.limits.max_body_bytes;

        let framing = match &head.line {
            Line::Request(r) => Framing::for_request(r.version, &head.fields, max_body, self.pos)?,
            Line::Status(s) => Framing::for_response(
                s.version,
                s.status,
                self.request_method.as_deref(),
                &head.fields,
                max_body,
                self.pos,
            )?,
        };

        Ok(match framing {
            Framing::Absent => BodyState::Absent,
            Framing::Fixed(n) => {
                // Bounded by max_body_bytes, which is a usize.
                let left = n as usize;
                BodyState::Fixed {
                    data: Vec::with_capacity(left.min(64 * 1024)),
                    left,
                }
            }
            Framing::Chunked => BodyState::Chunked {
                dechunker: Dechunker::new(),
                body: ChunkedBody::new(),
                retained: Retained::default(),
            },
            Framing::UntilClose => BodyState::UntilClose(Vec::new()),
        })
    }

    fn read_body(&mut self, buf: &[u8], body: &mut BodyState) -> Result<bool> {
        match body {
            BodyState::Absent => Ok(true),

            BodyState::Fixed { data, left } => {
                let n = (buf.len() - self.pos).min(*left);
                data.extend_from_slice(&buf[self.pos..self.pos + n]);
                self.pos += n;
                *left -= n;
                Ok(*left == 0)
            }

            BodyState::Chunked {
                dechunker,
                body,
                retained,
            } => dechunker.parse_input(buf, &mut self.pos, body, retained, &self.config.limits),

            BodyState::UntilClose(data) => {
                let rest = &buf[self.pos..];
                let max = self.config.limits.max_body_bytes;
                if data.len() + rest.len() > max {
                    return Err(limit(Limit::BodySize, self.pos + (max - data.len())));
                }
                data.extend_from_slice(rest);
                self.pos = buf.len();
                Ok(false)
            }
        }
    }
}

fn check_head_size(end: usize, max: usize) -> Result<()> {
    if end > max {
        return Err(limit(Limit::HeadSize, max));
    }
    Ok(())
}

impl Head {
    fn into_message(self, body: Body) -> Message {
        match self.line {
            Line::Request(r) => {
                Request::from_parts(r.method, r.target, r.version, self.fields, body).into()
            }
            Line::Status(s) => {
                Response::from_parts(s.version, s.status, s.reason, self.fields, body).into()
            }
        }
    }
}

impl BodyState {
    fn into_body(self) -> Body {
        match self {
            BodyState::Absent => Body::Absent,
            BodyState::Fixed { data, .. } => Body::Fixed(data),
            BodyState::Chunked { body, .. } => Body::Chunked(body),
            BodyState::UntilClose(data) => Body::UntilClose(data),
        }
    }
}

/// Parse one request from the start of `buf`.
pub fn parse_request(buf: &[u8], config: &Config) -> Result<Status<Request>> {
    Parser::new(*config).parse(buf)
}

/// Parse one response from the start of `buf`.
///
/// A response delimited by connection close is never complete here, use a
/// [`Parser`] and [`Parser::finish`] for those.
pub fn parse_response(buf: &[u8], config: &Config) -> Result<Status<Response>> {
    Parser::new(*config).parse(buf)
}

/// Parse a request or a response from the start of `buf`.
pub fn parse_message(buf: &[u8], config: &Config) -> Result<Status<Message>> {
    Parser::new(*config).parse(buf)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::authority::Host;
    use crate::body::Body;
    use crate::config::Limits;
    use crate::line::HttpVersion;
    use crate::target::RequestTarget;

    fn complete<M: MessageKind + core::fmt::Debug>(s: Result<Status<M>>) -> (M, usize) {
        match s {
            Ok(Status::Complete { message, consumed }) => (message, consumed),
            other => panic!("not complete: {:?}", other),
        }
    }

    fn req(input: &[u8]) -> Result<Status<Request>> {
        parse_request(input, &Config::default())
    }

    fn res(input: &[u8]) -> Result<Status<Response>> {
        parse_response(input, &Config::default())
    }

    #[test]
    fn origin_form_request() {
        let (r, n) = complete(req(b"GET /a%20b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n"));
        assert_eq!(n, 36);
        assert_eq!(r.method(), "GET");
        assert_eq!(r.version(), HttpVersion::HTTP_11);
        let RequestTarget::Origin { path, query } = r.target() else {
            panic!("not origin-form");
        };
        let segments: Vec<_> = path.decoded_segments().collect();
        assert_eq!(segments, ["a b"]);
        assert_eq!(query.as_ref().map(|q| q.as_str()), Some("x=1"));
        assert_eq!(r.body(), &Body::Absent);
    }

    #[test]
    fn fixed_body_response() {
        let (r, n) = complete(res(b"HTTP/1.1 404 Not Found\r\nContent-Length: 5\r\n\r\nhello"));
        assert_eq!(n, 50);
        assert_eq!(r.version(), HttpVersion::HTTP_11);
        assert_eq!(r.status(), 404);
        assert_eq!(r.reason(), "Not Found");
        assert_eq!(r.body(), &Body::Fixed(b"hello".to_vec()));
    }

    #[test]
    fn fixed_body_exact_length() {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET";
        let (r, n) = complete(req(input));
        assert_eq!(&*r.body().data(), b"abc");
        assert_eq!(&input[n..], b"GET");

        // One byte short.
        assert_eq!(req(&input[..n - 1]), Ok(Status::Partial));
    }

    #[test]
    fn chunked_body() {
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nfoo\r\n0\r\n\r\n";
        let (r, n) = complete(req(input));
        assert_eq!(n, input.len());
        assert_eq!(&*r.body().data(), b"foo");
        assert!(r.body().trailers().is_empty());
    }

    #[test]
    fn chunked_body_with_trailers() {
        let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                      3;x=y\r\nfoo\r\n0\r\nChecksum: abc\r\n\r\n";
        let (r, _) = complete(res(input));
        let Body::Chunked(c) = r.body() else {
            panic!("not chunked");
        };
        assert_eq!(c.chunks()[0].extensions(), ";x=y");
        assert_eq!(c.trailers()[0].try_value(), Some("abc"));
    }

    #[test]
    fn te_with_cl_is_ambiguous() {
        let e = req(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\n")
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AmbiguousFraming);
    }

    #[test]
    fn space_before_colon() {
        let e = req(b"GET / HTTP/1.1\r\nFoo : bar\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidHeaderField);
        assert_eq!(e.offset(), Some(19));
    }

    #[test]
    fn connect_authority_form() {
        let (r, _) = complete(req(b"CONNECT example.com:443 HTTP/1.1\r\n\r\n"));
        let RequestTarget::Authority(a) = r.target() else {
            panic!("not authority-form");
        };
        assert_eq!(a.host(), &Host::reg_name("example.com"));
        assert_eq!(a.port(), Some(443));
    }

    #[test]
    fn ipv6_literal() {
        let (r, _) = complete(req(b"GET http://[::1]/ HTTP/1.1\r\n\r\n"));
        assert!(matches!(r.target().authority().unwrap().host(), Host::Ipv6(_)));

        let e = req(b"GET http://[::1/ HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget);
    }

    #[test]
    fn need_more_input() {
        assert_eq!(req(b""), Ok(Status::Partial));
        assert_eq!(req(b"GET / HTTP/1.1\r\n"), Ok(Status::Partial));
        assert_eq!(res(b""), Ok(Status::Partial));
        assert_eq!(res(b"HTTP/1.1 200 OK\r\n"), Ok(Status::Partial));
    }

    #[test]
    fn bare_lf_rejected() {
        let e = req(b"GET / HTTP/1.1\nHost: h\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedStartLine);
        let e = req(b"GET / HTTP/1.1\r\nHost: h\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidHeaderField);
    }

    #[test]
    fn obs_fold_after_start_line() {
        let e = req(b"GET / HTTP/1.1\r\n Host: h\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidHeaderField);
    }

    #[test]
    fn target_form_checked() {
        let e = req(b"GET * HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidRequestTarget);
        assert_eq!(e.offset(), Some(4));

        let config = Config::new().check_target_form(false);
        let s = parse_request(b"GET * HTTP/1.1\r\n\r\n", &config);
        assert!(s.unwrap().is_complete());
    }

    #[test]
    fn userinfo_policy() {
        let input = b"GET http://u@h/ HTTP/1.1\r\n\r\n";
        let e = req(input).unwrap_err();
        assert_eq!(e.reason(), "userinfo is not allowed");

        let config = Config::new().allow_userinfo(true);
        let (r, _) = complete(parse_request(input, &config));
        assert_eq!(r.target().authority().unwrap().userinfo(), Some("u"));
    }

    #[test]
    fn incremental_byte_by_byte() -> Result<()> {
        let input = b"POST /up HTTP/1.1\r\nHost: h\r\nTransfer-Encoding: chunked\r\n\r\n\
                      4\r\nWiki\r\n5;a=b\r\npedia\r\n0\r\nX-T: 1\r\n\r\n";
        let (whole, _) = complete(req(input));

        let mut p = RequestParser::default();
        for end in 0..input.len() {
            assert_eq!(p.parse(&input[..end])?, Status::Partial, "at {}", end);
        }
        let (stepped, n) = complete(p.parse(input));
        assert_eq!(n, input.len());
        assert_eq!(stepped, whole);
        Ok(())
    }

    #[test]
    fn pipelined_requests() -> Result<()> {
        let input = b"GET /1 HTTP/1.1\r\n\r\nGET /2 HTTP/1.1\r\n\r\n";
        let mut p = RequestParser::default();

        let (first, n) = complete(p.parse(input));
        assert_eq!(first.target().to_string(), "/1");

        let (second, m) = complete(p.parse(&input[n..]));
        assert_eq!(second.target().to_string(), "/2");
        assert_eq!(n + m, input.len());
        Ok(())
    }

    #[test]
    fn failure_is_final() {
        let mut p = RequestParser::default();
        let e = p.parse(b"GET / HTTP/1.1\r\nFoo : bar\r\n\r\n").unwrap_err();
        assert_eq!(p.parse(b"GET / HTTP/1.1\r\n\r\n"), Err(e));
    }

    #[test]
    fn close_delimited_response() -> Result<()> {
        let input = b"HTTP/1.0 200 OK\r\n\r\nstreamed";
        let mut p = ResponseParser::default();
        assert_eq!(p.parse(&input[..22])?, Status::Partial);
        assert_eq!(p.parse(input)?, Status::Partial);

        let (r, n) = p.finish(input)?;
        assert_eq!(n, input.len());
        assert_eq!(r.body(), &Body::UntilClose(b"streamed".to_vec()));
        Ok(())
    }

    #[test]
    fn finish_mid_message() {
        let mut p = ResponseParser::default();
        let e = p
            .finish(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\nshort")
            .unwrap_err();
        assert_eq!(e.kind(), ErrorKind::IncompleteMessage);
    }

    #[test]
    fn response_to_head() -> Result<()> {
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n";
        let mut p = ResponseParser::default().with_request_method("HEAD");
        let (r, n) = complete(p.parse(input));
        assert_eq!(n, input.len());
        assert_eq!(r.body(), &Body::Absent);

        // Only for that one response.
        assert_eq!(p.parse(input)?, Status::Partial);
        Ok(())
    }

    #[test]
    fn no_body_statuses() {
        let (r, _) = complete(res(b"HTTP/1.1 204 No Content\r\n\r\n"));
        assert_eq!(r.body(), &Body::Absent);
        let (r, _) = complete(res(b"HTTP/1.1 100 Continue\r\n\r\n"));
        assert_eq!(r.body(), &Body::Absent);
    }

    #[test]
    fn message_detects_kind() {
        let config = Config::default();
        let (m, _) = complete(parse_message(b"HTTP/1.1 204 \r\n\r\n", &config));
        assert_eq!(m.as_response().map(|r| r.status()), Some(204));
        let (m, _) = complete(parse_message(b"OPTIONS * HTTP/1.1\r\n\r\n", &config));
        assert!(m.as_request().unwrap().target().is_asterisk());
    }

    #[test]
    fn request_parser_rejects_status_line() {
        let e = req(b"HTTP/1.1 200 OK\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MalformedStartLine);
    }

    #[test]
    fn limits() {
        let limits = Limits::new()
            .max_line_len(20)
            .max_head_bytes(40)
            .max_headers(2)
            .max_body_bytes(4);
        let config = Config::new().limits(limits);
        let kind = |input: &[u8]| parse_request(input, &config).unwrap_err().kind();

        assert_eq!(
            kind(b"GET /aaaaaaaaaaaaaaaaaaaaaa HTTP/1.1\r\n\r\n"),
            ErrorKind::LimitExceeded(Limit::LineLength)
        );
        assert_eq!(
            kind(b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n"),
            ErrorKind::LimitExceeded(Limit::HeaderCount)
        );
        assert_eq!(
            kind(b"GET / HTTP/1.1\r\nAaaa: 1\r\nBbbbbbbbb: 2\r\n\r\n"),
            ErrorKind::LimitExceeded(Limit::HeadSize)
        );
        assert_eq!(
            kind(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello"),
            ErrorKind::LimitExceeded(Limit::BodySize)
        );
    }

    #[test]
    fn chunk_extensions_are_bounded() {
        let limits = Limits::new().max_body_bytes(8).max_head_bytes(64);
        let config = Config::new().limits(limits);

        let mut input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
        let ext = "v".repeat(8000);
        for _ in 0..8 {
            input.extend_from_slice(format!("1;a={}\r\nx\r\n", ext).as_bytes());
        }
        input.extend_from_slice(b"0\r\n\r\n");

        let e = parse_request(&input, &config).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::LimitExceeded(Limit::ChunkExtensions));

        let mut p = RequestParser::new(config);
        let stepped = (0..=input.len()).find_map(|end| p.parse(&input[..end]).err());
        assert_eq!(stepped, Some(e));
    }

    #[test]
    fn trailer_limit_fed_byte_by_byte() {
        let config = Config::new().limits(Limits::new().max_head_bytes(60));
        let mut input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n1\r\nx\r\n0\r\n".to_vec();
        for name in ["A", "B", "C", "D", "E"] {
            input.extend_from_slice(format!("{}: 0123456789\r\n", name).as_bytes());
        }
        input.extend_from_slice(b"\r\n");

        let whole = parse_request(&input, &config).unwrap_err();
        assert_eq!(whole.kind(), ErrorKind::LimitExceeded(Limit::HeadSize));

        let mut p = RequestParser::new(config);
        let stepped = (0..=input.len()).find_map(|end| p.parse(&input[..end]).err());
        assert_eq!(stepped, Some(whole));
    }

    #[test]
    fn round_trips() {
        let requests: [&[u8]; 6] = [
            b"GET /a%20b/?x=1&y HTTP/1.1\r\nHost: h\r\nX: a\r\nx: b\r\n\r\n",
            b"OPTIONS * HTTP/1.1\r\nHost: h\r\n\r\n",
            b"CONNECT [::1]:443 HTTP/1.1\r\nHost: [::1]:443\r\n\r\n",
            b"GET http://user@example.com:8080/p?q HTTP/1.0\r\n\r\n",
            b"PUT /f HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc",
            b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\n\r\n\
              2;e=\"v\"\r\nab\r\n0\r\nT: 1\r\n\r\n",
        ];
        let config = Config::new().allow_userinfo(true);
        for input in requests {
            let (r, _) = complete(parse_request(input, &config));
            let bytes = r.to_bytes();
            assert_eq!(bytes, input, "{}", String::from_utf8_lossy(input));
            let (again, _) = complete(parse_request(&bytes, &config));
            assert_eq!(again, r);
        }

        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi";
        let (r, _) = complete(res(input));
        assert_eq!(r.to_bytes(), input);
    }

    #[test]
    fn agrees_with_httparse() {
        let inputs: [&[u8]; 3] = [
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n",
            b"POST /api/v1/items?id=7 HTTP/1.0\r\nContent-Length: 0\r\nX-Empty:\r\n\r\n",
            b"DELETE /a/b%2Fc HTTP/1.1\r\nUser-Agent: t/1.0 (x)\r\nConnection:   close\r\n\r\n",
        ];

        for input in inputs {
            let mut headers = [httparse::EMPTY_HEADER; 16];
            let mut theirs = httparse::Request::new(&mut headers);
            let their_len = match theirs.parse(input).unwrap() {
                httparse::Status::Complete(n) => n,
                httparse::Status::Partial => panic!("httparse partial"),
            };

            let (ours, our_len) = complete(req(input));
            assert_eq!(our_len, their_len);
            assert_eq!(Some(ours.method()), theirs.method);
            assert_eq!(Some(ours.target().to_string().as_str()), theirs.path);
            assert_eq!(Some(ours.version().minor), theirs.version);
            assert_eq!(ours.headers().len(), theirs.headers.len());
            for (a, b) in ours.headers().iter().zip(theirs.headers.iter()) {
                assert_eq!(a.name(), b.name);
                assert_eq!(a.value_raw(), b.value);
            }
        }
    }
}
