use crate::body::Body;
use crate::error::{Error, ErrorKind, Result};
use crate::header::HeaderField;
use crate::line::HttpVersion;
use crate::scan::{is_field_vchar, is_ows, is_tchar};
use crate::target::RequestTarget;

/// An HTTP request.
///
/// Built by [`Request::new`] and the `with_` methods, or by parsing.
///
/// ```
/// use httpmsg::Request;
///
/// let req = Request::new("GET", "/search?q=rust")?
///     .with_header("Host", "example.com")?;
///
/// assert_eq!(req.to_bytes(), b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n");
/// # Ok::<_, httpmsg::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    target: RequestTarget,
    version: HttpVersion,
    headers: Vec<HeaderField>,
    body: Body,
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    version: HttpVersion,
    status: u16,
    reason: String,
    headers: Vec<HeaderField>,
    body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Request {
    /// Create an HTTP/1.1 request without headers or body.
    ///
    /// The method must be a token, the target is parsed as it would be in a
    /// request-line with this method.
    pub fn new(method: &str, target: &str) -> Result<Self> {
        check_method(method)?;
        let target = RequestTarget::parse_for_method(method, target)?;
        Ok(Self::from_parts(
            method.to_owned(),
            target,
            HttpVersion::HTTP_11,
            Vec::new(),
            Body::Absent,
        ))
    }

    /// Like [`Request::new`], with an already built target.
    pub fn with_target(method: &str, target: RequestTarget) -> Result<Self> {
        check_method(method)?;
        Ok(Self::from_parts(
            method.to_owned(),
            target,
            HttpVersion::HTTP_11,
            Vec::new(),
            Body::Absent,
        ))
    }

    pub(crate) fn from_parts(
        method: String,
        target: RequestTarget,
        version: HttpVersion,
        headers: Vec<HeaderField>,
        body: Body,
    ) -> Self {
        Request {
            method,
            target,
            version,
            headers,
            body,
        }
    }

    /// Append a header field.
    pub fn with_header(mut self, name: &str, value: impl AsRef<[u8]>) -> Result<Self> {
        self.headers.push(HeaderField::new(name, value)?);
        Ok(self)
    }

    /// Append an already validated header field.
    pub fn push_header(mut self, field: HeaderField) -> Self {
        self.headers.push(field);
        self
    }

    pub fn with_version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the body. The framing header is added when the message is written
    /// unless one is already present.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// First header with the name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.iter().find(|h| h.is(name))
    }

    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderField> {
        self.headers.iter().filter(move |h| h.is(name))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}

impl Response {
    /// Create an HTTP/1.1 response without headers or body.
    pub fn new(status: u16, reason: &str) -> Result<Self> {
        if !(100..=599).contains(&status) {
            return Err(Error::new(
                ErrorKind::MalformedStartLine,
                "status code out of range",
            ));
        }
        if !reason.bytes().all(|c| is_field_vchar(c) || is_ows(c)) {
            return Err(Error::new(
                ErrorKind::MalformedStartLine,
                "invalid byte in reason phrase",
            ));
        }
        Ok(Self::from_parts(
            HttpVersion::HTTP_11,
            status,
            reason.to_owned(),
            Vec::new(),
            Body::Absent,
        ))
    }

    pub(crate) fn from_parts(
        version: HttpVersion,
        status: u16,
        reason: String,
        headers: Vec<HeaderField>,
        body: Body,
    ) -> Self {
        Response {
            version,
            status,
            reason,
            headers,
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl AsRef<[u8]>) -> Result<Self> {
        self.headers.push(HeaderField::new(name, value)?);
        Ok(self)
    }

    pub fn push_header(mut self, field: HeaderField) -> Self {
        self.headers.push(field);
        self
    }

    pub fn with_version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The reason phrase, possibly empty.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.iter().find(|h| h.is(name))
    }

    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderField> {
        self.headers.iter().filter(move |h| h.is(name))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}

impl Message {
    pub fn version(&self) -> HttpVersion {
        match self {
            Message::Request(r) => r.version(),
            Message::Response(r) => r.version(),
        }
    }

    pub fn headers(&self) -> &[HeaderField] {
        match self {
            Message::Request(r) => r.headers(),
            Message::Response(r) => r.headers(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers().iter().find(|h| h.is(name))
    }

    pub fn body(&self) -> &Body {
        match self {
            Message::Request(r) => r.body(),
            Message::Response(r) => r.body(),
        }
    }

    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Message::Request(r) => Some(r),
            Message::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Message::Response(r) => Some(r),
            Message::Request(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Message::Request(r)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Message::Response(r)
    }
}

fn check_method(method: &str) -> Result<()> {
    if method.is_empty() || !method.bytes().all(is_tchar) {
        return Err(Error::new(
            ErrorKind::MalformedStartLine,
            "invalid method token",
        ));
    }
    Ok(())
}
