//! Conversions to and from the `http` crate types.
//!
//! Bodies become plain `Vec<u8>`: chunks are joined and trailers dropped.
//! The reason phrase does not survive, `http` has no place for it.

use http::{HeaderName, HeaderValue, Method, StatusCode, Uri, Version};

use crate::body::{Body, ChunkedBody};
use crate::error::{Error, ErrorKind, Result};
use crate::header::{list_members, HeaderField};
use crate::line::HttpVersion;
use crate::message::{Request, Response};
use crate::target::RequestTarget;

impl TryFrom<Request> for http::Request<Vec<u8>> {
    type Error = Error;

    fn try_from(r: Request) -> Result<Self> {
        let method = Method::from_bytes(r.method().as_bytes())
            .map_err(|_| Error::new(ErrorKind::MalformedStartLine, "method not accepted by http"))?;
        let uri = Uri::try_from(r.target().to_string())
            .map_err(|_| Error::new(ErrorKind::InvalidRequestTarget, "target not accepted by http"))?;

        let mut out = http::Request::new(Vec::new());
        *out.method_mut() = method;
        *out.uri_mut() = uri;
        *out.version_mut() = to_http_version(r.version())?;
        append_headers(out.headers_mut(), r.headers())?;
        *out.body_mut() = r.into_body().data().into_owned();

        Ok(out)
    }
}

impl TryFrom<Response> for http::Response<Vec<u8>> {
    type Error = Error;

    fn try_from(r: Response) -> Result<Self> {
        let status = StatusCode::from_u16(r.status())
            .map_err(|_| Error::new(ErrorKind::MalformedStartLine, "status not accepted by http"))?;

        let mut out = http::Response::new(Vec::new());
        *out.status_mut() = status;
        *out.version_mut() = to_http_version(r.version())?;
        append_headers(out.headers_mut(), r.headers())?;
        *out.body_mut() = r.into_body().data().into_owned();

        Ok(out)
    }
}

impl TryFrom<http::Request<Vec<u8>>> for Request {
    type Error = Error;

    fn try_from(r: http::Request<Vec<u8>>) -> Result<Self> {
        let (parts, body) = r.into_parts();

        let method = parts.method.as_str();
        let target = RequestTarget::parse_for_method(method, &parts.uri.to_string())?;
        let headers = from_http_headers(&parts.headers)?;
        let body = to_body(&headers, body);

        let req = Request::with_target(method, target)?
            .with_version(from_http_version(parts.version)?)
            .with_body(body);

        Ok(headers
            .into_iter()
            .fold(req, |req, h| req.push_header(h)))
    }
}

impl TryFrom<http::Response<Vec<u8>>> for Response {
    type Error = Error;

    fn try_from(r: http::Response<Vec<u8>>) -> Result<Self> {
        let (parts, body) = r.into_parts();

        let reason = parts.status.canonical_reason().unwrap_or("");
        let headers = from_http_headers(&parts.headers)?;
        let body = to_body(&headers, body);

        let res = Response::new(parts.status.as_u16(), reason)?
            .with_version(from_http_version(parts.version)?)
            .with_body(body);

        Ok(headers
            .into_iter()
            .fold(res, |res, h| res.push_header(h)))
    }
}

fn to_http_version(v: HttpVersion) -> Result<Version> {
    match (v.major, v.minor) {
        (1, 0) => Ok(Version::HTTP_10),
        (1, 1) => Ok(Version::HTTP_11),
        _ => Err(Error::new(
            ErrorKind::MalformedStartLine,
            "version not accepted by http",
        )),
    }
}

fn from_http_version(v: Version) -> Result<HttpVersion> {
    if v == Version::HTTP_10 {
        Ok(HttpVersion::HTTP_10)
    } else if v == Version::HTTP_11 {
        Ok(HttpVersion::HTTP_11)
    } else {
        Err(Error::new(
            ErrorKind::MalformedStartLine,
            "only HTTP/1.0 and HTTP/1.1 are supported",
        ))
    }
}

fn append_headers(map: &mut http::HeaderMap, fields: &[HeaderField]) -> Result<()> {
    for f in fields {
        let name = HeaderName::from_bytes(f.name().as_bytes());
        let value = HeaderValue::from_bytes(f.value_raw());
        let (Ok(name), Ok(value)) = (name, value) else {
            return Err(Error::new(
                ErrorKind::InvalidHeaderField,
                "field not accepted by http",
            ));
        };
        map.append(name, value);
    }
    Ok(())
}

fn from_http_headers(map: &http::HeaderMap) -> Result<Vec<HeaderField>> {
    map.iter()
        .map(|(name, value)| HeaderField::new(name.as_str(), value.as_bytes()))
        .collect()
}

/// Body framed the way the header fields announce it.
fn to_body(headers: &[HeaderField], data: Vec<u8>) -> Body {
    let chunked = headers
        .iter()
        .filter(|h| h.is("transfer-encoding"))
        .flat_map(|h| list_members(h.value_raw()))
        .any(|c| c.eq_ignore_ascii_case(b"chunked"));
    let has_length = headers.iter().any(|h| h.is("content-length"));

    if chunked {
        Body::Chunked(ChunkedBody::new().chunk(data))
    } else if data.is_empty() && !has_length {
        Body::Absent
    } else {
        Body::Fixed(data)
    }
}
