use std::borrow::Cow;

use crate::chunk::validate_chunk_ext;
use crate::error::{framing, limit, Error, ErrorKind, Limit, Result};
use crate::header::{list_members, HeaderField};
use crate::line::HttpVersion;
use crate::scan::{is_ows, is_tchar};

/// Message body, tagged by how it was framed on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    /// No body at all.
    #[default]
    Absent,
    /// Delimited by `Content-Length`.
    Fixed(Vec<u8>),
    /// `Transfer-Encoding: chunked`.
    Chunked(ChunkedBody),
    /// A response body that runs until the connection closes.
    UntilClose(Vec<u8>),
}

/// The chunks of a chunked body and its trailer fields.
///
/// The terminating zero-size chunk is implicit. When parsed, consecutive
/// chunks without extensions come out as a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedBody {
    chunks: Vec<Chunk>,
    trailers: Vec<HeaderField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    extensions: String,
    data: Vec<u8>,
}

impl Body {
    /// The body bytes, with chunks joined together.
    pub fn data(&self) -> Cow<'_, [u8]> {
        match self {
            Body::Absent => Cow::Borrowed(&[]),
            Body::Fixed(v) | Body::UntilClose(v) => Cow::Borrowed(v),
            Body::Chunked(c) => match c.chunks.as_slice() {
                [one] => Cow::Borrowed(&one.data),
                chunks => Cow::Owned(chunks.iter().flat_map(|c| &c.data).copied().collect()),
            },
        }
    }

    /// Trailer fields. Empty unless chunked.
    pub fn trailers(&self) -> &[HeaderField] {
        match self {
            Body::Chunked(c) => &c.trailers,
            _ => &[],
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Body::Absent)
    }
}

impl ChunkedBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty data is skipped, since a zero-size chunk would
    /// end the body.
    pub fn chunk(mut self, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        if !data.is_empty() {
            self.chunks.push(Chunk {
                extensions: String::new(),
                data,
            });
        }
        self
    }

    /// Append a chunk with extensions, e.g. `;name=value`.
    pub fn chunk_with_ext(mut self, data: impl Into<Vec<u8>>, ext: &str) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidFraming,
                "chunk with extensions must not be empty",
            ));
        }
        validate_chunk_ext(ext.as_bytes(), 0).map_err(|e| Error::new(e.kind(), e.reason()))?;
        self.chunks.push(Chunk {
            extensions: ext.to_owned(),
            data,
        });
        Ok(self)
    }

    pub fn trailer(mut self, name: &str, value: impl AsRef<[u8]>) -> Result<Self> {
        self.trailers.push(HeaderField::new(name, value)?);
        Ok(self)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn trailers(&self) -> &[HeaderField] {
        &self.trailers
    }

    /// Make room for a received chunk.
    ///
    /// A chunk without extensions following one without extensions is joined
    /// to it, chunk boundaries carry nothing else.
    pub(crate) fn start_chunk(&mut self, extensions: String, size: usize) {
        if extensions.is_empty() {
            if let Some(last) = self.chunks.last_mut().filter(|c| c.extensions.is_empty()) {
                last.data.reserve(size.min(64 * 1024));
                return;
            }
        }

        self.chunks.push(Chunk {
            extensions,
            data: Vec::with_capacity(size.min(64 * 1024)),
        });
    }

    /// The chunk being received.
    pub(crate) fn current_mut(&mut self) -> Option<&mut Vec<u8>> {
        self.chunks.last_mut().map(|c| &mut c.data)
    }

    pub(crate) fn trailers_mut(&mut self) -> &mut Vec<HeaderField> {
        &mut self.trailers
    }
}

impl Chunk {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The raw extension text following the chunk size, empty if none.
    pub fn extensions(&self) -> &str {
        &self.extensions
    }
}

/// How the body of a message is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    Absent,
    Fixed(u64),
    Chunked,
    UntilClose,
}

/// What the framing header fields say, before message type rules apply.
enum Declared {
    Nothing,
    Length(u64),
    Chunked,
    OtherCoding,
}

impl Framing {
    /// `offset` is reported for framing errors, the header fields themselves
    /// carry no position.
    pub fn for_request(
        version: HttpVersion,
        fields: &[HeaderField],
        max_body: usize,
        offset: usize,
    ) -> Result<Self> {
        let framing = match declared(version, fields, max_body, offset)? {
            Declared::Nothing => Framing::Absent,
            Declared::Length(n) => Framing::Fixed(n),
            Declared::Chunked => Framing::Chunked,
            Declared::OtherCoding => {
                return Err(framing(
                    "request transfer-coding must end with chunked",
                    offset,
                ))
            }
        };
        trace!("Request framing: {:?}", framing);
        Ok(framing)
    }

    /// `request_method` is the method of the request this responds to, when
    /// known.
    pub fn for_response(
        version: HttpVersion,
        status: u16,
        request_method: Option<&str>,
        fields: &[HeaderField],
        max_body: usize,
        offset: usize,
    ) -> Result<Self> {
        // Validated even when the status rules out a body.
        let declared = declared(version, fields, max_body, offset)?;

        let is_head = request_method == Some("HEAD");
        let is_connect_ok = request_method == Some("CONNECT") && (200..300).contains(&status);
        let no_body_status = (100..200).contains(&status) || status == 204 || status == 304;

        let framing = if is_head || is_connect_ok || no_body_status {
            Framing::Absent
        } else {
            match declared {
                Declared::Length(n) => Framing::Fixed(n),
                Declared::Chunked => Framing::Chunked,
                Declared::Nothing | Declared::OtherCoding => Framing::UntilClose,
            }
        };
        trace!("Response framing: {:?}", framing);
        Ok(framing)
    }
}

fn declared(
    version: HttpVersion,
    fields: &[HeaderField],
    max_body: usize,
    offset: usize,
) -> Result<Declared> {
    let te: Vec<&HeaderField> = fields.iter().filter(|f| f.is("transfer-encoding")).collect();
    let cl: Vec<&HeaderField> = fields.iter().filter(|f| f.is("content-length")).collect();

    // Checked before either value is looked at.
    if !te.is_empty() && !cl.is_empty() {
        return Err(Error::at(
            ErrorKind::AmbiguousFraming,
            "both Transfer-Encoding and Content-Length",
            offset,
        ));
    }

    let mut length: Option<u64> = None;
    for f in cl {
        let n = parse_content_length(f.value_raw())
            .ok_or_else(|| framing("invalid Content-Length value", offset))?;
        match length {
            Some(prev) if prev != n => {
                return Err(Error::at(
                    ErrorKind::AmbiguousFraming,
                    "conflicting Content-Length values",
                    offset,
                ));
            }
            _ => length = Some(n),
        }
    }

    if !te.is_empty() {
        if !version.is_at_least_11() {
            return Err(framing("Transfer-Encoding in HTTP/1.0 message", offset));
        }

        let mut codings: Vec<&[u8]> = Vec::new();
        for f in te {
            for member in list_members(f.value_raw()) {
                codings.push(coding_name(member, offset)?);
            }
        }

        let Some((last, rest)) = codings.split_last() else {
            return Err(framing("empty Transfer-Encoding", offset));
        };

        if rest.iter().any(|c| is_chunked(c)) {
            return Err(framing("chunked is not the final transfer-coding", offset));
        }

        return Ok(if is_chunked(last) {
            Declared::Chunked
        } else {
            Declared::OtherCoding
        });
    }

    if let Some(n) = length {
        if n > max_body as u64 {
            return Err(limit(Limit::BodySize, offset));
        }
        return Ok(Declared::Length(n));
    }

    Ok(Declared::Nothing)
}

/// `transfer-coding = token *( OWS ";" OWS transfer-parameter )`, only the
/// token is of interest.
fn coding_name(member: &[u8], offset: usize) -> Result<&[u8]> {
    let end = member.iter().position(|c| *c == b';').unwrap_or(member.len());
    let name = &member[..end];
    let name = &name[..name.iter().rposition(|c| !is_ows(*c)).map_or(0, |i| i + 1)];
    if name.is_empty() || !name.iter().all(|c| is_tchar(*c)) {
        return Err(framing("invalid transfer-coding", offset));
    }
    Ok(name)
}

fn is_chunked(coding: &[u8]) -> bool {
    coding.eq_ignore_ascii_case(b"chunked")
}

/// `Content-Length = 1*DIGIT`
fn parse_content_length(v: &[u8]) -> Option<u64> {
    if v.is_empty() || !v.iter().all(u8::is_ascii_digit) {
        return None;
    }
    v.iter()
        .try_fold(0_u64, |acc, c| acc.checked_mul(10)?.checked_add((c - b'0') as u64))
}

#[cfg(test)]
mod test {
    use super::*;

    const MAX: usize = 1024;

    fn fields(pairs: &[(&str, &str)]) -> Vec<HeaderField> {
        pairs
            .iter()
            .map(|(n, v)| HeaderField::new(n, v).unwrap())
            .collect()
    }

    fn req(pairs: &[(&str, &str)]) -> Result<Framing> {
        Framing::for_request(HttpVersion::HTTP_11, &fields(pairs), MAX, 0)
    }

    fn res(status: u16, method: Option<&str>, pairs: &[(&str, &str)]) -> Result<Framing> {
        Framing::for_response(HttpVersion::HTTP_11, status, method, &fields(pairs), MAX, 0)
    }

    #[test]
    fn request_framing() -> Result<()> {
        assert_eq!(req(&[])?, Framing::Absent);
        assert_eq!(req(&[("Content-Length", "5")])?, Framing::Fixed(5));
        assert_eq!(
            req(&[("content-length", "5"), ("Content-Length", "5")])?,
            Framing::Fixed(5)
        );
        assert_eq!(req(&[("Transfer-Encoding", "chunked")])?, Framing::Chunked);
        assert_eq!(
            req(&[("Transfer-Encoding", "gzip, Chunked")])?,
            Framing::Chunked
        );
        assert_eq!(
            req(&[("Transfer-Encoding", "gzip"), ("Transfer-Encoding", "chunked")])?,
            Framing::Chunked
        );
        Ok(())
    }

    #[test]
    fn te_and_cl_is_ambiguous() {
        for te in ["chunked", "gzip", "gzip, chunked"] {
            let e = req(&[("Transfer-Encoding", te), ("Content-Length", "3")]).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::AmbiguousFraming);
            let e = res(200, None, &[("Content-Length", "3"), ("Transfer-Encoding", te)])
                .unwrap_err();
            assert_eq!(e.kind(), ErrorKind::AmbiguousFraming);
        }
        // Even when the length is garbage.
        let e = req(&[("Transfer-Encoding", "chunked"), ("Content-Length", "x")]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AmbiguousFraming);
    }

    #[test]
    fn conflicting_lengths() {
        let e = req(&[("Content-Length", "5"), ("Content-Length", "6")]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::AmbiguousFraming);
    }

    #[test]
    fn invalid_framing() {
        let cases: [&[(&str, &str)]; 7] = [
            &[("Content-Length", "-1")],
            &[("Content-Length", "5, 5")],
            &[("Content-Length", "")],
            &[("Content-Length", "99999999999999999999999")],
            &[("Transfer-Encoding", "chunked, gzip")],
            &[("Transfer-Encoding", "gzip")],
            &[("Transfer-Encoding", " , ")],
        ];
        for pairs in cases {
            let e = req(pairs).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidFraming, "{:?}", pairs);
        }
    }

    #[test]
    fn te_in_http10() {
        let f = fields(&[("Transfer-Encoding", "chunked")]);
        let e = Framing::for_request(HttpVersion::HTTP_10, &f, MAX, 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidFraming);
    }

    #[test]
    fn body_size_limit() {
        let e = req(&[("Content-Length", "1025")]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::LimitExceeded(Limit::BodySize));
    }

    #[test]
    fn response_framing() -> Result<()> {
        assert_eq!(res(200, None, &[])?, Framing::UntilClose);
        assert_eq!(res(200, None, &[("Transfer-Encoding", "gzip")])?, Framing::UntilClose);
        assert_eq!(res(200, None, &[("Content-Length", "2")])?, Framing::Fixed(2));
        assert_eq!(res(200, Some("HEAD"), &[("Content-Length", "2")])?, Framing::Absent);
        assert_eq!(res(101, None, &[])?, Framing::Absent);
        assert_eq!(res(204, None, &[])?, Framing::Absent);
        assert_eq!(res(304, None, &[("Content-Length", "9")])?, Framing::Absent);
        assert_eq!(res(200, Some("CONNECT"), &[])?, Framing::Absent);
        assert_eq!(res(407, Some("CONNECT"), &[])?, Framing::UntilClose);
        Ok(())
    }

    #[test]
    fn body_data() -> Result<()> {
        assert_eq!(&*Body::Absent.data(), b"");
        assert_eq!(&*Body::Fixed(b"hi".to_vec()).data(), b"hi");

        let c = ChunkedBody::new()
            .chunk("foo")
            .chunk("")
            .chunk_with_ext("bar", ";a=\"b c\"")?
            .trailer("Expires", "never")?;
        assert_eq!(c.chunks().len(), 2);
        assert_eq!(c.chunks()[1].extensions(), ";a=\"b c\"");

        let b = Body::Chunked(c);
        assert_eq!(&*b.data(), b"foobar");
        assert_eq!(b.trailers()[0].name(), "Expires");
        Ok(())
    }

    #[test]
    fn chunk_with_bad_ext() {
        assert!(ChunkedBody::new().chunk_with_ext("x", "a=b").is_err());
        assert!(ChunkedBody::new().chunk_with_ext("", ";a").is_err());
    }
}
