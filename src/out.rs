//! Rendering messages to wire bytes.

use std::io::{self, Write};

use crate::body::Body;
use crate::chunk::{write_chunk, write_last_chunk};
use crate::error::{Error, ErrorKind, Result};
use crate::header::HeaderField;
use crate::message::{Message, Request, Response};

/// Writer over a fixed output buffer.
pub(crate) struct Out<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Out<'a> {
    pub fn wrap(buf: &'a mut [u8]) -> Self {
        Out { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<'a> Write for Out<'a> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "output overflow"));
        }

        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;

        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Request {
    /// Write the request in wire format.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        write!(w, "{} {} {}\r\n", self.method(), self.target(), self.version())?;
        write_fields_and_body(w, self.headers(), self.body())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(|w| self.write_to(w))
    }

    /// Write the request into `buf`, returning the number of bytes used.
    ///
    /// Fails with [`ErrorKind::OutputOverflow`] if `buf` is too small, in
    /// which case the content of `buf` is unspecified.
    pub fn write_into(&self, buf: &mut [u8]) -> Result<usize> {
        write_into(buf, |w| self.write_to(w))
    }
}

impl Response {
    /// Write the response in wire format.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        write!(w, "{} {:03} {}\r\n", self.version(), self.status(), self.reason())?;
        write_fields_and_body(w, self.headers(), self.body())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(|w| self.write_to(w))
    }

    /// See [`Request::write_into`].
    pub fn write_into(&self, buf: &mut [u8]) -> Result<usize> {
        write_into(buf, |w| self.write_to(w))
    }
}

impl Message {
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        match self {
            Message::Request(r) => r.write_to(w),
            Message::Response(r) => r.write_to(w),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        to_bytes(|w| self.write_to(w))
    }

    pub fn write_into(&self, buf: &mut [u8]) -> Result<usize> {
        write_into(buf, |w| self.write_to(w))
    }
}

pub(crate) fn write_field(w: &mut impl Write, field: &HeaderField) -> io::Result<()> {
    w.write_all(field.name().as_bytes())?;
    w.write_all(b": ")?;
    w.write_all(field.value_raw())?;
    w.write_all(b"\r\n")
}

fn write_fields_and_body(w: &mut impl Write, fields: &[HeaderField], body: &Body) -> io::Result<()> {
    for f in fields {
        write_field(w, f)?;
    }

    let has = |name: &str| fields.iter().any(|f| f.is(name));

    match body {
        Body::Fixed(data) if !has("content-length") => {
            write!(w, "Content-Length: {}\r\n", data.len())?;
        }
        Body::Chunked(_) if !has("transfer-encoding") => {
            w.write_all(b"Transfer-Encoding: chunked\r\n")?;
        }
        _ => {}
    }

    w.write_all(b"\r\n")?;

    match body {
        Body::Absent => {}
        Body::Fixed(data) | Body::UntilClose(data) => w.write_all(data)?,
        Body::Chunked(chunked) => {
            for chunk in chunked.chunks() {
                write_chunk(w, chunk)?;
            }
            write_last_chunk(w, chunked.trailers())?;
        }
    }

    Ok(())
}

fn to_bytes(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> Vec<u8> {
    let mut v = Vec::new();
    if let Err(e) = f(&mut v) {
        unreachable!("io::Write for Vec<u8> failed: {}", e);
    }
    v
}

fn write_into(buf: &mut [u8], f: impl FnOnce(&mut Out<'_>) -> io::Result<()>) -> Result<usize> {
    let mut out = Out::wrap(buf);
    f(&mut out).map_err(|_| Error::new(ErrorKind::OutputOverflow, "buffer too small"))?;
    Ok(out.pos())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::body::ChunkedBody;

    #[test]
    fn write_request_fixed_body() -> Result<()> {
        let req = Request::new("POST", "/p")?
            .with_header("Host", "h")?
            .with_body(Body::Fixed(b"hello".to_vec()));
        assert_eq!(
            req.to_bytes(),
            b"POST /p HTTP/1.1\r\nHost: h\r\nContent-Length: 5\r\n\r\nhello"
        );
        Ok(())
    }

    #[test]
    fn keeps_existing_framing_header() -> Result<()> {
        let req = Request::new("POST", "/p")?
            .with_header("content-length", "5")?
            .with_body(Body::Fixed(b"hello".to_vec()));
        assert_eq!(
            req.to_bytes(),
            b"POST /p HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello"
        );
        Ok(())
    }

    #[test]
    fn write_response_chunked() -> Result<()> {
        let body = ChunkedBody::new()
            .chunk("foo")
            .chunk_with_ext("bar", ";x")?
            .trailer("Expires", "never")?;
        let res = Response::new(200, "OK")?.with_body(Body::Chunked(body));
        assert_eq!(
            res.to_bytes(),
            &b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
               3\r\nfoo\r\n3;x\r\nbar\r\n0\r\nExpires: never\r\n\r\n"[..]
        );
        Ok(())
    }

    #[test]
    fn write_response_empty_reason() -> Result<()> {
        let res = Response::new(204, "")?;
        assert_eq!(res.to_bytes(), b"HTTP/1.1 204 \r\n\r\n");
        Ok(())
    }

    #[test]
    fn write_into_fixed_buffer() -> Result<()> {
        let req = Request::new("OPTIONS", "*")?;
        let mut buf = [0; 64];
        let n = req.write_into(&mut buf)?;
        assert_eq!(&buf[..n], b"OPTIONS * HTTP/1.1\r\n\r\n");

        // Exactly large enough.
        let mut exact = [0; 22];
        assert_eq!(req.write_into(&mut exact)?, 22);

        let mut small = [0; 21];
        let e = req.write_into(&mut small).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::OutputOverflow);
        Ok(())
    }
}
