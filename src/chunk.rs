use std::io::{self, Write};

use crate::body::{Chunk, ChunkedBody};
use crate::config::Limits;
use crate::error::{framing, limit, ErrorKind, Limit, Result};
use crate::header::{parse_fields, HeaderField};
use crate::scan::{find_line, is_field_vchar, is_ows, is_qdtext, Scanner};

/// Decoder state for a chunked body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dechunker {
    Size,
    /// Data bytes left of the current chunk.
    Chunk(usize),
    CrLf,
    /// Trailer section, starting at the given input position.
    Trailer(usize),
    Ended,
}

/// What a chunked body has retained so far, checked against [`Limits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Retained {
    pub data: usize,
    pub ext: usize,
}

impl Dechunker {
    pub fn new() -> Self {
        Dechunker::Size
    }

    /// Decode from `buf[*pos..]` into `body`.
    ///
    /// `pos` is advanced over everything consumed, the decoder can be called
    /// again with the same buffer extended by more input. Returns `true` once
    /// the last chunk, trailers and final CRLF are read.
    pub fn parse_input(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
        body: &mut ChunkedBody,
        retained: &mut Retained,
        limits: &Limits,
    ) -> Result<bool> {
        loop {
            let more = match *self {
                Dechunker::Size => self.read_size(buf, pos, body, retained, limits)?,
                Dechunker::Chunk(_) => self.read_data(buf, pos, body)?,
                Dechunker::CrLf => self.expect_crlf(buf, pos)?,
                Dechunker::Trailer(start) => {
                    self.trailer(buf, pos, start, body.trailers_mut(), limits)?
                }
                Dechunker::Ended => return Ok(true),
            };

            if !more {
                return Ok(false);
            }
        }
    }

    #[cfg(test)]
    fn left(&self) -> usize {
        if let Self::Chunk(l) = self {
            *l
        } else {
            0
        }
    }

    fn read_size(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
        body: &mut ChunkedBody,
        retained: &mut Retained,
        limits: &Limits,
    ) -> Result<bool> {
        let start = *pos;
        let Some(cr) = find_line(buf, start, limits.max_line_len, ErrorKind::InvalidFraming)? else {
            return Ok(false);
        };

        let line = &buf[start..cr];
        let mut s = Scanner::new(line);

        let hex = s.match_hex().ok_or_else(|| {
            if line.is_empty() {
                framing("empty chunk-size line", start)
            } else {
                framing("invalid chunk size", start)
            }
        })?;

        let size = hex
            .iter()
            .try_fold(0_usize, |acc, c| {
                let d = (*c as char).to_digit(16)? as usize;
                acc.checked_mul(16)?.checked_add(d)
            })
            .ok_or_else(|| framing("chunk size overflow", start))?;

        let ext_at = start + s.pos();
        let ext = s.rest();
        validate_chunk_ext(ext, ext_at)?;

        retained.data = retained
            .data
            .checked_add(size)
            .filter(|t| *t <= limits.max_body_bytes)
            .ok_or_else(|| limit(Limit::BodySize, start))?;

        // The last chunk's extensions are checked, not kept.
        if size > 0 {
            retained.ext = retained
                .ext
                .checked_add(ext.len())
                .filter(|t| *t <= limits.max_chunk_ext_bytes)
                .ok_or_else(|| limit(Limit::ChunkExtensions, ext_at))?;
        }

        trace!("Chunk size: {}", size);

        *pos = cr + 2;
        *self = if size == 0 {
            Self::Trailer(*pos)
        } else {
            // Extensions are ASCII once validated.
            body.start_chunk(String::from_utf8_lossy(ext).into_owned(), size);
            Self::Chunk(size)
        };

        Ok(true)
    }

    fn read_data(&mut self, buf: &[u8], pos: &mut usize, body: &mut ChunkedBody) -> Result<bool> {
        let src = &buf[*pos..];

        let left = match self {
            Self::Chunk(v) => v,
            _ => return Ok(false),
        };

        let to_read = src.len().min(*left);

        if let Some(data) = body.current_mut() {
            data.extend_from_slice(&src[..to_read]);
        }
        *pos += to_read;
        *left -= to_read;

        if *left == 0 {
            *self = Self::CrLf;
        }

        Ok(to_read > 0)
    }

    fn expect_crlf(&mut self, buf: &[u8], pos: &mut usize) -> Result<bool> {
        let src = &buf[*pos..];

        let ok = match src {
            [b'\r', b'\n', ..] => true,
            [] | [b'\r'] => return Ok(false),
            _ => false,
        };

        if !ok {
            return Err(framing("chunk data not followed by CRLF", *pos));
        }

        *pos += 2;
        *self = Self::Size;

        Ok(true)
    }

    /// `start` is where the trailer section began, possibly in an earlier
    /// call.
    fn trailer(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
        start: usize,
        trailers: &mut Vec<HeaderField>,
        limits: &Limits,
    ) -> Result<bool> {
        let done = parse_fields(buf, pos, trailers, limits.max_line_len, limits.max_headers)?;

        let end = if done { *pos } else { buf.len() };
        if end - start > limits.max_head_bytes {
            return Err(limit(Limit::HeadSize, start + limits.max_head_bytes));
        }

        if done {
            trace!("Chunked body ended with {} trailers", trailers.len());
            *self = Self::Ended;
        }

        Ok(done)
    }
}

/// `chunk-ext = *( BWS ";" BWS ext-name [ BWS "=" BWS ext-value ] )`
///
/// `ext-value` is a token or a quoted-string.
pub(crate) fn validate_chunk_ext(src: &[u8], offset: usize) -> Result<()> {
    let mut s = Scanner::new(src);

    while !s.is_empty() {
        s.skip_ows();
        if !s.expect_byte(b';') {
            return Err(framing("expected ';' before chunk extension", offset + s.pos()));
        }
        s.skip_ows();

        if s.match_token().is_none() {
            return Err(framing("invalid chunk extension name", offset + s.pos()));
        }

        let before_value = s.clone();
        s.skip_ows();
        if !s.expect_byte(b'=') {
            s = before_value;
            continue;
        }
        s.skip_ows();

        let value_ok = if s.peek() == Some(b'"') {
            skip_quoted_string(&mut s)
        } else {
            s.match_token().is_some()
        };

        if !value_ok {
            return Err(framing("invalid chunk extension value", offset + s.pos()));
        }
    }

    Ok(())
}

/// `quoted-string = DQUOTE *( qdtext / quoted-pair ) DQUOTE`
fn skip_quoted_string(s: &mut Scanner<'_>) -> bool {
    if !s.expect_byte(b'"') {
        return false;
    }
    loop {
        match s.peek() {
            Some(b'"') => {
                s.advance();
                return true;
            }
            Some(b'\\') => {
                s.advance();
                match s.peek() {
                    Some(c) if is_ows(c) || is_field_vchar(c) => s.advance(),
                    _ => return false,
                }
            }
            Some(c) if is_qdtext(c) => s.advance(),
            _ => return false,
        }
    }
}

pub(crate) fn write_chunk(w: &mut impl Write, chunk: &Chunk) -> io::Result<()> {
    write!(w, "{:x}{}\r\n", chunk.data().len(), chunk.extensions())?;
    w.write_all(chunk.data())?;
    w.write_all(b"\r\n")
}

/// The zero-size chunk, trailers and the final CRLF.
pub(crate) fn write_last_chunk(w: &mut impl Write, trailers: &[HeaderField]) -> io::Result<()> {
    w.write_all(b"0\r\n")?;
    for t in trailers {
        crate::out::write_field(w, t)?;
    }
    w.write_all(b"\r\n")
}
