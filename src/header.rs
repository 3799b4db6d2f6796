use core::fmt;
use core::str;

use crate::error::{field, limit, Error, ErrorKind, Limit, Result};
use crate::scan::{find_line, is_field_vchar, is_ows, is_tchar, Scanner};

/// A header (or trailer) field.
///
/// The name keeps its original case but compares case-insensitively through
/// [`HeaderField::is`]. The value has surrounding whitespace removed.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: Vec<u8>,
}

impl HeaderField {
    /// Create a field, checking the name is a token and the value holds no
    /// control characters other than HTAB. Surrounding whitespace of the
    /// value is removed.
    pub fn new(name: &str, value: impl AsRef<[u8]>) -> Result<Self> {
        if name.is_empty() || !name.bytes().all(is_tchar) {
            return Err(Error::new(ErrorKind::InvalidHeaderField, "invalid field name"));
        }

        let value = trim_ows(value.as_ref());
        if !value.iter().all(|c| is_value_byte(*c)) {
            return Err(Error::new(
                ErrorKind::InvalidHeaderField,
                "invalid byte in field value",
            ));
        }

        Ok(HeaderField {
            name: name.to_owned(),
            value: value.to_vec(),
        })
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value, if it is valid UTF-8.
    #[inline(always)]
    pub fn try_value(&self) -> Option<&str> {
        str::from_utf8(&self.value).ok()
    }

    #[inline(always)]
    pub fn value_raw(&self) -> &[u8] {
        &self.value
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("HeaderField");
        f.field("name", &self.name);
        if let Some(value) = self.try_value() {
            f.field("value", &value);
        } else {
            f.field("value", &self.value);
        }
        f.finish()
    }
}

/// Parse field lines from `buf[*pos..]` into `fields` until the empty line.
///
/// `pos` is moved past every complete line, so a call that returns
/// `Ok(false)` (need more input) can be repeated with a longer `buf`.
/// Returns `Ok(true)` once the empty line is consumed.
pub(crate) fn parse_fields(
    buf: &[u8],
    pos: &mut usize,
    fields: &mut Vec<HeaderField>,
    max_line_len: usize,
    max_count: usize,
) -> Result<bool> {
    loop {
        let Some(cr) = find_line(buf, *pos, max_line_len, ErrorKind::InvalidHeaderField)? else {
            return Ok(false);
        };

        let line = &buf[*pos..cr];

        if line.is_empty() {
            *pos = cr + 2;
            return Ok(true);
        }

        if fields.len() >= max_count {
            return Err(limit(Limit::HeaderCount, *pos));
        }

        fields.push(parse_field_line(line, *pos)?);
        *pos = cr + 2;
    }
}

/// `field-name ":" OWS field-value OWS`, without the CRLF.
pub(crate) fn parse_field_line(line: &[u8], offset: usize) -> Result<HeaderField> {
    let mut s = Scanner::new(line);

    if s.peek().map_or(false, is_ows) {
        return Err(field("obsolete line folding", offset));
    }

    let name = s
        .match_token()
        .ok_or_else(|| field("invalid field name", offset))?;

    if s.peek().map_or(false, is_ows) {
        return Err(field("whitespace before colon", offset + s.pos()));
    }

    if !s.expect_byte(b':') {
        return Err(field("expected ':' after field name", offset + s.pos()));
    }

    let value_start = s.pos();
    if let Some(i) = s.rest().iter().position(|c| !is_value_byte(*c)) {
        return Err(field("invalid byte in field value", offset + value_start + i));
    }

    Ok(HeaderField {
        name: String::from_utf8_lossy(name).into_owned(),
        value: trim_ows(s.rest()).to_vec(),
    })
}

/// field-vchar, SP or HTAB.
fn is_value_byte(c: u8) -> bool {
    is_field_vchar(c) || is_ows(c)
}

fn trim_ows(v: &[u8]) -> &[u8] {
    let start = v.iter().position(|c| !is_ows(*c)).unwrap_or(v.len());
    let end = v.iter().rposition(|c| !is_ows(*c)).map_or(start, |i| i + 1);
    &v[start..end]
}

/// Split a list-valued field, `#element`, into its trimmed non-empty members.
pub(crate) fn list_members(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value
        .split(|c| *c == b',')
        .map(trim_ows)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    fn fields(input: &[u8]) -> Result<(bool, usize, Vec<HeaderField>)> {
        let mut pos = 0;
        let mut fields = Vec::new();
        let done = parse_fields(input, &mut pos, &mut fields, 100, 10)?;
        Ok((done, pos, fields))
    }

    #[test]
    fn field_line() -> Result<()> {
        let f = parse_field_line(b"Content-Type: \t text/plain; a=b \t", 0)?;
        assert_eq!(f.name(), "Content-Type");
        assert_eq!(f.try_value(), Some("text/plain; a=b"));
        assert!(f.is("content-type"));
        assert!(!f.is("content-length"));

        let f = parse_field_line(b"X-Empty:", 0)?;
        assert_eq!(f.value_raw(), b"");

        let f = parse_field_line(b"X-Obs: caf\xe9", 0)?;
        assert_eq!(f.try_value(), None);
        assert_eq!(f.value_raw(), b"caf\xe9");
        Ok(())
    }

    #[test]
    fn field_line_failures() {
        let cases: [(&[u8], &str, usize); 6] = [
            (b"Foo : bar", "whitespace before colon", 3),
            (b"Foo\t: bar", "whitespace before colon", 3),
            (b" folded", "obsolete line folding", 0),
            (b"Fo/o: bar", "expected ':' after field name", 2),
            (b": bar", "invalid field name", 0),
            (b"Foo: b\x00r", "invalid byte in field value", 6),
        ];
        for (line, reason, at) in cases {
            let e = parse_field_line(line, 0).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::InvalidHeaderField);
            assert_eq!(e.reason(), reason);
            assert_eq!(e.offset(), Some(at));
        }
    }

    #[test]
    fn field_block() -> Result<()> {
        let (done, pos, f) = fields(b"A: 1\r\nb: 2\r\nA: 3\r\n\r\nbody")?;
        assert!(done);
        assert_eq!(pos, 20);
        let names: Vec<_> = f.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["A", "b", "A"]);
        Ok(())
    }

    #[test]
    fn field_block_resumes() -> Result<()> {
        let input = b"A: 1\r\nB: 2\r\n\r\n";
        let mut pos = 0;
        let mut f = Vec::new();
        assert!(!parse_fields(&input[..8], &mut pos, &mut f, 100, 10)?);
        assert_eq!(pos, 6);
        assert_eq!(f.len(), 1);
        assert!(parse_fields(input, &mut pos, &mut f, 100, 10)?);
        assert_eq!(pos, input.len());
        assert_eq!(f.len(), 2);
        Ok(())
    }

    #[test]
    fn field_block_obs_fold() {
        let e = fields(b"A: 1\r\n  continued\r\n\r\n").unwrap_err();
        assert_eq!(e.reason(), "obsolete line folding");
        assert_eq!(e.offset(), Some(6));
    }

    #[test]
    fn field_block_bare_lf() {
        let e = fields(b"A: 1\nB: 2\r\n\r\n").unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidHeaderField);
        assert_eq!(e.offset(), Some(4));
    }

    #[test]
    fn field_block_count_limit() {
        let mut input = Vec::new();
        for i in 0..11 {
            input.extend_from_slice(format!("X-{}: v\r\n", i).as_bytes());
        }
        input.extend_from_slice(b"\r\n");
        let e = fields(&input).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::LimitExceeded(Limit::HeaderCount));
    }

    #[test]
    fn new_validates() -> Result<()> {
        let f = HeaderField::new("X-Foo", "  bar baz ")?;
        assert_eq!(f.try_value(), Some("bar baz"));
        assert!(HeaderField::new("X Foo", "bar").is_err());
        assert!(HeaderField::new("", "bar").is_err());
        assert!(HeaderField::new("X-Foo", "a\r\nb").is_err());
        Ok(())
    }

    #[test]
    fn list_split() {
        let m: Vec<_> = list_members(b"gzip , ,chunked").collect();
        assert_eq!(m, [&b"gzip"[..], &b"chunked"[..]]);
    }
}
