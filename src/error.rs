use core::fmt;

use thiserror::Error;

/// Error type for httpmsg.
///
/// Every failure carries the category ([`ErrorKind`]), a short static
/// description of the exact rule that was broken and, for parse failures,
/// the byte offset into the input where it was detected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {reason}{}", Offset(.offset))]
pub struct Error {
    kind: ErrorKind,
    reason: &'static str,
    offset: Option<usize>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("malformed start-line")]
    MalformedStartLine,

    #[error("invalid request-target")]
    InvalidRequestTarget,

    #[error("invalid header field")]
    InvalidHeaderField,

    #[error("ambiguous message framing")]
    AmbiguousFraming,

    #[error("invalid message framing")]
    InvalidFraming,

    #[error("input ended before the message was complete")]
    IncompleteMessage,

    #[error("{0} limit exceeded")]
    LimitExceeded(Limit),

    #[error("output too small to write message")]
    OutputOverflow,
}

/// Which configured cap in [`Limits`](crate::Limits) was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    LineLength,
    HeadSize,
    HeaderCount,
    BodySize,
    ChunkExtensions,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, reason: &'static str) -> Self {
        Error {
            kind,
            reason,
            offset: None,
        }
    }

    pub(crate) fn at(kind: ErrorKind, reason: &'static str, offset: usize) -> Self {
        Error {
            kind,
            reason,
            offset: Some(offset),
        }
    }

    /// Shift the offset of an error produced while parsing a sub-slice.
    ///
    /// Errors without an offset get `base` as offset.
    pub(crate) fn offset_by(mut self, base: usize) -> Self {
        self.offset = Some(base + self.offset.unwrap_or(0));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    /// Byte offset in the parsed input where the failure was detected.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Limit::LineLength => "line length",
            Limit::HeadSize => "head size",
            Limit::HeaderCount => "header count",
            Limit::BodySize => "body size",
            Limit::ChunkExtensions => "chunk extension size",
        };
        write!(f, "{}", s)
    }
}

struct Offset<'a>(&'a Option<usize>);

impl fmt::Display for Offset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, " (at byte {})", n),
            None => Ok(()),
        }
    }
}

pub(crate) type Result<T> = core::result::Result<T, Error>;

pub(crate) fn start_line(reason: &'static str, offset: usize) -> Error {
    Error::at(ErrorKind::MalformedStartLine, reason, offset)
}

pub(crate) fn target(reason: &'static str, offset: usize) -> Error {
    Error::at(ErrorKind::InvalidRequestTarget, reason, offset)
}

pub(crate) fn field(reason: &'static str, offset: usize) -> Error {
    Error::at(ErrorKind::InvalidHeaderField, reason, offset)
}

pub(crate) fn framing(reason: &'static str, offset: usize) -> Error {
    Error::at(ErrorKind::InvalidFraming, reason, offset)
}

pub(crate) fn limit(limit: Limit, offset: usize) -> Error {
    Error::at(ErrorKind::LimitExceeded(limit), "configured limit", offset)
}
