//! Parser configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Caps on the resources a single message may use.
///
/// Exceeding any of them fails the parse with
/// [`ErrorKind::LimitExceeded`](crate::ErrorKind::LimitExceeded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Longest start-line, field line or chunk-size line, excluding CRLF.
    pub max_line_len: usize,
    /// Start-line plus header section, including CRLFs. Also applied to the
    /// trailer section on its own.
    pub max_head_bytes: usize,
    /// Number of header fields, and separately of trailer fields.
    pub max_headers: usize,
    /// Decoded body bytes.
    pub max_body_bytes: usize,
    /// Chunk extension text kept for one chunked body, summed over its
    /// chunks.
    pub max_chunk_ext_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_len: 8 * 1024,
            max_head_bytes: 64 * 1024,
            max_headers: 100,
            max_body_bytes: 10 * 1024 * 1024,
            max_chunk_ext_bytes: 8 * 1024,
        }
    }
}

/// Parser policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub limits: Limits,
    /// Accept `userinfo@` in request-targets. Off by default.
    pub allow_userinfo: bool,
    /// Require asterisk-form only with OPTIONS and authority-form exactly
    /// with CONNECT. On by default.
    pub check_target_form: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            allow_userinfo: false,
            check_target_form: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn allow_userinfo(mut self, allow: bool) -> Self {
        self.allow_userinfo = allow;
        self
    }

    pub fn check_target_form(mut self, check: bool) -> Self {
        self.check_target_form = check;
        self
    }
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_line_len(mut self, n: usize) -> Self {
        self.max_line_len = n;
        self
    }

    pub fn max_head_bytes(mut self, n: usize) -> Self {
        self.max_head_bytes = n;
        self
    }

    pub fn max_headers(mut self, n: usize) -> Self {
        self.max_headers = n;
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.max_body_bytes = n;
        self
    }

    pub fn max_chunk_ext_bytes(mut self, n: usize) -> Self {
        self.max_chunk_ext_bytes = n;
        self
    }
}
