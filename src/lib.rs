//! Strict, sans-IO HTTP/1.1 message parser and serializer.
//!
//! Parses requests and responses following the RFC 9112 message grammar and
//! the RFC 3986 request-target grammar, and writes them back to wire bytes.
//! No sockets are involved: bytes go in, messages come out.
//!
//! Parsing is resumable. Hand the parser the bytes received so far, and when
//! it answers [`Status::Partial`], call again with the same buffer extended
//! by whatever arrived since.
//!
//! ```
//! use httpmsg::{Body, Config, RequestParser, Status};
//!
//! let input = b"POST /upload HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello";
//!
//! let mut parser = RequestParser::new(Config::default());
//!
//! // Only part of the message has arrived.
//! assert!(!parser.parse(&input[..30])?.is_complete());
//!
//! let Status::Complete { message, consumed } = parser.parse(input)? else {
//!     unreachable!()
//! };
//!
//! assert_eq!(consumed, input.len());
//! assert_eq!(message.method(), "POST");
//! assert_eq!(message.body(), &Body::Fixed(b"hello".to_vec()));
//!
//! // Writing gives back the same bytes.
//! assert_eq!(message.to_bytes(), input);
//! # Ok::<_, httpmsg::Error>(())
//! ```
//!
//! Anything outside the grammar is an [`Error`]. Obsolete line folding, bare
//! LF line endings and messages with ambiguous framing are all refused.

#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate log;

mod error;
pub use error::{Error, ErrorKind, Limit};

mod config;
pub use config::{Config, Limits};

mod scan;

mod pct;
pub use pct::{Query, Segment};

mod authority;
pub use authority::{Authority, Host, RegName};

mod target;
pub use target::{Path, RequestTarget};

mod line;
pub use line::HttpVersion;

mod header;
pub use header::HeaderField;

mod body;
pub use body::{Body, Chunk, ChunkedBody};

mod chunk;

mod message;
pub use message::{Message, Request, Response};

mod out;

mod parser;
pub use parser::{parse_message, parse_request, parse_response};
pub use parser::{MessageKind, Parser, RequestParser, ResponseParser, Status};

#[cfg(feature = "http_crate")]
#[cfg_attr(docsrs, doc(cfg(feature = "http_crate")))]
mod ext;
