//! Wire format between a verifier and an out-of-process consent prompt.
//!
//! A request is the hostname as a `u32` little-endian byte length followed by UTF-8 bytes, then
//! the timeout in milliseconds as an `i32` (`-1` for no timeout). A reply is a single `i32`
//! response code, see [`Response::code`].

use std::time::Duration;

use crate::{
    consent::Response,
    file::{io::write_le, Parser},
    Error, Result,
};

/// Longest hostname a request may carry.
const MAX_HOSTNAME_LEN: usize = 1024;

/// A consent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Host the connection is for
    pub hostname: String,
    /// How long the prompt may wait for an answer; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl PromptRequest {
    /// Create a request.
    pub fn new(hostname: impl Into<String>, timeout: Option<Duration>) -> Self {
        PromptRequest {
            hostname: hostname.into(),
            timeout,
        }
    }

    /// Encode the request. Timeouts are clamped to `i32::MAX` milliseconds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if the hostname is longer than 1024 bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.hostname.len() > MAX_HOSTNAME_LEN {
            return Err(Error::InvalidParameter(format!(
                "Hostname of {} bytes is too long for a prompt request",
                self.hostname.len()
            )));
        }

        let timeout_ms = match self.timeout {
            Some(timeout) => i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX),
            None => -1,
        };

        let mut out = Vec::with_capacity(8 + self.hostname.len());
        write_le(&mut out, self.hostname.len() as u32);
        out.extend_from_slice(self.hostname.as_bytes());
        write_le(&mut out, timeout_ms);
        Ok(out)
    }

    /// Decode a request.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] for truncated input and [`Error::Malformed`] for an
    /// oversized or non-UTF-8 hostname, a negative timeout other than `-1`, or trailing bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let len = parser.read_le::<u32>()? as usize;
        if len > MAX_HOSTNAME_LEN {
            return Err(malformed_error!("Prompt hostname length {} is too long", len));
        }
        let hostname = parser.read_string_utf8(len)?.to_string();

        let timeout = match parser.read_le::<i32>()? {
            -1 => None,
            ms if ms >= 0 => Some(Duration::from_millis(ms as u64)),
            ms => return Err(malformed_error!("Invalid prompt timeout {}", ms)),
        };

        if parser.has_more_data() {
            return Err(malformed_error!("Trailing bytes after prompt request"));
        }

        Ok(PromptRequest { hostname, timeout })
    }
}

/// Encode a reply.
#[must_use]
pub fn encode_response(response: Response) -> [u8; 4] {
    response.code().to_le_bytes()
}

/// Decode a reply; unknown codes become [`Response::Error`].
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if fewer than four bytes are given.
pub fn decode_response(data: &[u8]) -> Result<Response> {
    let mut parser = Parser::new(data);
    Ok(Response::from_code(parser.read_le::<i32>()?))
}
