//! Asking a person whether to continue after a pin mismatch.
//!
//! The verifier only needs a synchronous yes/no answer. How the question is shown (a dialog in
//! a separate process, a terminal prompt, a policy daemon) is up to the [`ConsentPrompt`]
//! implementation, which also owns the timeout: a prompt that is not answered in time reports
//! [`Response::Deny`] or [`Response::Error`], and the verifier treats both as a refusal.
//!
//! When the prompt lives in another process, [`message`] provides the request and reply
//! encodings.

pub mod message;

use std::time::Duration;

/// Answer to a consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[repr(i32)]
pub enum Response {
    /// Continue the connection and remember the host as allowed
    Allow = 0,
    /// Refuse the connection and remember the host as denied
    Deny = 1,
    /// The prompt failed or timed out
    Error = 2,
}

impl Response {
    /// Wire code of the response.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Response for a wire code; unknown codes map to [`Response::Error`].
    #[must_use]
    pub fn from_code(code: i32) -> Response {
        match code {
            0 => Response::Allow,
            1 => Response::Deny,
            _ => Response::Error,
        }
    }
}

/// Asks whether a connection to a host with mismatching pins may proceed.
pub trait ConsentPrompt: Send + Sync {
    /// Ask about `hostname`, giving up after `timeout`.
    fn ask_user(&self, hostname: &str, timeout: Duration) -> Response;
}

impl<F> ConsentPrompt for F
where
    F: Fn(&str, Duration) -> Response + Send + Sync,
{
    fn ask_user(&self, hostname: &str, timeout: Duration) -> Response {
        self(hostname, timeout)
    }
}

/// A prompt that refuses every request without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl ConsentPrompt for DenyAll {
    fn ask_user(&self, _hostname: &str, _timeout: Duration) -> Response {
        Response::Deny
    }
}
