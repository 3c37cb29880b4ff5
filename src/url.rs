//! Host extraction from request URLs.
//!
//! Decisions are remembered per host, and the preload trie is keyed by host, so URLs handed to
//! the verifier are reduced to their lowercase host component. A URL without a scheme is read
//! as `https://`. Only the authority is examined; path, query and fragment are ignored.

use crate::{Error, Result};

/// Extract the lowercase host from `url`.
///
/// Userinfo and port are stripped; IPv6 literals keep their brackets.
///
/// # Errors
/// Returns [`Error::InvalidUrl`] if the host is empty, contains characters not allowed in a
/// hostname, or the port is not numeric.
///
/// # Examples
///
/// ```rust
/// use pinscope::extract_hostname;
///
/// assert_eq!(extract_hostname("https://WwW.GooGle.cO.Kr")?, "www.google.co.kr");
/// assert_eq!(extract_hostname("user@example.com:8443/path?q")?, "example.com");
/// # Ok::<(), pinscope::Error>(())
/// ```
pub fn extract_hostname(url: &str) -> Result<String> {
    let invalid = || Error::InvalidUrl(url.to_string());

    let url = url.trim();
    let rest = match url.find("://") {
        Some(index) => {
            let scheme = &url[..index];
            if scheme.is_empty()
                || !scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            {
                return Err(invalid());
            }
            &url[index + 3..]
        }
        None => url,
    };

    let authority_end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let host_port = match authority.rfind('@') {
        Some(index) => &authority[index + 1..],
        None => authority,
    };

    let (host, port) = if host_port.starts_with('[') {
        let Some(close) = host_port.find(']') else {
            return Err(invalid());
        };
        let host = &host_port[..=close];
        if !host[1..close]
            .chars()
            .all(|c| c.is_ascii_hexdigit() || matches!(c, ':' | '.'))
        {
            return Err(invalid());
        }
        (host, &host_port[close + 1..])
    } else {
        match host_port.find(':') {
            Some(index) => (&host_port[..index], &host_port[index..]),
            None => (host_port, ""),
        }
    };

    if let Some(port) = port.strip_prefix(':') {
        if !port.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
    } else if !port.is_empty() {
        return Err(invalid());
    }

    if host.is_empty() || host == "[]" {
        return Err(invalid());
    }
    if !host.starts_with('[')
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
    {
        return Err(invalid());
    }

    Ok(host.to_ascii_lowercase())
}
