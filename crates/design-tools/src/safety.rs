//! Redaction helpers for anything that may end up in a log line or an error message.
//!
//! The API credential only ever travels in a request header, but transport errors can echo
//! URLs and upstream bodies can echo request headers back. Every message that leaves the
//! adapter goes through these helpers first.

use url::Url;

pub const REDACTED: &str = "[redacted]";

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

/// Replace every occurrence of `secret` in `message`.
#[must_use]
pub fn scrub_secret(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    message.replace(secret, REDACTED)
}

/// Render a response body as text for error reporting, capped at `limit` bytes.
#[must_use]
pub fn truncate_body(bytes: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= limit {
        return text.into_owned();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… ({} bytes total)", &text[..end], bytes.len())
}
