//! Helpers for keeping player-supplied and generated text readable in logs.
//!
//! Quest titles, oracle wishes and model replies can contain newlines or
//! arbitrary length prose; everything that reaches `log` goes through
//! [`escape_log`] first so each record stays on one line.

use std::fmt::Write;

/// Default preview length for [`escape_log`].
pub const LOG_PREVIEW_CHARS: usize = 160;

/// Escape `s` for single-line logging, truncated to [`LOG_PREVIEW_CHARS`].
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, LOG_PREVIEW_CHARS)
}

/// Escape newlines, tabs, backslashes and other control characters, then cut
/// the result after `limit` source characters with a trailing ellipsis.
pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\u{{{:04x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Obscure the local part of an email address for the security log:
/// `adventurer@example.com` becomes `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, escape_log_with_limit(domain, 64))
        }
        None => "***".to_string(),
    }
}

/// Size of an uploaded proof image, for log lines.
pub fn byte_size(len: usize) -> String {
    match len {
        n if n >= 1024 * 1024 => format!("{:.1} MiB", n as f64 / (1024.0 * 1024.0)),
        n if n >= 1024 => format!("{:.1} KiB", n as f64 / 1024.0),
        n => format!("{} B", n),
    }
}
