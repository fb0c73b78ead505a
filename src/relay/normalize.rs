//! Absolute-URI request lines rewritten into origin-form.
//!
//! Some clients send `GET http://host/path HTTP/1.1` even though `Host`
//! already names the target. The authority matching the Host value is
//! stripped textually; this is a token heuristic, not a URI parser.

use crate::wire::HttpMessage;

const LINE_END: &str = "\r\n";

/// Rewrite the request line of `message` in place.
///
/// The line to rewrite is the first header line containing the Host value
/// that is neither the `Host:` field itself nor a `Referer` field. Returns
/// whether a line was replaced. Messages without a Host are left untouched.
pub fn normalize_request_target(message: &mut HttpMessage) -> bool {
    let Some(host) = message.host().map(str::to_string) else {
        return false;
    };

    let Some(index) = message
        .headers
        .iter()
        .position(|line| is_candidate(line, &host))
    else {
        return false;
    };

    let line = &message.headers[index];
    let (content, terminator) = match line.strip_suffix(LINE_END) {
        Some(content) => (content, LINE_END),
        None => (line.as_str(), ""),
    };
    let rewritten = format!("{}{}", rewrite_request_line(content, &host), terminator);

    if rewritten == *line {
        return false;
    }
    tracing::trace!(from = %content, to = %rewritten.trim_end(), "Rewrote request line");
    message.headers[index] = rewritten;
    true
}

fn is_candidate(line: &str, host: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    line.contains(host) && !lower.starts_with("host:") && !lower.contains("referer")
}

/// Rewrite every space-delimited token of `line` that contains `host`.
pub fn rewrite_request_line(line: &str, host: &str) -> String {
    line.split(' ')
        .map(|token| {
            if token.contains(host) {
                rewrite_token(token, host)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the path segments after the first one naming the host.
///
/// An empty path becomes `/`. A trailing slash is appended only when the
/// last original segment has no `.`, and never to a path the token did not
/// end in `/`, so `/foo` stays `/foo`.
fn rewrite_token(token: &str, host: &str) -> String {
    let segments: Vec<&str> = token.split('/').collect();

    let mut path = String::new();
    let mut copying = false;
    for segment in &segments {
        if copying {
            if !segment.is_empty() {
                path.push('/');
                path.push_str(segment);
            }
        } else if segment.contains(host) {
            copying = true;
        }
    }

    if path.is_empty() {
        return "/".to_string();
    }

    // A token ending in `/` has an empty last segment, which is never file-like.
    if token.ends_with('/') {
        path.push('/');
    }
    path
}
