//! Host and path patterns.
//!
//! Both pattern kinds are segment based: hosts are split on `.`, paths on
//! `/`. A `**` segment spans zero or more input segments; inside a segment
//! `*` matches any run of characters and `?` matches exactly one.
//!
//! ```text
//! **.example.com   matches  example.com, www.example.com, a.b.example.com
//! api-*.example.com matches api-eu.example.com
//! /users/{id}      matches  /users/42
//! /static/**       matches  /static, /static/css/site.css
//! ```

use std::fmt;

use thiserror::Error;

/// Pattern parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("path pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("host pattern {0:?} contains an empty label")]
    EmptyLabel(String),

    #[error("pattern {pattern:?} contains invalid character {ch:?}")]
    InvalidCharacter { pattern: String, ch: char },

    #[error("path pattern {0:?} has an unterminated '{{' variable")]
    UnterminatedVariable(String),
}

const MULTI_SEGMENT: &str = "**";

/// Glob over the labels of a host name. Case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPattern {
    raw: String,
    labels: Vec<String>,
}

impl HostPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let trimmed = raw.trim().trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut labels = Vec::new();
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(PatternError::EmptyLabel(raw.to_string()));
            }
            if let Some(ch) = label
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*' | '?')))
            {
                return Err(PatternError::InvalidCharacter {
                    pattern: raw.to_string(),
                    ch,
                });
            }
            push_segment(&mut labels, label.to_ascii_lowercase());
        }

        Ok(Self {
            raw: raw.to_string(),
            labels,
        })
    }

    /// Match a `Host` header value. Any port is ignored.
    pub fn matches(&self, host: &str) -> bool {
        let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        let labels: Vec<&str> = host.split('.').collect();
        match_segments(&self.labels, &labels)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Ant-style pattern over the segments of a request path. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<String>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in split_path(raw) {
            if segment.starts_with('{') {
                if !segment.ends_with('}') {
                    return Err(PatternError::UnterminatedVariable(raw.to_string()));
                }
                // A capture matches exactly one non-empty segment.
                segments.push("?*".to_string());
            } else {
                push_segment(&mut segments, segment.to_string());
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        let segments: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &segments)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split `/a/b/` into `["a", "b"]`. A single trailing slash is tolerated;
/// `/` yields no segments.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let inner = path.trim_start_matches('/');
    let inner = inner.strip_suffix('/').unwrap_or(inner);
    inner.split('/').filter(move |_| !inner.is_empty())
}

/// Strip a trailing `:port`, keeping bracketed IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Segment match in O(pattern × input). `reachable[i]` holds when the
/// pattern segments seen so far consume exactly `input[..i]`.
fn match_segments(pattern: &[String], input: &[&str]) -> bool {
    let mut reachable = vec![false; input.len() + 1];
    reachable[0] = true;

    for segment in pattern {
        if segment == MULTI_SEGMENT {
            let mut seen = false;
            for slot in reachable.iter_mut() {
                seen |= *slot;
                *slot = seen;
            }
        } else {
            for i in (0..input.len()).rev() {
                reachable[i + 1] = reachable[i] && wildcard_match(segment, input[i]);
            }
            reachable[0] = false;
        }
        if !reachable.contains(&true) {
            return false;
        }
    }

    reachable[input.len()]
}

/// Append a segment, folding runs of `**` into one.
fn push_segment(segments: &mut Vec<String>, segment: String) {
    if segment == MULTI_SEGMENT && segments.last().is_some_and(|last| last == MULTI_SEGMENT) {
        return;
    }
    segments.push(segment);
}

/// Glob match of a single segment: `*` is any run, `?` is one character.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}
