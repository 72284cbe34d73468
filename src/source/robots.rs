//! robots.txt parsing and matching.
//!
//! Only groups that apply to the generic user agent `*` are kept. Matching
//! follows RFC 9309: the longest matching pattern decides, `Allow` wins ties,
//! and a path no rule matches is allowed.
//!
//! Paths are compared in percent-encoded form, the way `url` reports them, so
//! patterns are normalized to the same encoding when parsed.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Octets escaped in a pattern. `%` is kept so existing escapes survive, and
/// `*` and `$` keep their pattern meaning.
const PATTERN_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Access policy for the generic user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
    deny_all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    allow: bool,
    pattern: String,
}

impl RobotsPolicy {
    /// Policy that permits everything (no robots.txt, or one we may ignore).
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Policy that refuses everything (robots.txt access was forbidden).
    pub fn deny_all() -> Self {
        Self {
            rules: Vec::new(),
            deny_all: true,
        }
    }

    /// Parse a robots.txt body.
    pub fn parse(body: &str) -> Self {
        let mut rules = Vec::new();
        let mut group_applies = false;
        // A user-agent line following rules starts a new group.
        let mut in_agent_lines = false;

        for line in body.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_ascii_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        group_applies = false;
                        in_agent_lines = true;
                    }
                    if value == "*" {
                        group_applies = true;
                    }
                }
                "allow" | "disallow" => {
                    in_agent_lines = false;
                    if group_applies && !value.is_empty() {
                        rules.push(Rule {
                            allow: field == "allow",
                            pattern: normalize_pattern(value),
                        });
                    }
                }
                _ => {}
            }
        }

        Self {
            rules,
            deny_all: false,
        }
    }

    /// Whether the generic user agent may fetch `path` (path plus query).
    pub fn is_allowed(&self, path: &str) -> bool {
        if self.deny_all {
            return false;
        }

        let path = normalize_pattern(path);
        let best = self
            .rules
            .iter()
            .filter(|rule| pattern_matches(&rule.pattern, &path))
            .max_by_key(|rule| (rule.pattern.len(), rule.allow));

        best.map_or(true, |rule| rule.allow)
    }
}

/// Percent-encode non-ASCII octets and uppercase existing escapes, so
/// `/café` and `/caf%c3%a9` both become `/caf%C3%A9`. Request paths go
/// through the same function before matching.
fn normalize_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(idx) = rest.find('%') {
        out.extend(utf8_percent_encode(&rest[..idx], PATTERN_ESCAPES));
        let escape = rest.get(idx + 1..idx + 3).filter(|hex| {
            hex.bytes().all(|b| b.is_ascii_hexdigit())
        });
        match escape {
            Some(hex) => {
                out.push('%');
                out.push_str(&hex.to_ascii_uppercase());
                rest = &rest[idx + 3..];
            }
            None => {
                out.push_str("%25");
                rest = &rest[idx + 1..];
            }
        }
    }
    out.extend(utf8_percent_encode(rest, PATTERN_ESCAPES));
    out
}

/// Match a robots pattern (with `*` wildcards and optional trailing `$`)
/// against the start of `path`.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };

    let mut pieces = pattern.split('*');
    let first = pieces.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let pieces: Vec<&str> = pieces.collect();
    if pieces.is_empty() {
        return !anchored || rest.is_empty();
    }

    for (idx, piece) in pieces.iter().enumerate() {
        let last = idx == pieces.len() - 1;
        if last && anchored {
            return rest.ends_with(piece);
        }
        match rest.find(piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }

    true
}
