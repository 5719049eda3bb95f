//! # Template Tokens
//!
//! Parses a route template into literal text and capture tokens, and
//! synthesizes the anchored regular expression used for matching.
//!
//! ## Mini-language
//!
//! - `{:name}` - captures one path segment (no `/`)
//! - `{:name:regex}` - captures with a user-declared sub-pattern; the regex
//!   may contain quantifier braces such as `\d{2,4}`
//! - `{:args}` - the wildcard capture, matches the rest of the path
//!
//! A `/` or `.` directly in front of a token is the token's separator. It is
//! kept with the capture so optional captures drop together with it.

use crate::error::{Error, Result};

/// Name of the wildcard capture
pub const WILDCARD: &str = "args";

/// Pattern matching only an all-slash path, used for root templates
pub const ROOT_PATTERN: &str = "^/*$";

const SEGMENT_REGEX: &str = "[^/]+";
const WILDCARD_REGEX: &str = ".*";

/// A piece of a tokenized template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched verbatim
    Literal(String),
    /// A named capture token
    Capture(Capture),
}

/// A named capture token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Key name the captured value binds to
    pub name: String,
    /// `/` or `.` immediately preceding the token, if any
    pub separator: Option<char>,
    /// User-declared sub-pattern
    pub pattern: Option<String>,
}

impl Capture {
    /// Whether this is the wildcard capture
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    /// The regex the capture group matches with
    #[must_use]
    pub fn effective_pattern(&self) -> &str {
        match &self.pattern {
            Some(pattern) => pattern,
            None if self.is_wildcard() => WILDCARD_REGEX,
            None => SEGMENT_REGEX,
        }
    }

    /// Token text as written in the template, separator excluded
    #[must_use]
    pub fn token(&self) -> String {
        match &self.pattern {
            Some(pattern) => format!("{{:{}:{}}}", self.name, pattern),
            None => format!("{{:{}}}", self.name),
        }
    }

    /// Separator followed by `value`
    #[must_use]
    pub fn render(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 1);
        if let Some(sep) = self.separator {
            out.push(sep);
        }
        out.push_str(value);
        out
    }

    /// Synthesize the capture group.
    ///
    /// When optional, separator and capture are omitted together.
    #[must_use]
    pub fn group(&self, optional: bool) -> String {
        let group = format!("(?P<{}>{})", self.name, self.effective_pattern());
        let sep = self
            .separator
            .map(|c| regex::escape(&c.to_string()))
            .unwrap_or_default();

        match (sep.is_empty(), optional) {
            (true, true) => format!("{group}?"),
            (true, false) => group,
            (false, true) => format!("(?:{sep}{group})?"),
            (false, false) => format!("{sep}{group}"),
        }
    }
}

/// Whether a template compiles to the root pattern
#[must_use]
pub fn is_root(template: &str) -> bool {
    template.is_empty() || template == "/"
}

/// Split a template into literal and capture segments
///
/// # Errors
///
/// Returns `Error::MalformedPattern` for an unterminated token or an empty
/// capture name.
pub fn tokenize(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("{:") {
        literal.push_str(&rest[..start]);
        let (mut capture, consumed) = parse_capture(template, &rest[start + 2..])?;

        if let Some(sep) = literal.pop() {
            if sep == '/' || sep == '.' {
                capture.separator = Some(sep);
            } else {
                literal.push(sep);
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Capture(capture));
        rest = &rest[start + 2 + consumed..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Parse a token body (text after `{:`). Returns the capture and the number
/// of bytes consumed including the closing brace.
fn parse_capture(template: &str, body: &str) -> Result<(Capture, usize)> {
    let name_end = body
        .find(|c: char| c == ':' || c == '}')
        .ok_or_else(|| Error::malformed(template, "unterminated capture token"))?;
    let name = &body[..name_end];
    if name.is_empty() {
        return Err(Error::malformed(template, "empty capture name"));
    }

    if body[name_end..].starts_with('}') {
        return Ok((capture(name, None), name_end + 1));
    }

    let pattern_start = name_end + 1;
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in body[pattern_start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth == 0 => {
                let pattern = &body[pattern_start..pattern_start + i];
                let pattern = (!pattern.is_empty()).then(|| pattern.to_string());
                return Ok((capture(name, pattern), pattern_start + i + 1));
            }
            '}' => depth -= 1,
            _ => {}
        }
    }
    Err(Error::malformed(template, "unterminated capture token"))
}

fn capture(name: &str, pattern: Option<String>) -> Capture {
    Capture {
        name: name.to_string(),
        separator: None,
        pattern,
    }
}

/// Build the anchored pattern source for a token list.
///
/// `optional` decides, per capture, whether the group may be skipped.
pub fn synthesize(segments: &[Segment], optional: impl Fn(&Capture) -> bool) -> String {
    let mut pattern = String::from("^");
    for segment in segments {
        match segment {
            Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
            Segment::Capture(capture) => pattern.push_str(&capture.group(optional(capture))),
        }
    }
    pattern.push('$');
    pattern
}

/// Captures in template order
pub fn captures(segments: &[Segment]) -> impl Iterator<Item = &Capture> {
    segments.iter().filter_map(|segment| match segment {
        Segment::Capture(capture) => Some(capture),
        Segment::Literal(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(segments: &[Segment]) -> Vec<&str> {
        captures(segments).map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_tokenize_controller_action() {
        let segments = tokenize("/{:controller}/{:action}").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(names(&segments), ["controller", "action"]);
        assert!(captures(&segments).all(|c| c.separator == Some('/')));
    }

    #[test]
    fn test_tokenize_literals_and_dot_separator() {
        let segments = tokenize("/photos/{:id:[0-9]+}.{:type}").unwrap();
        assert_eq!(segments[0], Segment::Literal("/photos".to_string()));
        let Segment::Capture(id) = &segments[1] else {
            panic!("expected capture");
        };
        assert_eq!(id.separator, Some('/'));
        assert_eq!(id.pattern.as_deref(), Some("[0-9]+"));
        let Segment::Capture(kind) = &segments[2] else {
            panic!("expected capture");
        };
        assert_eq!(kind.separator, Some('.'));
    }

    #[test]
    fn test_tokenize_quantifier_braces() {
        let segments = tokenize("/archive/{:year:\\d{4}}/{:slug}").unwrap();
        let caps: Vec<_> = captures(&segments).collect();
        assert_eq!(caps[0].pattern.as_deref(), Some("\\d{4}"));
        assert_eq!(caps[1].name, "slug");
    }

    #[test]
    fn test_tokenize_no_separator() {
        let segments = tokenize("/page-{:num}").unwrap();
        assert_eq!(segments[0], Segment::Literal("/page-".to_string()));
        let Segment::Capture(num) = &segments[1] else {
            panic!("expected capture");
        };
        assert_eq!(num.separator, None);
    }

    #[test]
    fn test_tokenize_errors() {
        assert!(tokenize("/{:id").is_err());
        assert!(tokenize("/{:id:\\d{2}").is_err());
        assert!(tokenize("/{:}").is_err());
    }

    #[test]
    fn test_synthesize_optional_groups() {
        let segments = tokenize("/{:controller}/{:action}/{:args}").unwrap();
        let pattern = synthesize(&segments, |c| c.name != "controller");
        assert_eq!(
            pattern,
            "^/(?P<controller>[^/]+)(?:/(?P<action>[^/]+))?(?:/(?P<args>.*))?$"
        );
    }

    #[test]
    fn test_synthesize_escapes_literals() {
        let segments = tokenize("/photos/{:id:[0-9]+}.jpg").unwrap();
        let pattern = synthesize(&segments, |_| false);
        assert_eq!(pattern, "^/photos/(?P<id>[0-9]+)\\.jpg$");
    }

    #[test]
    fn test_token_text() {
        let segments = tokenize("/{:id:\\d+}").unwrap();
        let capture = captures(&segments).next().unwrap();
        assert_eq!(capture.token(), "{:id:\\d+}");
        assert_eq!(capture.render("7"), "/7");
    }

    #[test]
    fn test_is_root() {
        assert!(is_root(""));
        assert!(is_root("/"));
        assert!(!is_root("/users"));
    }
}
