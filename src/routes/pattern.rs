//! Path patterns with named parameters
//!
//! A pattern is a `/`-separated list of segments where each segment is either
//! a literal or a parameter written `:name`. `/` itself has no segments.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use super::table::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern such as `/` or `/:id`
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern, rejecting empty segments and repeated parameter names
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let mut seen = HashSet::new();
        let mut segments = Vec::new();

        for segment in split_segments(pattern) {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }

            match segment.strip_prefix(':') {
                Some("") => return Err(invalid("parameter name must not be empty")),
                Some(name) => {
                    if !seen.insert(name) {
                        return Err(invalid(&format!("duplicate parameter '{}'", name)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(segment.to_string())),
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as it was registered
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the parameters in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Two patterns overlap completely when they only differ in parameter names
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Match a request path, returning the bound parameters on success
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.push(name.clone(), decode_segment(part));
                }
                _ => return None,
            }
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameters captured from a matched path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// A single trailing slash is not significant.
fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').filter(move |_| !trimmed.is_empty())
}

fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_pattern_matches_root_only() {
        let pattern = PathPattern::parse("/").unwrap();

        assert_eq!(pattern.matches("/"), Some(PathParams::default()));
        assert_eq!(pattern.matches(""), Some(PathParams::default()));
        assert!(pattern.matches("/42").is_none());
    }

    #[test]
    fn test_param_binds_single_segment() {
        let pattern = PathPattern::parse("/:id").unwrap();

        let params = pattern.matches("/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);

        assert!(pattern.matches("/").is_none());
        assert!(pattern.matches("/42/extra").is_none());
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let pattern = PathPattern::parse("/:id").unwrap();
        assert_eq!(pattern.matches("/42/").unwrap().get("id"), Some("42"));
    }

    #[test]
    fn test_empty_segment_never_binds() {
        let pattern = PathPattern::parse("/:id/profile").unwrap();
        assert!(pattern.matches("//profile").is_none());
    }

    #[test]
    fn test_literal_segments_compare_exactly() {
        let pattern = PathPattern::parse("/:id/profile").unwrap();

        assert_eq!(
            pattern.matches("/7/profile").unwrap().get("id"),
            Some("7")
        );
        assert!(pattern.matches("/7/Profile").is_none());
    }

    #[test]
    fn test_param_values_are_percent_decoded() {
        let pattern = PathPattern::parse("/:name").unwrap();

        assert_eq!(
            pattern.matches("/jane%20doe").unwrap().get("name"),
            Some("jane doe")
        );
        // Invalid UTF-8 after decoding falls back to the raw segment
        assert_eq!(pattern.matches("/%FF").unwrap().get("name"), Some("%FF"));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        for raw in ["", "users", "/:", "/a//b", "/:id/:id"] {
            assert!(
                matches!(
                    PathPattern::parse(raw),
                    Err(RouteError::InvalidPattern { .. })
                ),
                "pattern {:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_same_shape_ignores_param_names() {
        let a = PathPattern::parse("/:id").unwrap();
        let b = PathPattern::parse("/:user_id/").unwrap();
        let c = PathPattern::parse("/me").unwrap();

        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
        assert_eq!(b.param_names().collect::<Vec<_>>(), vec!["user_id"]);
    }
}
