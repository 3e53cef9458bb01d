//! Route definitions and path matching

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::error::ApiError;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

/// A route handler.
///
/// Receives the request and, for pattern routes, the text of the first
/// capture group.
pub type Handler = Arc<dyn Fn(&Request, Option<&str>) -> Result<Response, ApiError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("route pattern {pattern:?} must have exactly one capture group, found {found}")]
    CaptureGroups { pattern: String, found: usize },
}

/// How a route decides whether a path belongs to it.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Byte-equal comparison
    Literal(String),
    /// Full-path regex match with exactly one capture group
    Pattern(Regex),
}

/// Outcome of matching a path.
#[derive(Debug, PartialEq, Eq)]
pub enum PathMatch<'a> {
    Exact,
    Captured(&'a str),
}

impl PathMatcher {
    /// Compiles a pattern matcher.
    ///
    /// The pattern is anchored on both ends, so it only ever matches the
    /// entire path whether or not the caller wrote `^...$`.
    pub fn pattern(pattern: &str) -> Result<Self, RouteError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        // captures_len counts the implicit whole-match group
        let found = regex.captures_len() - 1;
        if found != 1 {
            return Err(RouteError::CaptureGroups {
                pattern: pattern.to_string(),
                found,
            });
        }

        Ok(PathMatcher::Pattern(regex))
    }

    pub fn matches<'p>(&self, path: &'p str) -> Option<PathMatch<'p>> {
        match self {
            PathMatcher::Literal(literal) => (literal == path).then_some(PathMatch::Exact),
            PathMatcher::Pattern(regex) => {
                let captures = regex.captures(path)?;
                // An optional group that did not participate captures ""
                let value = captures.get(1).map_or("", |m| m.as_str());
                Some(PathMatch::Captured(value))
            }
        }
    }
}

impl fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatcher::Literal(literal) => f.write_str(literal),
            PathMatcher::Pattern(regex) => write!(f, "{}", regex.as_str()),
        }
    }
}

/// A (method, path matcher, handler) binding.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub matcher: PathMatcher,
    pub handler: Handler,
}

impl Route {
    pub fn literal<F>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, Option<&str>) -> Result<Response, ApiError> + Send + Sync + 'static,
    {
        Self {
            method,
            matcher: PathMatcher::Literal(path.into()),
            handler: Arc::new(handler),
        }
    }

    pub fn pattern<F>(method: Method, pattern: &str, handler: F) -> Result<Self, RouteError>
    where
        F: Fn(&Request, Option<&str>) -> Result<Response, ApiError> + Send + Sync + 'static,
    {
        Ok(Self {
            method,
            matcher: PathMatcher::pattern(pattern)?,
            handler: Arc::new(handler),
        })
    }

    /// Returns the path variable (if any) when both method and path match.
    pub fn matches<'p>(&self, method: &Method, path: &'p str) -> Option<PathMatch<'p>> {
        if !self.method.matches(method) {
            return None;
        }
        self.matcher.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_anchored() {
        let matcher = PathMatcher::pattern(r"/coins/(\d+)").unwrap();

        assert_eq!(matcher.matches("/coins/7"), Some(PathMatch::Captured("7")));
        assert_eq!(matcher.matches("/api/coins/7"), None);
        assert_eq!(matcher.matches("/coins/7/extra"), None);
    }

    #[test]
    fn already_anchored_pattern_still_compiles() {
        let matcher = PathMatcher::pattern(r"^/coins/(\d+)$").unwrap();
        assert_eq!(matcher.matches("/coins/42"), Some(PathMatch::Captured("42")));
    }

    #[test]
    fn capture_group_count_is_enforced() {
        assert!(matches!(
            PathMatcher::pattern("/coins"),
            Err(RouteError::CaptureGroups { found: 0, .. })
        ));
        assert!(matches!(
            PathMatcher::pattern(r"/(\w+)/(\d+)"),
            Err(RouteError::CaptureGroups { found: 2, .. })
        ));
        assert!(matches!(
            PathMatcher::pattern("/coins/(["),
            Err(RouteError::InvalidPattern { .. })
        ));
    }
}
