//! Branch name patterns
//!
//! Patterns without glob metacharacters are compared exactly. Globs are
//! matched with `globset` using literal separators: `*` and `?` stay
//! within one `/`-separated segment, `**` crosses segments.

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid pattern '{pattern}': {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

/// A single exact-or-glob pattern
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Glob(GlobMatcher),
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError {
                pattern: pattern.to_string(),
                message: "pattern is empty".to_string(),
            });
        }

        if !pattern.contains(['*', '?', '[', '{']) {
            return Ok(Pattern::Exact(pattern.to_string()));
        }

        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| PatternError {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;

        Ok(Pattern::Glob(glob.compile_matcher()))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Pattern::Exact(s) => s == candidate,
            Pattern::Glob(matcher) => matcher.is_match(candidate),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Exact(s) => s,
            Pattern::Glob(matcher) => matcher.glob().glob(),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list of patterns; matches if any member matches
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(candidate))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
