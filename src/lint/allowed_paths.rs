use super::{FileContext, LintLevel, LintSink, PathLinter, RunStatus};
use regex::Regex;

/// Characters permitted in tracked paths; anchored
pub const DEFAULT_ALLOWED_PATHS_REGEX: &str = "^([a-zA-Z0-9._\\-/@:]|-)+$";

#[derive(Debug, Clone)]
pub struct AllowedPaths {
    allowed: Regex,
}

impl AllowedPaths {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            allowed: Regex::new(pattern)?,
        })
    }

    pub fn standard() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_ALLOWED_PATHS_REGEX)
    }
}

impl PathLinter for AllowedPaths {
    fn name(&self) -> &'static str {
        "allowed-paths"
    }

    fn run(&self, file: &FileContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        if !self.allowed.is_match(file.path()) {
            out.write(
                LintLevel::Error,
                format!("path doesn't match allowed regex: {}", self.allowed.as_str()),
            );
        }
        RunStatus::Executed
    }
}
