use super::{ContentLinter, FileContext, LintLevel, LintSink, RunStatus, SkipReason};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compile whitespace exception globs
///
/// Globs match the whole repository-relative path and `*` may cross `/`,
/// so `*.snap` exempts snapshots in any directory.
pub fn build_exceptions<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    builder.build()
}

#[derive(Debug, Clone)]
pub struct EofNewline {
    exceptions: GlobSet,
}

impl EofNewline {
    pub fn new(exceptions: GlobSet) -> Self {
        Self { exceptions }
    }
}

impl ContentLinter for EofNewline {
    fn name(&self) -> &'static str {
        "eof-newline"
    }

    fn pre_run(&self, file: &FileContext<'_>) -> RunStatus {
        skip_excepted(&self.exceptions, file)
    }

    fn run(&self, _file: &FileContext<'_>, content: &str, out: &mut LintSink<'_>) -> RunStatus {
        if !content.is_empty() && !content.ends_with('\n') {
            out.write(LintLevel::Error, "missing newline at EOF");
        }
        RunStatus::Executed
    }
}

#[derive(Debug, Clone)]
pub struct TrailingWhitespace {
    exceptions: GlobSet,
}

impl TrailingWhitespace {
    pub fn new(exceptions: GlobSet) -> Self {
        Self { exceptions }
    }
}

impl ContentLinter for TrailingWhitespace {
    fn name(&self) -> &'static str {
        "trailing-whitespace"
    }

    fn pre_run(&self, file: &FileContext<'_>) -> RunStatus {
        skip_excepted(&self.exceptions, file)
    }

    fn run(&self, _file: &FileContext<'_>, content: &str, out: &mut LintSink<'_>) -> RunStatus {
        for (number, line) in content.lines().enumerate() {
            if line.trim_end() != line {
                out.write(
                    LintLevel::Error,
                    format!("trailing whitespace at line {}", number + 1),
                );
            }
        }

        if content.lines().last().is_some_and(str::is_empty) {
            out.write(LintLevel::Error, "trailing whitespace at EOF");
        }

        RunStatus::Executed
    }
}

fn skip_excepted(exceptions: &GlobSet, file: &FileContext<'_>) -> RunStatus {
    if exceptions.is_match(file.path()) {
        RunStatus::Skipped(SkipReason::Excepted)
    } else {
        RunStatus::Executed
    }
}
