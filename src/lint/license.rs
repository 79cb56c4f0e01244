use super::{ContentLinter, FileContext, LintLevel, LintSink, RunStatus, SkipReason};
use std::collections::HashSet;

/// Number of leading non-blank lines searched for the header
const HEADER_WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    /// `// ` line comments
    Slashes,
    /// `# ` line comments, optionally after a shebang
    Hash,
}

fn comment_style(extension: Option<&str>) -> Option<CommentStyle> {
    match extension? {
        "rs" | "proto" | "js" | "jsx" | "cjs" | "mjs" | "ts" | "tsx" | "mts" | "cts" | "move" => {
            Some(CommentStyle::Slashes)
        }
        "sh" | "py" => Some(CommentStyle::Hash),
        _ => None,
    }
}

/// Requires every line of a header to appear in the file's first lines
#[derive(Debug, Clone)]
pub struct LicenseHeader {
    header: String,
}

impl LicenseHeader {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl ContentLinter for LicenseHeader {
    fn name(&self) -> &'static str {
        "license-header"
    }

    fn pre_run(&self, file: &FileContext<'_>) -> RunStatus {
        match comment_style(file.extension()) {
            Some(_) => RunStatus::Executed,
            None => RunStatus::Skipped(SkipReason::UnsupportedExtension(
                file.extension().map(str::to_string),
            )),
        }
    }

    fn run(&self, file: &FileContext<'_>, content: &str, out: &mut LintSink<'_>) -> RunStatus {
        let style = match comment_style(file.extension()) {
            Some(style) => style,
            None => {
                return RunStatus::Skipped(SkipReason::UnsupportedExtension(
                    file.extension().map(str::to_string),
                ))
            }
        };

        let leading: HashSet<&str> = match style {
            CommentStyle::Slashes => content
                .lines()
                .skip_while(|line| line.is_empty())
                .take(HEADER_WINDOW)
                .map(|line| line.trim_start_matches("// "))
                .collect(),
            CommentStyle::Hash => content
                .lines()
                .skip_while(|line| line.starts_with("#!"))
                .skip_while(|line| line.is_empty())
                .take(HEADER_WINDOW)
                .map(|line| line.trim_start_matches("# "))
                .collect(),
        };

        let required: HashSet<&str> = self.header.lines().collect();
        if !required.is_subset(&leading) {
            out.write(LintLevel::Error, "missing license header");
        }

        RunStatus::Executed
    }
}
