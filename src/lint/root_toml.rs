use super::{ContentLinter, FileContext, LintLevel, LintSink, RunStatus, SkipReason};
use toml::{Table, Value};

/// The workspace root `Cargo.toml` parses and keeps its member list tidy
#[derive(Debug, Clone, Copy)]
pub struct RootToml;

impl ContentLinter for RootToml {
    fn name(&self) -> &'static str {
        "root-toml"
    }

    fn pre_run(&self, file: &FileContext<'_>) -> RunStatus {
        if file.path() == "Cargo.toml" {
            RunStatus::Executed
        } else {
            RunStatus::Skipped(SkipReason::UnsupportedFile)
        }
    }

    fn run(&self, _file: &FileContext<'_>, content: &str, out: &mut LintSink<'_>) -> RunStatus {
        let manifest = match content.parse::<Table>() {
            Ok(manifest) => manifest,
            Err(e) => {
                out.write(LintLevel::Error, format!("invalid TOML: {}", e.message()));
                return RunStatus::Executed;
            }
        };

        let Some(members) = manifest
            .get("workspace")
            .and_then(Value::as_table)
            .and_then(|workspace| workspace.get("members"))
        else {
            return RunStatus::Executed;
        };

        let Some(members) = members.as_array() else {
            out.write(LintLevel::Error, "workspace.members must be an array");
            return RunStatus::Executed;
        };

        let mut names = Vec::with_capacity(members.len());
        for member in members {
            match member.as_str() {
                Some(name) => names.push(name),
                None => {
                    out.write(
                        LintLevel::Error,
                        format!("workspace member {} is not a string", member),
                    );
                    return RunStatus::Executed;
                }
            }
        }

        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                out.write(
                    LintLevel::Error,
                    format!("duplicate workspace member '{}'", pair[0]),
                );
            } else if pair[0] > pair[1] {
                out.write(
                    LintLevel::Error,
                    format!(
                        "workspace members not sorted: '{}' should come before '{}'",
                        pair[1], pair[0]
                    ),
                );
            }
        }

        RunStatus::Executed
    }
}
