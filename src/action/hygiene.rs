//! `hygiene` - repository hygiene lints over the tracked files

use crate::action::git::GitCli;
use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::core::JobContext;
use crate::lint::packages::{BannedDepConfig, BannedDepType};
use crate::lint::{
    BannedDepsConfig, DirectDepDupsConfig, EnforcedAttributesConfig, HygieneConfig,
    PackageLintConfig,
};
use async_trait::async_trait;
use tracing::info;

/// Inputs: `license-header`, `whitespace-exceptions` (comma separated
/// globs), `fail-fast` (default `false`), `package-lints` (default `true`),
/// `allowed-duplicates` and `banned-deps` (comma separated crate names),
/// `enforced-license`
#[derive(Debug, Clone, Copy, Default)]
pub struct Hygiene;

#[async_trait]
impl Action for Hygiene {
    fn name(&self) -> &str {
        "hygiene"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let workspace = ctx.workspace().ok_or(ActionError::NoWorkspace)?.to_path_buf();

        let banned = invocation
            .list_input("banned-deps")
            .into_iter()
            .map(|name| {
                let config = BannedDepConfig {
                    message: "listed in banned-deps".to_string(),
                    type_: BannedDepType::Always,
                };
                (name, config)
            })
            .collect();
        let config = HygieneConfig {
            license_header: invocation.input("license-header").map(str::to_string),
            whitespace_exceptions: invocation.list_input("whitespace-exceptions"),
            fail_fast: invocation.bool_input("fail-fast", false)?,
            package_lints: invocation.bool_input("package-lints", true)?,
            packages: PackageLintConfig {
                direct_dep_dups: DirectDepDupsConfig {
                    allow: invocation.list_input("allowed-duplicates"),
                },
                banned_deps: BannedDepsConfig(banned),
                enforced_attributes: EnforcedAttributesConfig {
                    authors: None,
                    license: invocation.input("enforced-license").map(str::to_string),
                },
            },
        };
        let engine = config
            .build_engine(&workspace)
            .map_err(|e| ActionError::InvalidInput {
                input: "whitespace-exceptions".to_string(),
                value: e.to_string(),
            })?;

        let files = GitCli::at(&workspace).tracked_files().await?;
        let results = tokio::task::spawn_blocking(move || engine.run(&files))
            .await
            .map_err(|e| ActionError::Io(std::io::Error::other(e.to_string())))??;

        info!(
            "Job {} hygiene: {} packages, {} files, {} errors",
            ctx.job_id,
            results.packages_checked,
            results.files_checked,
            results.error_count()
        );

        let mut log = results.render();
        if results.has_errors() {
            log.push_str("there were lint errors\n");
            Ok(ActionOutput::failure(1, log))
        } else {
            log.push_str(&format!("{} files checked, no lint errors\n", results.files_checked));
            Ok(ActionOutput::success(log))
        }
    }
}
