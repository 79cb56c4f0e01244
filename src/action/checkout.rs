//! `checkout` - isolated snapshot of the repository at the run's revision

use crate::action::git::GitCli;
use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::core::JobContext;
use async_trait::async_trait;
use tracing::info;

/// Clones the source repository into a job-owned temporary directory and
/// detaches at the requested revision
///
/// Uncommitted changes in the source tree are never visible to the job.
/// The optional `revision` input overrides the run's revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkout;

#[async_trait]
impl Action for Checkout {
    fn name(&self) -> &str {
        "checkout"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let source = GitCli::at(&ctx.source.path);
        let revision = invocation
            .input("revision")
            .unwrap_or(ctx.source.revision.as_str())
            .to_string();
        let commit = source.rev_parse(&revision).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("merge-gate-{}-", ctx.job_id))
            .tempdir()?;
        let workspace = dir.path().join("src");
        source.snapshot_into(&workspace, &commit).await?;

        info!("Job {} checked out {} into {}", ctx.job_id, commit, workspace.display());
        let log = format!("Checked out {} ({}) into {}\n", revision, commit, workspace.display());
        ctx.set_checkout(dir, workspace);

        Ok(ActionOutput::success(log))
    }
}
