//! `diff-check` - fail if earlier steps modified the working tree

use crate::action::git::GitCli;
use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::core::JobContext;
use async_trait::async_trait;
use tracing::warn;

/// Inputs: `include-untracked` (default `false`)
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCheck;

#[async_trait]
impl Action for DiffCheck {
    fn name(&self) -> &str {
        "diff-check"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let workspace = ctx.workspace().ok_or(ActionError::NoWorkspace)?;
        let include_untracked = invocation.bool_input("include-untracked", false)?;

        let status = GitCli::at(workspace)
            .status_porcelain(include_untracked)
            .await?;

        if status.trim().is_empty() {
            return Ok(ActionOutput::success("Working tree is clean\n"));
        }

        warn!("Job {} left modifications in the working tree", ctx.job_id);
        Ok(ActionOutput::failure(
            1,
            format!("Working tree has modifications:\n{}", status),
        ))
    }
}
