//! Subprocess execution for actions

use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::core::JobContext;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Name under which shell steps are registered
pub const RUN_ACTION: &str = "run";

/// Run `program args..` in `cwd` and capture its combined log
///
/// A non-zero exit is reported through [`ActionOutput::exit_code`], not as
/// an error. The child is killed if the time limit expires.
pub async fn run_process(
    program: &str,
    args: &[String],
    cwd: &Path,
    env: &BTreeMap<String, String>,
    limit: Duration,
) -> Result<ActionOutput, ActionError> {
    debug!("Spawning {} {:?} in {}", program, args, cwd.display());

    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ActionError::Spawn {
            command: program.to_string(),
            source,
        })?;

    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| ActionError::Timeout(limit.as_secs()))??;

    let exit_code = output.status.code().unwrap_or(-1);
    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !log.is_empty() && !log.ends_with('\n') {
            log.push('\n');
        }
        log.push_str(&stderr);
    }

    if exit_code != 0 {
        warn!("{} exited with code {}", program, exit_code);
    }

    Ok(ActionOutput::new(exit_code, log))
}

/// Runs a step's `run:` script with `sh -e -c`
#[derive(Debug, Clone)]
pub struct ShellCommand {
    shell: String,
}

impl ShellCommand {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellCommand {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl Action for ShellCommand {
    fn name(&self) -> &str {
        RUN_ACTION
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let script = invocation
            .script
            .ok_or_else(|| ActionError::MissingInput("run".to_string()))?;
        let cwd = ctx.workspace().ok_or(ActionError::NoWorkspace)?;

        let args = vec!["-e".to_string(), "-c".to_string(), script.to_string()];
        run_process(&self.shell, &args, cwd, &invocation.env, invocation.timeout).await
    }
}
