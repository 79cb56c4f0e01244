//! `toolchain` - install a pinned Rust toolchain and select it for the job

use crate::action::command::run_process;
use crate::action::{Action, ActionError, ActionOutput, Invocation};
use crate::core::JobContext;
use async_trait::async_trait;
use tracing::info;

/// Variable rustup reads to pick the toolchain for every later step
pub const TOOLCHAIN_ENV: &str = "RUSTUP_TOOLCHAIN";

/// Inputs: `toolchain` (required), `components` (comma or space separated),
/// `profile` (default `minimal`)
#[derive(Debug, Clone)]
pub struct Toolchain {
    rustup: String,
}

impl Toolchain {
    pub fn new(rustup: impl Into<String>) -> Self {
        Self {
            rustup: rustup.into(),
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("rustup")
    }
}

pub fn install_args(toolchain: &str, profile: &str, components: &[String]) -> Vec<String> {
    let mut args = vec![
        "toolchain".to_string(),
        "install".to_string(),
        toolchain.to_string(),
        "--profile".to_string(),
        profile.to_string(),
        "--no-self-update".to_string(),
    ];
    for component in components {
        args.push("--component".to_string());
        args.push(component.clone());
    }
    args
}

#[async_trait]
impl Action for Toolchain {
    fn name(&self) -> &str {
        "toolchain"
    }

    async fn run(
        &self,
        invocation: &Invocation<'_>,
        ctx: &mut JobContext,
    ) -> Result<ActionOutput, ActionError> {
        let toolchain = invocation.require_input("toolchain")?.to_string();
        let profile = invocation.input("profile").unwrap_or("minimal");
        let components = invocation.list_input("components");

        let cwd = match ctx.workspace() {
            Some(ws) => ws.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let args = install_args(&toolchain, profile, &components);
        let output = run_process(
            &self.rustup,
            &args,
            &cwd,
            &invocation.env,
            invocation.timeout,
        )
        .await?;

        if output.passed() {
            info!("Job {} using toolchain {}", ctx.job_id, toolchain);
            ctx.export_env(TOOLCHAIN_ENV, toolchain.clone());
            ctx.toolchain = Some(toolchain);
        }
        Ok(output)
    }
}
