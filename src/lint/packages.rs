//! Project and package linters over the cargo package graph

use super::graph::{Publish, CRATES_IO};
use super::{
    LintKind, LintLevel, LintSink, PackageContext, PackageLinter, ProjectContext, ProjectLinter,
    RunStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Ban certain crates from being used as dependencies
#[derive(Debug, Clone)]
pub struct BannedDeps {
    config: BannedDepsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedDepsConfig(pub BTreeMap<String, BannedDepConfig>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BannedDepConfig {
    /// Printed when the dependency is found
    pub message: String,
    #[serde(rename = "type")]
    pub type_: BannedDepType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BannedDepType {
    /// Banned anywhere in the graph
    Always,
    /// Banned only as a direct dependency of a workspace package
    Direct,
}

impl BannedDeps {
    pub fn new(config: BannedDepsConfig) -> Self {
        Self { config }
    }
}

impl ProjectLinter for BannedDeps {
    fn name(&self) -> &'static str {
        "banned-deps"
    }

    fn run(&self, ctx: &ProjectContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let graph = ctx.package_graph();

        for package in graph.packages() {
            let Some(config) = self.config.0.get(&package.name) else {
                continue;
            };

            match config.type_ {
                BannedDepType::Always => out.write(
                    LintLevel::Error,
                    format!(
                        "banned project dependency '{}': {}",
                        package.name, config.message
                    ),
                ),
                BannedDepType::Direct => {
                    for (_, from) in graph.reverse_direct_links(&package.id) {
                        if let Some(workspace_path) = &from.workspace_path {
                            out.write_kind(
                                LintKind::Package {
                                    name: from.name.clone(),
                                    workspace_path: workspace_path.clone(),
                                },
                                LintLevel::Error,
                                format!(
                                    "banned direct dependency '{}': {}",
                                    package.name, config.message
                                ),
                            );
                        }
                    }
                }
            }
        }

        RunStatus::Executed
    }
}

/// Enforce attributes on workspace crates
#[derive(Debug, Clone)]
pub struct EnforcedAttributes {
    config: EnforcedAttributesConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnforcedAttributesConfig {
    /// Every workspace crate's `authors` must equal this
    pub authors: Option<Vec<String>>,
    /// Every workspace crate's `license` must equal this
    pub license: Option<String>,
}

impl EnforcedAttributes {
    pub fn new(config: EnforcedAttributesConfig) -> Self {
        Self { config }
    }
}

impl PackageLinter for EnforcedAttributes {
    fn name(&self) -> &'static str {
        "enforced-attributes"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let metadata = ctx.metadata();

        if let Some(authors) = &self.config.authors {
            if &metadata.authors != authors {
                out.write(
                    LintLevel::Error,
                    format!("invalid authors (expected {:?})", authors.join(", ")),
                );
            }
        }
        if let Some(license) = &self.config.license {
            if metadata.license.as_deref() != Some(license.as_str()) {
                out.write(
                    LintLevel::Error,
                    format!("invalid license (expected {})", license),
                );
            }
        }

        RunStatus::Executed
    }
}

/// Crate names, paths and explicit target names use `-`, not `_`
#[derive(Debug, Clone, Copy)]
pub struct CrateNamesPaths;

impl PackageLinter for CrateNamesPaths {
    fn name(&self) -> &'static str {
        "crate-names-paths"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let metadata = ctx.metadata();

        if metadata.name.contains('_') {
            out.write(
                LintLevel::Error,
                "crate name contains '_' (use '-' instead)",
            );
        }
        if ctx.workspace_path().contains('_') {
            out.write(
                LintLevel::Error,
                "workspace path contains '_' (use '-' instead)",
            );
        }

        // Cargo derives the lib name from the package name
        let implied_lib_name = metadata.name.replace('-', "_");
        for target in &metadata.targets {
            if !target.name.contains('_') || target.name == implied_lib_name {
                continue;
            }
            // A name implied by the file name is not the author's choice
            let stem = Path::new(&target.path)
                .file_stem()
                .and_then(|s| s.to_str());
            if stem != Some(target.name.as_str()) {
                out.write(
                    LintLevel::Error,
                    format!(
                        "build target '{}' contains '_' (use '-' instead)",
                        target.name
                    ),
                );
            }
        }

        RunStatus::Executed
    }
}

/// Build dependencies require a build script
#[derive(Debug, Clone, Copy)]
pub struct IrrelevantBuildDeps;

impl PackageLinter for IrrelevantBuildDeps {
    fn name(&self) -> &'static str {
        "irrelevant-build-deps"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let metadata = ctx.metadata();
        let has_build_dep = metadata
            .dependencies
            .iter()
            .any(|dep| dep.kind == super::graph::DependencyKind::Build);

        if has_build_dep && !metadata.has_build_script() {
            out.write(LintLevel::Error, "build dependencies but no build script");
        }

        RunStatus::Executed
    }
}

/// Each third-party crate is used at one version across the workspace
#[derive(Debug, Clone)]
pub struct DirectDepDups {
    config: DirectDepDupsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectDepDupsConfig {
    /// Crates allowed at several versions
    #[serde(default)]
    pub allow: Vec<String>,
}

impl DirectDepDups {
    pub fn new(config: DirectDepDupsConfig) -> Self {
        Self { config }
    }
}

impl ProjectLinter for DirectDepDups {
    fn name(&self) -> &'static str {
        "direct-dep-dups"
    }

    fn run(&self, ctx: &ProjectContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let graph = ctx.package_graph();

        // name -> version -> workspace packages depending on it
        let mut direct_deps: BTreeMap<&str, BTreeMap<&str, Vec<&str>>> = BTreeMap::new();
        for from in graph.workspace_packages() {
            for (_, to) in graph.direct_links(&from.id) {
                if to.in_workspace() {
                    continue;
                }
                direct_deps
                    .entry(to.name.as_str())
                    .or_default()
                    .entry(to.version.as_str())
                    .or_default()
                    .push(from.name.as_str());
            }
        }

        for (name, versions) in direct_deps {
            if versions.len() < 2 || self.config.allow.iter().any(|a| a == name) {
                continue;
            }
            let mut message = format!("duplicate direct dependency '{}':\n", name);
            for (version, packages) in versions {
                message.push_str(&format!("  * {} ({})\n", version, packages.join(", ")));
            }
            out.write(LintLevel::Error, message);
        }

        RunStatus::Executed
    }
}

/// `publish = false` packages refer to first-party crates by path only
#[derive(Debug, Clone, Copy)]
pub struct UnpublishedPackagesOnlyUsePathDependencies;

impl PackageLinter for UnpublishedPackagesOnlyUsePathDependencies {
    fn name(&self) -> &'static str {
        "unpublished-packages-only-use-path-dependencies"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let metadata = ctx.metadata();
        if !metadata.publish.is_never() {
            return RunStatus::Executed;
        }

        for dep in metadata.dependencies.iter().filter(|d| d.is_path) {
            if dep.version_req != "*" {
                out.write(
                    LintLevel::Error,
                    format!(
                        "unpublished package specifies a version of first-party dependency \
                         '{}' ({}); unpublished packages should only use path dependencies \
                         for first-party packages.",
                        dep.dep_name, dep.version_req
                    ),
                );
            }
        }

        RunStatus::Executed
    }
}

/// Publishable packages depend only on publishable packages
#[derive(Debug, Clone, Copy)]
pub struct PublishedPackagesDontDependOnUnpublishedPackages;

impl PackageLinter for PublishedPackagesDontDependOnUnpublishedPackages {
    fn name(&self) -> &'static str {
        "published-packages-dont-depend-on-unpublished-packages"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let metadata = ctx.metadata();
        if metadata.publish.is_never() {
            return RunStatus::Executed;
        }

        for (_, to) in ctx.package_graph().direct_links(&metadata.id) {
            if to.publish.is_never() {
                out.write(
                    LintLevel::Error,
                    format!(
                        "published package can't depend on unpublished package '{}'",
                        to.name
                    ),
                );
            }
        }

        RunStatus::Executed
    }
}

/// Packages are either unpublished or published only to crates.io
#[derive(Debug, Clone, Copy)]
pub struct OnlyPublishToCratesIo;

impl PackageLinter for OnlyPublishToCratesIo {
    fn name(&self) -> &'static str {
        "only-publish-to-crates-io"
    }

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus {
        let is_ok = match &ctx.metadata().publish {
            Publish::Unrestricted => false,
            Publish::Registries(registries) => match registries.as_slice() {
                [] => true,
                [registry] => registry == CRATES_IO,
                _ => false,
            },
        };

        if !is_ok {
            out.write(
                LintLevel::Error,
                "published package should only be publishable to crates.io. \
                 If you intend to publish this package, set 'publish = [\"crates-io\"]' \
                 in its Cargo.toml. Otherwise set 'publish = false'.",
            );
        }

        RunStatus::Executed
    }
}
