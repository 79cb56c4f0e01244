//! Repository hygiene linters
//!
//! Linters run in tiers. Project linters see the whole cargo package
//! graph once, package linters run per workspace package, path linters see
//! a tracked file's path, and content linters also see its text. Files that
//! are not valid UTF-8 are skipped by every content linter.

pub mod allowed_paths;
pub mod graph;
pub mod license;
pub mod packages;
pub mod root_toml;
pub mod whitespace;

pub use allowed_paths::AllowedPaths;
pub use graph::{PackageGraph, PackageMetadata};
pub use license::LicenseHeader;
pub use packages::{
    BannedDeps, BannedDepsConfig, CrateNamesPaths, DirectDepDups, DirectDepDupsConfig,
    EnforcedAttributes, EnforcedAttributesConfig, IrrelevantBuildDeps, OnlyPublishToCratesIo,
    PublishedPackagesDontDependOnUnpublishedPackages, UnpublishedPackagesOnlyUsePathDependencies,
};
pub use root_toml::RootToml;
pub use whitespace::{build_exceptions, EofNewline, TrailingWhitespace};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Warning,
    Error,
}

impl fmt::Display for LintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintLevel::Warning => f.write_str("warning"),
            LintLevel::Error => f.write_str("error"),
        }
    }
}

/// What a message is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LintKind {
    Project,
    Package {
        name: String,
        workspace_path: String,
    },
    File {
        path: String,
    },
}

impl LintKind {
    pub fn file(path: impl Into<String>) -> Self {
        LintKind::File { path: path.into() }
    }
}

impl fmt::Display for LintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintKind::Project => f.write_str("project"),
            LintKind::Package {
                name,
                workspace_path,
            } => write!(f, "package '{}' ({})", name, workspace_path),
            LintKind::File { path } => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintMessage {
    pub linter: &'static str,
    #[serde(flatten)]
    pub kind: LintKind,
    pub level: LintLevel,
    pub message: String,
}

impl fmt::Display for LintMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}: {}",
            self.level, self.linter, self.kind, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NonUtf8Content,
    Excepted,
    UnsupportedExtension(Option<String>),
    UnsupportedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Executed,
    Skipped(SkipReason),
}

/// The file a linter is looking at
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    path: &'a str,
}

impl<'a> FileContext<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn extension(&self) -> Option<&'a str> {
        Path::new(self.path).extension().and_then(|e| e.to_str())
    }
}

/// The whole project, for linters that run once
#[derive(Debug, Clone, Copy)]
pub struct ProjectContext<'a> {
    root: &'a Path,
    graph: &'a PackageGraph,
}

impl<'a> ProjectContext<'a> {
    pub fn new(root: &'a Path, graph: &'a PackageGraph) -> Self {
        Self { root, graph }
    }

    pub fn root(&self) -> &'a Path {
        self.root
    }

    pub fn package_graph(&self) -> &'a PackageGraph {
        self.graph
    }
}

/// One workspace package
#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    graph: &'a PackageGraph,
    metadata: &'a PackageMetadata,
}

impl<'a> PackageContext<'a> {
    pub fn new(graph: &'a PackageGraph, metadata: &'a PackageMetadata) -> Self {
        Self { graph, metadata }
    }

    pub fn package_graph(&self) -> &'a PackageGraph {
        self.graph
    }

    pub fn metadata(&self) -> &'a PackageMetadata {
        self.metadata
    }

    /// Package directory relative to the workspace root
    pub fn workspace_path(&self) -> &'a str {
        self.metadata.workspace_path.as_deref().unwrap_or(".")
    }
}

/// Collects messages for one linter run
pub struct LintSink<'a> {
    linter: &'static str,
    kind: LintKind,
    messages: &'a mut Vec<LintMessage>,
}

impl<'a> LintSink<'a> {
    pub fn new(linter: &'static str, kind: LintKind, messages: &'a mut Vec<LintMessage>) -> Self {
        Self {
            linter,
            kind,
            messages,
        }
    }

    pub fn write(&mut self, level: LintLevel, message: impl Into<String>) {
        let kind = self.kind.clone();
        self.write_kind(kind, level, message);
    }

    /// Attribute a message to something other than the linted subject
    pub fn write_kind(&mut self, kind: LintKind, level: LintLevel, message: impl Into<String>) {
        self.messages.push(LintMessage {
            linter: self.linter,
            kind,
            level,
            message: message.into(),
        });
    }
}

pub trait ProjectLinter: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &ProjectContext<'_>, out: &mut LintSink<'_>) -> RunStatus;
}

pub trait PackageLinter: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &PackageContext<'_>, out: &mut LintSink<'_>) -> RunStatus;
}

pub trait PathLinter: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, file: &FileContext<'_>, out: &mut LintSink<'_>) -> RunStatus;
}

pub trait ContentLinter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decide from the path alone whether to read the file
    fn pre_run(&self, _file: &FileContext<'_>) -> RunStatus {
        RunStatus::Executed
    }

    fn run(&self, file: &FileContext<'_>, content: &str, out: &mut LintSink<'_>) -> RunStatus;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLint {
    pub linter: &'static str,
    #[serde(flatten)]
    pub kind: LintKind,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LintResults {
    pub packages_checked: usize,
    pub files_checked: usize,
    pub messages: Vec<LintMessage>,
    pub skipped: Vec<SkippedLint>,
}

impl LintResults {
    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.level == LintLevel::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// One line per message
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(&message.to_string());
            out.push('\n');
        }
        out
    }

    fn skip(&mut self, linter: &'static str, kind: LintKind, reason: SkipReason) {
        self.skipped.push(SkippedLint {
            linter,
            kind,
            reason,
        });
    }
}

#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to read tracked file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load the cargo package graph: {0}")]
    Metadata(#[from] cargo_metadata::Error),
}

/// Runs a set of linters over a repository
pub struct LintEngine {
    root: PathBuf,
    project_linters: Vec<Box<dyn ProjectLinter>>,
    package_linters: Vec<Box<dyn PackageLinter>>,
    path_linters: Vec<Box<dyn PathLinter>>,
    content_linters: Vec<Box<dyn ContentLinter>>,
    package_graph: Option<PackageGraph>,
    fail_fast: bool,
}

impl LintEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            project_linters: Vec::new(),
            package_linters: Vec::new(),
            path_linters: Vec::new(),
            content_linters: Vec::new(),
            package_graph: None,
            fail_fast: false,
        }
    }

    pub fn with_project_linter(mut self, linter: impl ProjectLinter + 'static) -> Self {
        self.project_linters.push(Box::new(linter));
        self
    }

    pub fn with_package_linter(mut self, linter: impl PackageLinter + 'static) -> Self {
        self.package_linters.push(Box::new(linter));
        self
    }

    pub fn with_path_linter(mut self, linter: impl PathLinter + 'static) -> Self {
        self.path_linters.push(Box::new(linter));
        self
    }

    pub fn with_content_linter(mut self, linter: impl ContentLinter + 'static) -> Self {
        self.content_linters.push(Box::new(linter));
        self
    }

    /// Use this graph instead of running `cargo metadata` in the root
    pub fn with_package_graph(mut self, graph: PackageGraph) -> Self {
        self.package_graph = Some(graph);
        self
    }

    /// Stop after the first tier, package or file that produced an error
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Run every tier; `files` are repository-relative paths
    pub fn run(&self, files: &[String]) -> Result<LintResults, LintError> {
        let mut results = LintResults::default();

        if !self.project_linters.is_empty() || !self.package_linters.is_empty() {
            let loaded;
            let graph = match &self.package_graph {
                Some(graph) => graph,
                None => {
                    debug!("Loading package graph for {}", self.root.display());
                    loaded = PackageGraph::load(&self.root)?;
                    &loaded
                }
            };
            self.run_graph_linters(graph, &mut results);
            if self.fail_fast && results.has_errors() {
                debug!("Stopping lint run after package graph errors");
                return Ok(results);
            }
        }

        for path in files {
            let file = FileContext::new(path);
            let errors_before = results.error_count();
            results.files_checked += 1;

            for linter in &self.path_linters {
                let mut sink =
                    LintSink::new(linter.name(), LintKind::file(path), &mut results.messages);
                if let RunStatus::Skipped(reason) = linter.run(&file, &mut sink) {
                    results.skip(linter.name(), LintKind::file(path), reason);
                }
            }

            self.run_content_linters(&file, &mut results)?;

            if self.fail_fast && results.error_count() > errors_before {
                debug!("Stopping lint run after errors in {}", path);
                break;
            }
        }

        Ok(results)
    }

    fn run_graph_linters(&self, graph: &PackageGraph, results: &mut LintResults) {
        let project = ProjectContext::new(&self.root, graph);
        for linter in &self.project_linters {
            let mut sink = LintSink::new(linter.name(), LintKind::Project, &mut results.messages);
            if let RunStatus::Skipped(reason) = linter.run(&project, &mut sink) {
                results.skip(linter.name(), LintKind::Project, reason);
            }
        }
        if self.fail_fast && results.has_errors() {
            return;
        }

        for metadata in graph.workspace_packages() {
            let package = PackageContext::new(graph, metadata);
            let kind = LintKind::Package {
                name: metadata.name.clone(),
                workspace_path: package.workspace_path().to_string(),
            };
            let errors_before = results.error_count();
            results.packages_checked += 1;

            for linter in &self.package_linters {
                let mut sink = LintSink::new(linter.name(), kind.clone(), &mut results.messages);
                if let RunStatus::Skipped(reason) = linter.run(&package, &mut sink) {
                    results.skip(linter.name(), kind.clone(), reason);
                }
            }

            if self.fail_fast && results.error_count() > errors_before {
                debug!("Stopping lint run after errors in package {}", metadata.name);
                return;
            }
        }
    }

    fn run_content_linters(
        &self,
        file: &FileContext<'_>,
        results: &mut LintResults,
    ) -> io::Result<()> {
        let mut active = Vec::new();
        for linter in &self.content_linters {
            match linter.pre_run(file) {
                RunStatus::Executed => active.push(linter),
                RunStatus::Skipped(reason) => {
                    results.skip(linter.name(), LintKind::file(file.path()), reason)
                }
            }
        }
        if active.is_empty() {
            return Ok(());
        }

        let full_path = self.root.join(file.path());
        // Tracked but deleted, or a submodule directory
        if !full_path.is_file() {
            return Ok(());
        }
        let bytes = std::fs::read(&full_path)?;

        let content = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(_) => {
                for linter in active {
                    results.skip(
                        linter.name(),
                        LintKind::file(file.path()),
                        SkipReason::NonUtf8Content,
                    );
                }
                return Ok(());
            }
        };

        for linter in active {
            let mut sink = LintSink::new(
                linter.name(),
                LintKind::file(file.path()),
                &mut results.messages,
            );
            if let RunStatus::Skipped(reason) = linter.run(file, content, &mut sink) {
                results.skip(linter.name(), LintKind::file(file.path()), reason);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LintConfigError {
    #[error("invalid whitespace exception: {0}")]
    Glob(#[from] globset::Error),

    #[error("invalid allowed-paths regex: {0}")]
    Regex(#[from] regex::Error),
}

/// Settings for the package graph linters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PackageLintConfig {
    pub direct_dep_dups: DirectDepDupsConfig,
    pub banned_deps: BannedDepsConfig,
    pub enforced_attributes: EnforcedAttributesConfig,
}

/// Settings for the standard hygiene linter set
#[derive(Debug, Clone, Default)]
pub struct HygieneConfig {
    /// Required header text; no license check when unset
    pub license_header: Option<String>,
    /// Globs excluded from the whitespace checks
    pub whitespace_exceptions: Vec<String>,
    pub fail_fast: bool,
    /// Run the project and package tiers when the root has a `Cargo.toml`
    pub package_lints: bool,
    pub packages: PackageLintConfig,
}

impl HygieneConfig {
    pub fn build_engine(&self, root: impl Into<PathBuf>) -> Result<LintEngine, LintConfigError> {
        let root = root.into();
        let exceptions = build_exceptions(&self.whitespace_exceptions)?;
        let has_manifest = root.join("Cargo.toml").is_file();

        let mut engine = LintEngine::new(root)
            .with_path_linter(AllowedPaths::standard()?)
            .with_content_linter(RootToml)
            .with_content_linter(EofNewline::new(exceptions.clone()))
            .with_content_linter(TrailingWhitespace::new(exceptions))
            .fail_fast(self.fail_fast);

        if let Some(header) = &self.license_header {
            engine = engine.with_content_linter(LicenseHeader::new(header.clone()));
        }

        if self.package_lints && has_manifest {
            let config = &self.packages;
            engine = engine
                .with_project_linter(DirectDepDups::new(config.direct_dep_dups.clone()))
                .with_project_linter(BannedDeps::new(config.banned_deps.clone()))
                .with_package_linter(CrateNamesPaths)
                .with_package_linter(IrrelevantBuildDeps)
                .with_package_linter(UnpublishedPackagesOnlyUsePathDependencies)
                .with_package_linter(PublishedPackagesDontDependOnUnpublishedPackages)
                .with_package_linter(OnlyPublishToCratesIo)
                .with_package_linter(EnforcedAttributes::new(
                    config.enforced_attributes.clone(),
                ));
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, path: &str, contents: &[u8]) {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, contents).unwrap();
    }

    #[test]
    fn test_hygiene_reports_per_file_messages() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/good.rs", b"fn main() {}\n");
        write(dir.path(), "src/bad.rs", b"fn main() {}  \n");
        write(dir.path(), "README.md", b"no newline");

        let engine = HygieneConfig::default().build_engine(dir.path()).unwrap();
        let files = vec![
            "src/good.rs".to_string(),
            "src/bad.rs".to_string(),
            "README.md".to_string(),
        ];
        let results = engine.run(&files).unwrap();

        assert_eq!(results.files_checked, 3);
        assert_eq!(results.error_count(), 2);
        let rendered = results.render();
        assert!(rendered
            .contains("[error] [trailing-whitespace] src/bad.rs: trailing whitespace at line 1"));
        assert!(rendered.contains("[error] [eof-newline] README.md: missing newline at EOF"));
    }

    #[test]
    fn test_non_utf8_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, b' ']);

        let engine = HygieneConfig::default().build_engine(dir.path()).unwrap();
        let results = engine.run(&["logo.png".to_string()]).unwrap();

        assert!(!results.has_errors());
        let (root_toml, whitespace): (Vec<_>, Vec<_>) =
            results.skipped.iter().partition(|s| s.linter == "root-toml");
        assert_eq!(root_toml[0].reason, SkipReason::UnsupportedFile);
        assert!(whitespace.iter().all(|s| s.reason == SkipReason::NonUtf8Content));
        assert_eq!(whitespace.len(), 2);
    }

    #[test]
    fn test_fail_fast_stops_after_first_bad_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"a ");
        write(dir.path(), "b.txt", b"b ");

        let files = vec!["a.txt".to_string(), "b.txt".to_string()];
        let config = HygieneConfig {
            fail_fast: true,
            ..HygieneConfig::default()
        };
        let results = config.build_engine(dir.path()).unwrap().run(&files).unwrap();

        assert_eq!(results.files_checked, 1);
        assert!(results.messages.iter().all(|m| m.kind == LintKind::file("a.txt")));
    }

    #[test]
    fn test_missing_tracked_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let engine = HygieneConfig::default().build_engine(dir.path()).unwrap();
        let results = engine.run(&["deleted.rs".to_string()]).unwrap();
        assert!(!results.has_errors());
    }

    #[test]
    fn test_whitespace_exceptions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "fixtures/snapshot.txt", b"keep  \n\n");

        let config = HygieneConfig {
            whitespace_exceptions: vec!["fixtures/**".to_string()],
            ..HygieneConfig::default()
        };
        let results = config
            .build_engine(dir.path())
            .unwrap()
            .run(&["fixtures/snapshot.txt".to_string()])
            .unwrap();

        assert!(!results.has_errors());
        assert!(results
            .skipped
            .iter()
            .filter(|s| s.linter != "root-toml")
            .all(|s| s.reason == SkipReason::Excepted));
    }

    #[test]
    fn test_message_display() {
        let message = LintMessage {
            linter: "allowed-paths",
            kind: LintKind::file("bad path.rs"),
            level: LintLevel::Error,
            message: "path doesn't match allowed regex".into(),
        };
        assert_eq!(
            message.to_string(),
            "[error] [allowed-paths] bad path.rs: path doesn't match allowed regex"
        );

        let message = LintMessage {
            linter: "crate-names-paths",
            kind: LintKind::Package {
                name: "my_crate".into(),
                workspace_path: "crates/my_crate".into(),
            },
            level: LintLevel::Error,
            message: "crate name contains '_' (use '-' instead)".into(),
        };
        assert_eq!(
            message.to_string(),
            "[error] [crate-names-paths] package 'my_crate' (crates/my_crate): \
             crate name contains '_' (use '-' instead)"
        );
    }

    #[test]
    fn test_message_json_carries_kind() {
        let message = LintMessage {
            linter: "banned-deps",
            kind: LintKind::Project,
            level: LintLevel::Error,
            message: "banned project dependency 'openssl': use rustls".into(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["kind"], "project");
        assert_eq!(json["linter"], "banned-deps");
        assert_eq!(json["level"], "error");
    }

    fn workspace_graph() -> PackageGraph {
        use crate::lint::graph::{Dependency, DependencyKind, PackageLink};

        let mut app = PackageMetadata::new("app 0.1.0", "my_app", "0.1.0");
        app.workspace_path = Some("crates/app".into());
        app.dependencies.push(Dependency {
            dep_name: "serde".into(),
            name: "serde".into(),
            version_req: "^1".into(),
            kind: DependencyKind::Build,
            is_path: false,
        });

        let mut tool = PackageMetadata::new("tool 0.1.0", "tool", "0.1.0");
        tool.workspace_path = Some("crates/tool".into());

        let serde = PackageMetadata::new("serde 1.0.0", "serde", "1.0.0");
        let link = PackageLink {
            from: "app 0.1.0".into(),
            to: "serde 1.0.0".into(),
            kinds: vec![DependencyKind::Build],
        };
        PackageGraph::new([app, tool, serde], vec![link])
    }

    #[test]
    fn test_package_tier_runs_per_workspace_package() {
        let dir = TempDir::new().unwrap();
        let engine = LintEngine::new(dir.path())
            .with_package_linter(CrateNamesPaths)
            .with_package_linter(IrrelevantBuildDeps)
            .with_package_graph(workspace_graph());

        let results = engine.run(&[]).unwrap();

        assert_eq!(results.packages_checked, 2);
        let rendered = results.render();
        assert!(rendered.contains(
            "[error] [crate-names-paths] package 'my_app' (crates/app): \
             crate name contains '_' (use '-' instead)"
        ));
        assert!(rendered.contains(
            "[error] [irrelevant-build-deps] package 'my_app' (crates/app): \
             build dependencies but no build script"
        ));
        assert!(!rendered.contains("'tool'"));
    }

    #[test]
    fn test_fail_fast_skips_files_after_package_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"a ");

        let engine = LintEngine::new(dir.path())
            .with_package_linter(CrateNamesPaths)
            .with_content_linter(TrailingWhitespace::new(globset::GlobSet::empty()))
            .with_package_graph(workspace_graph())
            .fail_fast(true);
        let results = engine.run(&["a.txt".to_string()]).unwrap();

        assert_eq!(results.files_checked, 0);
        assert_eq!(results.error_count(), 1);
    }

    #[test]
    fn test_package_lints_need_a_manifest() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", b"hello\n");

        let config = HygieneConfig {
            package_lints: true,
            ..HygieneConfig::default()
        };
        let results = config
            .build_engine(dir.path())
            .unwrap()
            .run(&["README.md".to_string()])
            .unwrap();

        assert_eq!(results.packages_checked, 0);
        assert!(!results.has_errors());
    }

    #[test]
    fn test_package_lints_on_a_real_manifest() {
        if !cargo_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Cargo.toml",
            b"[package]\nname = \"sample-pkg\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n\
              [workspace]\n",
        );
        write(dir.path(), "src/lib.rs", b"pub fn a() {}\n");

        let config = HygieneConfig {
            package_lints: true,
            ..HygieneConfig::default()
        };
        let results = config.build_engine(dir.path()).unwrap().run(&[]).unwrap();

        // No `publish` key means any registry
        assert_eq!(results.packages_checked, 1);
        assert_eq!(results.error_count(), 1, "{}", results.render());
        assert!(results
            .render()
            .contains("[only-publish-to-crates-io] package 'sample-pkg' (.)"));
    }

    fn cargo_available() -> bool {
        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        std::process::Command::new(cargo)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}
