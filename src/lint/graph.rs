//! Cargo package graph, as reported by `cargo metadata`

use cargo_metadata::{Metadata, MetadataCommand};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Registry name cargo uses for crates.io
pub const CRATES_IO: &str = "crates-io";

/// Where a package may be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publish {
    /// No `publish` key
    Unrestricted,
    /// `publish = [...]`; empty for `publish = false`
    Registries(Vec<String>),
}

impl Publish {
    pub fn is_never(&self) -> bool {
        matches!(self, Publish::Registries(registries) if registries.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DependencyKind {
    Normal,
    Development,
    Build,
}

/// A dependency as declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name the dependency is referred to by, after any rename
    pub dep_name: String,
    pub name: String,
    pub version_req: String,
    pub kind: DependencyKind,
    /// Declared with `path = ...`
    pub is_path: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub name: String,
    pub kinds: Vec<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Directory relative to the workspace root; `None` outside the workspace
    pub workspace_path: Option<String>,
    pub authors: Vec<String>,
    pub license: Option<String>,
    pub publish: Publish,
    pub targets: Vec<BuildTarget>,
    pub dependencies: Vec<Dependency>,
}

impl PackageMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            workspace_path: None,
            authors: Vec::new(),
            license: None,
            publish: Publish::Unrestricted,
            targets: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn in_workspace(&self) -> bool {
        self.workspace_path.is_some()
    }

    pub fn has_build_script(&self) -> bool {
        self.targets
            .iter()
            .any(|t| t.kinds.iter().any(|k| k == "custom-build"))
    }
}

/// A resolved edge from a package to one of its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLink {
    pub from: String,
    pub to: String,
    pub kinds: Vec<DependencyKind>,
}

/// Packages keyed by id, plus the resolved dependency edges between them
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    packages: BTreeMap<String, PackageMetadata>,
    links: Vec<PackageLink>,
}

impl PackageGraph {
    pub fn new(
        packages: impl IntoIterator<Item = PackageMetadata>,
        links: Vec<PackageLink>,
    ) -> Self {
        Self {
            packages: packages.into_iter().map(|p| (p.id.clone(), p)).collect(),
            links,
        }
    }

    /// Run `cargo metadata` in `root`
    pub fn load(root: &Path) -> Result<Self, cargo_metadata::Error> {
        let metadata = MetadataCommand::new().current_dir(root).exec()?;
        Ok(Self::from_metadata(&metadata))
    }

    pub fn from_metadata(metadata: &Metadata) -> Self {
        let members: HashSet<&str> = metadata
            .workspace_members
            .iter()
            .map(|id| id.repr.as_str())
            .collect();

        let packages = metadata.packages.iter().map(|package| {
            let workspace_path = members.contains(package.id.repr.as_str()).then(|| {
                let dir = package
                    .manifest_path
                    .parent()
                    .unwrap_or(package.manifest_path.as_path());
                match dir.strip_prefix(&metadata.workspace_root) {
                    Ok(relative) if !relative.as_str().is_empty() => relative.to_string(),
                    _ => ".".to_string(),
                }
            });

            PackageMetadata {
                id: package.id.repr.clone(),
                name: package.name.clone(),
                version: package.version.to_string(),
                workspace_path,
                authors: package.authors.clone(),
                license: package.license.clone(),
                publish: match &package.publish {
                    None => Publish::Unrestricted,
                    Some(registries) => Publish::Registries(registries.clone()),
                },
                targets: package
                    .targets
                    .iter()
                    .map(|target| BuildTarget {
                        name: target.name.clone(),
                        kinds: target.kind.clone(),
                        path: target.src_path.to_string(),
                    })
                    .collect(),
                dependencies: package
                    .dependencies
                    .iter()
                    .map(|dep| Dependency {
                        dep_name: dep.rename.clone().unwrap_or_else(|| dep.name.clone()),
                        name: dep.name.clone(),
                        version_req: dep.req.to_string(),
                        kind: dependency_kind(&dep.kind),
                        is_path: dep.path.is_some(),
                    })
                    .collect(),
            }
        });

        let links = metadata
            .resolve
            .iter()
            .flat_map(|resolve| resolve.nodes.iter())
            .flat_map(|node| {
                node.deps.iter().map(move |dep| PackageLink {
                    from: node.id.repr.clone(),
                    to: dep.pkg.repr.clone(),
                    kinds: dep
                        .dep_kinds
                        .iter()
                        .map(|info| dependency_kind(&info.kind))
                        .collect(),
                })
            })
            .collect();

        Self::new(packages, links)
    }

    pub fn package(&self, id: &str) -> Option<&PackageMetadata> {
        self.packages.get(id)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageMetadata> {
        self.packages.values()
    }

    pub fn workspace_packages(&self) -> impl Iterator<Item = &PackageMetadata> {
        self.packages.values().filter(|p| p.in_workspace())
    }

    /// Packages `id` depends on directly
    pub fn direct_links<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = (&'a PackageLink, &'a PackageMetadata)> + 'a {
        self.links
            .iter()
            .filter(move |link| link.from == id)
            .filter_map(move |link| self.packages.get(&link.to).map(|to| (link, to)))
    }

    /// Packages that depend directly on `id`
    pub fn reverse_direct_links<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = (&'a PackageLink, &'a PackageMetadata)> + 'a {
        self.links
            .iter()
            .filter(move |link| link.to == id)
            .filter_map(move |link| self.packages.get(&link.from).map(|from| (link, from)))
    }
}

fn dependency_kind(kind: &cargo_metadata::DependencyKind) -> DependencyKind {
    match kind {
        cargo_metadata::DependencyKind::Development => DependencyKind::Development,
        cargo_metadata::DependencyKind::Build => DependencyKind::Build,
        _ => DependencyKind::Normal,
    }
}
