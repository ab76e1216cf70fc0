//! Plan: the compiled, ordered set of resource actions derived from a request.
//!
//! A plan is data only. [`compile`] derives it from an [`InstallRequest`] and
//! [`OsFacts`] without touching the host; the executor applies it.
//!
//! [`InstallRequest`]: crate::request::InstallRequest
//! [`OsFacts`]: crate::facts::OsFacts

mod compile;
mod layout;

pub use compile::{compile, extra_pip_packages};
pub use layout::InstallLayout;

use crate::checksum::ChecksumType;
use crate::facts::{PackageManager, UnsupportedOs};
use crate::request::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Package,
    Directory,
    Group,
    User,
    Archive,
    Extract,
    Owner,
    Cleanup,
    Symlink,
    Venv,
    Requirements,
    PipPackage,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Unique identity of a declared resource, rendered as `Kind[title]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub title: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.title)
    }
}

/// Where python dependencies come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencySource {
    /// The configured package index (PyPI or a mirror from pip.conf).
    Index,
    /// A local wheelhouse; pip runs with `--no-index --find-links <path>`.
    Filesystem(PathBuf),
}

impl DependencySource {
    /// pip arguments selecting this source.
    pub fn pip_args(&self) -> Vec<String> {
        match self {
            DependencySource::Index => Vec::new(),
            DependencySource::Filesystem(path) => vec![
                "--no-index".to_string(),
                "--find-links".to_string(),
                path.display().to_string(),
            ],
        }
    }
}

impl fmt::Display for DependencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySource::Index => f.write_str("package index"),
            DependencySource::Filesystem(p) => write!(f, "{}", p.display()),
        }
    }
}

/// One idempotent convergence action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Packages {
        manager: PackageManager,
        packages: Vec<String>,
    },
    Directory {
        path: PathBuf,
    },
    Group {
        name: String,
    },
    User {
        name: String,
        group: String,
        home: PathBuf,
    },
    Download {
        url: String,
        dest: PathBuf,
        checksum_type: ChecksumType,
        checksum: String,
        /// Nothing to fetch once this path exists.
        unless_exists: PathBuf,
    },
    Extract {
        archive: PathBuf,
        into: PathBuf,
        creates: PathBuf,
    },
    Owner {
        path: PathBuf,
        user: String,
        group: String,
    },
    Remove {
        path: PathBuf,
    },
    Symlink {
        path: PathBuf,
        target: PathBuf,
    },
    Venv {
        path: PathBuf,
        python: PathBuf,
        user: String,
    },
    Requirements {
        venv: PathBuf,
        requirements: PathBuf,
        source: DependencySource,
        user: String,
        /// Owning group for the install stamp.
        group: String,
    },
    PipPackage {
        venv: PathBuf,
        name: String,
        source: DependencySource,
        user: String,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Packages { manager, packages } => {
                write!(f, "ensure {:?} packages: {}", manager, packages.join(" "))
            }
            Action::Directory { path } => write!(f, "ensure directory {}", path.display()),
            Action::Group { name } => write!(f, "ensure system group {}", name),
            Action::User { name, group, home } => write!(
                f,
                "ensure system user {} (group {}, home {})",
                name,
                group,
                home.display()
            ),
            Action::Download {
                url,
                dest,
                checksum_type,
                ..
            } => write!(f, "download {} -> {} ({})", url, dest.display(), checksum_type),
            Action::Extract { archive, into, .. } => {
                write!(f, "extract {} into {}", archive.display(), into.display())
            }
            Action::Owner { path, user, group } => {
                write!(f, "chown -R {}:{} {}", user, group, path.display())
            }
            Action::Remove { path } => write!(f, "remove {}", path.display()),
            Action::Symlink { path, target } => {
                write!(f, "link {} -> {}", path.display(), target.display())
            }
            Action::Venv { path, python, .. } => {
                write!(f, "virtualenv {} ({})", path.display(), python.display())
            }
            Action::Requirements {
                requirements,
                source,
                ..
            } => write!(f, "pip install -r {} from {}", requirements.display(), source),
            Action::PipPackage { name, source, .. } => {
                write!(f, "pip install {} from {}", name, source)
            }
        }
    }
}

/// A declared resource: identity, action, and the resources it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: ResourceId,
    pub action: Action,
    pub requires: Vec<ResourceId>,
}

/// Why a request could not be compiled into a plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnsupportedOs(#[from] UnsupportedOs),
    #[error("duplicate declaration of {0}")]
    DuplicateResource(ResourceId),
    #[error("{step} requires {target}, which is not declared before it")]
    MissingReference { step: ResourceId, target: ResourceId },
}

/// Ordered steps; every requirement precedes the step that names it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub layout: Option<InstallLayout>,
    steps: Vec<Step>,
}

impl Plan {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Append a step and return its id for use in later `requires` lists.
    pub fn push(&mut self, id: ResourceId, action: Action, requires: Vec<ResourceId>) -> ResourceId {
        self.steps.push(Step {
            id: id.clone(),
            action,
            requires,
        });
        id
    }

    /// Every id unique, every requirement declared earlier. Because requirements
    /// must point backwards, a plan that passes cannot contain a cycle.
    pub fn check_references(&self) -> Result<(), PlanError> {
        let mut seen: HashSet<&ResourceId> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            for target in &step.requires {
                if !seen.contains(target) {
                    return Err(PlanError::MissingReference {
                        step: step.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            if !seen.insert(&step.id) {
                return Err(PlanError::DuplicateResource(step.id.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, step.id)?;
            writeln!(f, "      {}", step.action)?;
            if !step.requires.is_empty() {
                let reqs: Vec<String> = step.requires.iter().map(ToString::to_string).collect();
                writeln!(f, "      requires {}", reqs.join(", "))?;
            }
        }
        Ok(())
    }
}
