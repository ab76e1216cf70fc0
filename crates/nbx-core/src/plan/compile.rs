//! Derive a plan from a request and the target's OS facts.

use super::{Action, DependencySource, InstallLayout, Plan, PlanError, ResourceId, ResourceKind};
use crate::facts::{OsFacts, PlatformProfile};
use crate::request::InstallRequest;

/// Optional pip packages selected by the request, in install order.
pub fn extra_pip_packages(request: &InstallRequest) -> Vec<&'static str> {
    let mut extras = Vec::new();
    if request.include_ldap {
        extras.push("django-auth-ldap");
    }
    if request.include_napalm {
        extras.push("napalm");
    }
    if request.include_django_storages {
        extras.push("django-storages");
    }
    extras
}

/// Compile `request` for a host described by `facts`.
///
/// Pure: validation, OS support and reference checks all happen here, so a
/// plan that compiles can be handed to the executor as-is.
pub fn compile(request: &InstallRequest, facts: &OsFacts) -> Result<Plan, PlanError> {
    let checksum_type = request.validate()?;
    let profile = PlatformProfile::for_facts(facts)?;
    let layout = InstallLayout::new(request);
    let source = match (&request.python_dependency_path, request.install_dependencies_from_filesystem) {
        (Some(path), true) => DependencySource::Filesystem(path.clone()),
        _ => DependencySource::Index,
    };

    let mut plan = Plan {
        layout: Some(layout.clone()),
        ..Plan::default()
    };

    let mut packages = profile.build_packages.clone();
    if request.include_ldap {
        packages.extend(profile.ldap_packages.iter().cloned());
    }
    let packages = plan.push(
        ResourceId::new(ResourceKind::Package, "netbox-build-deps"),
        Action::Packages {
            manager: profile.package_manager,
            packages,
        },
        vec![],
    );

    let root_dir = plan.push(
        ResourceId::new(ResourceKind::Directory, request.install_root.display().to_string()),
        Action::Directory {
            path: request.install_root.clone(),
        },
        vec![],
    );
    let tmp_dir = if request.download_tmp_dir == request.install_root {
        root_dir.clone()
    } else {
        plan.push(
            ResourceId::new(
                ResourceKind::Directory,
                request.download_tmp_dir.display().to_string(),
            ),
            Action::Directory {
                path: request.download_tmp_dir.clone(),
            },
            vec![],
        )
    };

    let group = plan.push(
        ResourceId::new(ResourceKind::Group, &request.group),
        Action::Group {
            name: request.group.clone(),
        },
        vec![],
    );
    let user = plan.push(
        ResourceId::new(ResourceKind::User, &request.user),
        Action::User {
            name: request.user.clone(),
            group: request.group.clone(),
            home: layout.current_link.clone(),
        },
        vec![group.clone()],
    );

    let tarball_title = layout.tarball.display().to_string();
    let archive = plan.push(
        ResourceId::new(ResourceKind::Archive, &tarball_title),
        Action::Download {
            url: request.download_url.clone(),
            dest: layout.tarball.clone(),
            checksum_type,
            checksum: request.download_checksum.trim().to_ascii_lowercase(),
            unless_exists: layout.versioned_dir.clone(),
        },
        vec![tmp_dir, group.clone(), user.clone()],
    );

    let versioned_title = layout.versioned_dir.display().to_string();
    let extract = plan.push(
        ResourceId::new(ResourceKind::Extract, &versioned_title),
        Action::Extract {
            archive: layout.tarball.clone(),
            into: request.install_root.clone(),
            creates: layout.versioned_dir.clone(),
        },
        vec![archive, root_dir],
    );
    let owner = plan.push(
        ResourceId::new(ResourceKind::Owner, &versioned_title),
        Action::Owner {
            path: layout.versioned_dir.clone(),
            user: request.user.clone(),
            group: request.group.clone(),
        },
        vec![extract.clone(), user.clone(), group],
    );
    if request.cleanup_tarball {
        plan.push(
            ResourceId::new(ResourceKind::Cleanup, &tarball_title),
            Action::Remove {
                path: layout.tarball.clone(),
            },
            vec![extract.clone()],
        );
    }

    let link = plan.push(
        ResourceId::new(ResourceKind::Symlink, layout.current_link.display().to_string()),
        Action::Symlink {
            path: layout.current_link.clone(),
            target: layout.versioned_dir.clone(),
        },
        vec![extract],
    );

    let venv = plan.push(
        ResourceId::new(ResourceKind::Venv, layout.venv.display().to_string()),
        Action::Venv {
            path: layout.venv.clone(),
            python: profile.python.clone(),
            user: request.user.clone(),
        },
        vec![packages, link, owner, user],
    );
    let requirements = plan.push(
        ResourceId::new(
            ResourceKind::Requirements,
            layout.requirements.display().to_string(),
        ),
        Action::Requirements {
            venv: layout.venv.clone(),
            requirements: layout.requirements.clone(),
            source: source.clone(),
            user: request.user.clone(),
            group: request.group.clone(),
        },
        vec![venv],
    );

    for name in extra_pip_packages(request) {
        plan.push(
            ResourceId::new(ResourceKind::PipPackage, name),
            Action::PipPackage {
                venv: layout.venv.clone(),
                name: name.to_string(),
                source: source.clone(),
                user: request.user.clone(),
            },
            vec![requirements.clone()],
        );
    }

    plan.check_references()?;
    tracing::debug!(
        os = %facts.label(),
        steps = plan.len(),
        "compiled plan for netbox {}",
        request.version
    );
    Ok(plan)
}
