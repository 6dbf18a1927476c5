//! Path confinement checks
//!
//! Every path the pipeline is about to write or delete is checked here first.
//! Targets often do not exist yet (an archive target before the copy), so
//! resolution is lenient: each existing prefix is canonicalized, following
//! symlinks, and the remaining components are applied lexically.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute form with symlinks in existing prefixes
/// followed and `.`/`..` applied.
///
/// Returns `None` when a component exists but cannot be canonicalized, which
/// includes dangling symlinks and permission errors.
pub fn resolve_lenient(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().ok()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                match fs::symlink_metadata(&resolved) {
                    Ok(_) => resolved = resolved.canonicalize().ok()?,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(_) => return None,
                }
            }
        }
    }

    Some(resolved)
}

/// Check that `target` resolves to a proper descendant of `root`.
///
/// Never fails: any resolution problem is reported as unsafe. `target == root`
/// is unsafe, as is anything reached through `..` or a symlink pointing
/// outside `root`.
pub fn is_safe_subpath(root: &Path, target: &Path) -> bool {
    let (Some(root_resolved), Some(target_resolved)) =
        (resolve_lenient(root), resolve_lenient(target))
    else {
        tracing::debug!(
            root = %root.display(),
            target = %target.display(),
            "Path resolution failed"
        );
        return false;
    };

    let safe = target_resolved != root_resolved && target_resolved.starts_with(&root_resolved);
    if !safe {
        tracing::debug!(
            root = %root_resolved.display(),
            target = %target_resolved.display(),
            "Path is not confined to root"
        );
    }
    safe
}
