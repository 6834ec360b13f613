//! Recursive copy/remove primitives and the scratch directory guard

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Removes the extraction scratch directory when an install attempt ends
pub struct ScratchGuard {
    path: PathBuf,
}

impl ScratchGuard {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                tracing::warn!("Could not clean {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Copy a directory tree, replacing whatever is at `dest`
pub fn copy_folder(src: &Path, dest: &Path) -> io::Result<()> {
    remove_folder(dest)?;
    fs::create_dir_all(dest)?;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    tracing::debug!("Copied {} -> {}", src.display(), dest.display());
    Ok(())
}

/// Remove a directory tree if present
pub fn remove_folder(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Entry names directly inside a directory
pub fn list_names(dir: &Path) -> io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        names.insert(entry?.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}

/// Whether `path` lies inside (or is) `root`, compared component-wise
///
/// Both sides are canonicalized; a missing path falls back to its
/// canonical parent, then to the lexical absolute path.
pub fn is_within(path: &Path, root: &Path) -> bool {
    resolve(path).starts_with(resolve(root))
}

fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(name);
        }
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_replaces_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src/modA");
        fs::create_dir_all(src.join("content/scripts")).unwrap();
        fs::write(src.join("content/scripts/a.ws"), "new").unwrap();

        let dest = tmp.path().join("mods/modA");
        fs::create_dir_all(dest.join("content")).unwrap();
        fs::write(dest.join("content/stale.ws"), "old").unwrap();

        copy_folder(&src, &dest).unwrap();
        assert_eq!(
            fs::read_to_string(dest.join("content/scripts/a.ws")).unwrap(),
            "new"
        );
        assert!(!dest.join("content/stale.ws").exists());
    }

    #[test]
    fn scratch_guard_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let scratch = tmp.path().join("extracted");
        {
            let _guard = ScratchGuard::new(&scratch);
            fs::create_dir_all(scratch.join("inner")).unwrap();
        }
        assert!(!scratch.exists());
    }

    #[test]
    fn containment_is_component_based() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("Witcher3");
        let sibling = tmp.path().join("Witcher3Mods");
        fs::create_dir_all(game.join("mods")).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        assert!(is_within(&game.join("mods"), &game));
        assert!(is_within(&game.join("missing.zip"), &game));
        assert!(!is_within(&sibling, &game));
    }
}
